//! Type definitions of a SQL AST representation.

/// A WITH clause
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub common_table_expressions: Vec<CommonTableExpression>,
}

/// A single Common Table Expression
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpression {
    pub alias: TableAlias,
    pub select: Box<Select>,
}

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub with: With,
    pub select_list: SelectList,
    pub from: Option<From>,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    SelectList(Vec<(ColumnAlias, Expression)>),
}

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a relation we named ourselves, such as a common table expression.
    Table(TableAlias),
    /// Scan parquet file(s) through the `read_parquet` table function.
    ReadParquet {
        location: String,
        options: ReadParquetOptions,
        alias: TableAlias,
    },
}

/// Named arguments passed to `read_parquet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadParquetOptions {
    /// Add a `filename` column holding the file each row came from.
    pub filename: bool,
    /// Interpret `key=value` directories as partition columns.
    pub hive_partitioning: bool,
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// LIMIT and OFFSET clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A binary operation on a scalar expression and an array of scalar expressions
    BinaryArrayOperation {
        left: Box<Expression>,
        operator: BinaryArrayOperator,
        right: Vec<Expression>,
    },
    /// A scalar or aggregate function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// `array_agg(<expression> ORDER BY ...)`
    ArrayAgg {
        expression: Box<Expression>,
        order_by: OrderBy,
    },
    /// A json_object function call. Keys are emitted in order.
    JsonObject(Vec<(String, Expression)>),
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    Cast {
        expression: Box<Expression>,
        r#type: ScalarType,
    },
    /// A COUNT clause
    Count(CountType),
    /// `ROW_NUMBER() OVER ()`
    RowNumber,
    /// A boolean predicate supplied by the client.
    /// It has been parsed and re-printed before reaching the AST.
    RawSql(String),
}

/// Represents the name of a binary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOperator(pub String);

/// A binary operator when the rhs is an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryArrayOperator {
    In,
}

/// A scalar or aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    StAsGeoJson,
    StGeomFromGeoJson,
    StXMin,
    StYMin,
    StXMax,
    StYMax,
    StIntersects,
    StWithin,
    StContains,
    StCrosses,
    StOverlaps,
    StTouches,
}

/// COUNT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountType {
    Star,
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i64),
    Bool(bool),
    /// A string sent to the engine as a bound parameter.
    String(String),
    /// A string written into the statement as a quoted literal.
    Text(String),
}

/// Scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Varchar,
    Json,
}

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// refers to a column of the scanned dataset
    TableColumn(ColumnName),
    /// refers to an alias we created
    AliasedColumn(ColumnAlias),
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
