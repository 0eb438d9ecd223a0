//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

/// Alias of the scanned dataset inside every statement.
pub const DATASET_TABLE_ALIAS: &str = "data";
/// Alias of the common table expression holding the selected rows.
pub const ROWS_TABLE_ALIAS: &str = "geodata";
/// Column holding the synthesized sequential identifier.
pub const ROW_ID_COLUMN: &str = "OBJECTID";
/// Column holding the aggregated feature collection.
pub const FEATURE_COLLECTION_COLUMN: &str = "geojson_featurecollection";
/// Column holding the row count in count and extent statements.
pub const COUNT_COLUMN: &str = "count";

// Empty clauses //

/// An empty `WITH` clause.
pub fn empty_with() -> With {
    With {
        common_table_expressions: vec![],
    }
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// Conjoin two expressions with `AND`.
pub fn and_expr(left: Expression, right: Expression) -> Expression {
    Expression::And {
        left: Box::new(left),
        right: Box::new(right),
    }
}

// Aliasing //

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: &str) -> TableAlias {
    TableAlias {
        name: name.to_string(),
    }
}

/// Refer to a column of the scanned dataset.
pub fn make_column_reference(name: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::TableColumn(ColumnName(name.to_string())))
}

/// Generate a select list entry for a dataset column, aliased to its own name.
pub fn make_column(name: &str) -> (ColumnAlias, Expression) {
    (
        make_column_alias(name.to_string()),
        make_column_reference(name),
    )
}

// FROMs //

/// Scan the dataset at `location`, exposing file names and hive partitions.
pub fn read_parquet(location: String) -> From {
    From::ReadParquet {
        location,
        options: ReadParquetOptions {
            filename: true,
            hive_partitioning: true,
        },
        alias: make_table_alias(DATASET_TABLE_ALIAS),
    }
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        with: empty_with(),
        select_list: SelectList::SelectList(select_list),
        from: None,
        where_: Where(true_expr()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build the sequential row identifier, shifted by the page offset when there is one.
pub fn row_id_expression(offset: Option<u32>) -> Expression {
    match offset {
        None => Expression::RowNumber,
        Some(offset) => Expression::BinaryOperation {
            left: Box::new(Expression::RowNumber),
            operator: BinaryOperator("+".to_string()),
            right: Box::new(Expression::Value(Value::Int8(i64::from(offset)))),
        },
    }
}

/// Wrap a select of rows in a statement aggregating them into a single
/// GeoJSON feature collection.
///
/// ```sql
/// WITH "geodata" AS (<rows>)
/// SELECT json_object('type', 'FeatureCollection', 'features', array_agg(
///   json_object('type', 'Feature', 'id', "OBJECTID",
///               'geometry', CAST(ST_AsGeoJSON("geometry") AS JSON),
///               'properties', json_object('name', "name", ...))
///   ORDER BY <the order of the rows>))
/// AS "geojson_featurecollection" FROM "geodata"
/// ```
///
/// The features are aggregated in the order of `rows`, or by object id when
/// `rows` is unordered. Every column the order refers to must be selected by `rows`.
pub fn select_feature_collection(
    rows: Select,
    geometry_column: &str,
    property_columns: &[String],
) -> Select {
    let rows_alias = make_table_alias(ROWS_TABLE_ALIAS);

    let properties = Expression::JsonObject(
        property_columns
            .iter()
            .map(|name| (name.clone(), make_column_reference(name)))
            .collect(),
    );

    let geometry = Expression::Cast {
        expression: Box::new(Expression::FunctionCall {
            function: Function::StAsGeoJson,
            args: vec![make_column_reference(geometry_column)],
        }),
        r#type: ScalarType::Json,
    };

    let feature = Expression::JsonObject(vec![
        (
            "type".to_string(),
            Expression::Value(Value::Text("Feature".to_string())),
        ),
        (
            "id".to_string(),
            Expression::ColumnReference(ColumnReference::AliasedColumn(make_column_alias(
                ROW_ID_COLUMN.to_string(),
            ))),
        ),
        ("geometry".to_string(), geometry),
        ("properties".to_string(), properties),
    ]);

    let order_by = if rows.order_by.elements.is_empty() {
        OrderBy {
            elements: vec![OrderByElement {
                target: Expression::ColumnReference(ColumnReference::AliasedColumn(
                    make_column_alias(ROW_ID_COLUMN.to_string()),
                )),
                direction: OrderByDirection::Asc,
            }],
        }
    } else {
        rows.order_by.clone()
    };

    let collection = Expression::JsonObject(vec![
        (
            "type".to_string(),
            Expression::Value(Value::Text("FeatureCollection".to_string())),
        ),
        (
            "features".to_string(),
            Expression::ArrayAgg {
                expression: Box::new(feature),
                order_by,
            },
        ),
    ]);

    let mut final_select = simple_select(vec![(
        make_column_alias(FEATURE_COLLECTION_COLUMN.to_string()),
        collection,
    )]);
    final_select.with = With {
        common_table_expressions: vec![CommonTableExpression {
            alias: rows_alias.clone(),
            select: Box::new(rows),
        }],
    };
    final_select.from = Some(From::Table(rows_alias));
    final_select
}

/// `SELECT COUNT(*) AS "count"` over the given source and filter.
pub fn select_count(from: From, where_: Where) -> Select {
    let mut select = simple_select(vec![(
        make_column_alias(COUNT_COLUMN.to_string()),
        Expression::Count(CountType::Star),
    )]);
    select.from = Some(from);
    select.where_ = where_;
    select
}

/// The row count and the bounding box of the geometry column over the given source and filter.
pub fn select_extent(from: From, where_: Where, geometry_column: &str) -> Select {
    let bound = |alias: &str, aggregate: Function, accessor: Function| {
        (
            make_column_alias(alias.to_string()),
            Expression::FunctionCall {
                function: aggregate,
                args: vec![Expression::FunctionCall {
                    function: accessor,
                    args: vec![make_column_reference(geometry_column)],
                }],
            },
        )
    };

    let mut select = simple_select(vec![
        (
            make_column_alias(COUNT_COLUMN.to_string()),
            Expression::Count(CountType::Star),
        ),
        bound("xmin", Function::Min, Function::StXMin),
        bound("ymin", Function::Min, Function::StYMin),
        bound("xmax", Function::Max, Function::StXMax),
        bound("ymax", Function::Max, Function::StYMax),
    ]);
    select.from = Some(from);
    select.where_ = where_;
    select
}
