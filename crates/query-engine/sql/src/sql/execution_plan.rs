//! Describe the statements produced for a request and which one should run.

use super::ast;
use super::convert::select_to_sql;
use super::string;

/// The shape of the response a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// A feature collection with geometries and properties.
    Features,
    /// Only the number of matching rows.
    Count,
    /// The number of matching rows and their bounding box.
    Extent,
}

/// Every statement derived from one request.
///
/// All statements share one `filter`, so they always agree on which rows match.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSet {
    pub features: ast::Select,
    pub count: ast::Select,
    pub extent: ast::Select,
    pub filter: ast::Where,
}

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub mode: QueryMode,
    pub statements: StatementSet,
}

impl ExecutionPlan {
    /// The statement answering this plan's mode.
    pub fn query(&self) -> &ast::Select {
        match self.mode {
            QueryMode::Features => &self.statements.features,
            QueryMode::Count => &self.statements.count,
            QueryMode::Extent => &self.statements.extent,
        }
    }

    /// Extract the query component as SQL.
    pub fn query_sql(&self) -> string::SQL {
        select_to_sql(self.query())
    }
}
