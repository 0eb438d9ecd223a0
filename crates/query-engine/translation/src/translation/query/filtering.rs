//! Compose the WHERE clause shared by every statement of a request.

use std::ops::ControlFlow;

use query_engine_sql::sql;
use sqlparser::ast::{visit_expressions, Expr, Value};
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::translation::error::Error;

/// Combine the client's filter, the object id filter and the spatial predicate.
///
/// Without any of them the result is the always-true clause, which is not rendered.
pub fn compose_where(
    where_: Option<&str>,
    object_ids: &[i64],
    id_field: &str,
    spatial_predicate: Option<sql::ast::Expression>,
) -> Result<sql::ast::Where, Error> {
    let filter = where_.map(parse_where_clause).transpose()?;
    let combined = combine_object_ids_and_where(filter, object_ids, id_field);

    let expression = match (combined, spatial_predicate) {
        (None, None) => sql::helpers::true_expr(),
        (Some(filter), None) => filter,
        (None, Some(spatial)) => spatial,
        (Some(filter), Some(spatial)) => sql::helpers::and_expr(filter, spatial),
    };
    Ok(sql::ast::Where(expression))
}

/// `(<filter>) AND "<id field>" IN (<ids>)`, or whichever half is present.
/// An empty id list adds no constraint.
pub fn combine_object_ids_and_where(
    filter: Option<sql::ast::Expression>,
    object_ids: &[i64],
    id_field: &str,
) -> Option<sql::ast::Expression> {
    let ids = (!object_ids.is_empty()).then(|| sql::ast::Expression::BinaryArrayOperation {
        left: Box::new(sql::helpers::make_column_reference(id_field)),
        operator: sql::ast::BinaryArrayOperator::In,
        right: object_ids
            .iter()
            .map(|id| sql::ast::Expression::Value(sql::ast::Value::Int8(*id)))
            .collect(),
    });

    match (filter, ids) {
        (Some(filter), Some(ids)) => Some(sql::helpers::and_expr(filter, ids)),
        (filter, ids) => filter.or(ids),
    }
}

/// Parse a client supplied filter as a single DuckDB expression.
///
/// Trailing input, such as a second statement, subqueries and bind placeholders
/// are rejected.
/// The expression is printed back from its syntax tree.
pub fn parse_where_clause(text: &str) -> Result<sql::ast::Expression, Error> {
    let dialect = DuckDbDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(text)
        .map_err(|err| Error::InvalidWhereClause(err.to_string()))?;
    let expression = parser
        .parse_expr()
        .map_err(|err| Error::InvalidWhereClause(err.to_string()))?;

    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(Error::InvalidWhereClause(format!(
            "unexpected '{}' after the expression",
            next.token
        )));
    }

    let forbidden = visit_expressions(&expression, |expr| match expr {
        Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => {
            ControlFlow::Break("subqueries are not allowed".to_string())
        }
        Expr::Value(Value::Placeholder(placeholder)) => ControlFlow::Break(format!(
            "bind parameters such as '{placeholder}' are not allowed"
        )),
        _ => ControlFlow::Continue(()),
    });
    if let ControlFlow::Break(reason) = forbidden {
        return Err(Error::InvalidWhereClause(reason));
    }

    Ok(sql::ast::Expression::RawSql(expression.to_string()))
}
