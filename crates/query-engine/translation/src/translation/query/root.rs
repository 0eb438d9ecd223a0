//! Build the statements of a request around its composed WHERE clause.

use query_engine_sql::sql;
use query_engine_sql::sql::helpers::{
    make_column, make_column_alias, read_parquet, row_id_expression, select_count,
    select_extent, select_feature_collection, simple_select, ROW_ID_COLUMN,
};

use super::params::QueryRequest;

/// Build the features, count and extent statements from one filter.
pub fn translate_statements(
    request: &QueryRequest,
    filter: sql::ast::Where,
    order_by: sql::ast::OrderBy,
) -> sql::execution_plan::StatementSet {
    let rows = select_rows(request, filter.clone(), order_by);
    let features = select_feature_collection(rows, &request.geometry_field, &request.out_fields);

    let count = select_count(read_parquet(request.dataset.to_string()), filter.clone());
    let extent = select_extent(
        read_parquet(request.dataset.to_string()),
        filter.clone(),
        &request.geometry_field,
    );

    sql::execution_plan::StatementSet {
        features,
        count,
        extent,
        filter,
    }
}

/// The page of rows to return: the requested fields, the geometry, and a
/// sequential object id continuing from the page offset. Fields the page is
/// ordered by are selected too, so the features can be aggregated in that order.
fn select_rows(
    request: &QueryRequest,
    filter: sql::ast::Where,
    order_by: sql::ast::OrderBy,
) -> sql::ast::Select {
    let mut select_list: Vec<_> = request
        .out_fields
        .iter()
        // a field named like the synthesized id would shadow it
        .filter(|field| *field != ROW_ID_COLUMN)
        .map(|field| make_column(field))
        .collect();
    select_list.push(make_column(&request.geometry_field));
    for element in &order_by.elements {
        if let sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::TableColumn(
            sql::ast::ColumnName(field),
        )) = &element.target
        {
            let selected = field == ROW_ID_COLUMN
                || select_list.iter().any(|(alias, _)| alias.name == *field);
            if !selected {
                select_list.push(make_column(field));
            }
        }
    }
    select_list.push((
        make_column_alias(ROW_ID_COLUMN.to_string()),
        row_id_expression(request.result_offset),
    ));

    let mut select = simple_select(select_list);
    select.from = Some(read_parquet(request.dataset.to_string()));
    select.where_ = filter;
    select.order_by = order_by;
    select.limit = sql::ast::Limit {
        limit: Some(request.result_record_count),
        offset: request.result_offset,
    };
    select
}
