//! Translate a geoservice query request to the statements answering it.

pub mod filtering;
pub mod geometry;
pub mod params;
pub mod projection;
pub mod root;
pub mod sorting;
pub mod spatial_filter;

use query_engine_metadata::metadata::LayerMetadata;
use query_engine_sql::sql;

use crate::translation::error::Error;
pub use params::{normalize, QueryRequest, RawParams};

/// Translate a normalized request into an execution plan.
///
/// The features, count and extent statements all share one WHERE clause.
pub fn translate(
    layer: &LayerMetadata,
    request: &QueryRequest,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    let geometry_filter = spatial_filter::translate_geometry_filter(
        request.geometry.as_ref(),
        request.spatial_relation,
        request.in_sr,
        request.reprojection_sr,
    )?;
    let spatial_predicate = geometry_filter
        .as_ref()
        .map(|filter| filter.predicate(&request.geometry_field));

    let filter = filtering::compose_where(
        request.where_.as_deref(),
        &request.object_ids,
        &request.id_field,
        spatial_predicate,
    )?;
    let order_by = sorting::translate_order_by(layer, request.order_by_fields.as_deref())?;

    let statements = root::translate_statements(request, filter, order_by);

    Ok(sql::execution_plan::ExecutionPlan {
        mode: request.mode,
        statements,
    })
}
