//! Answer a geoservice query.

use tracing::{info_span, Instrument};

use query_engine_execution::response::{self, QueryResponse};
use query_engine_translation::translation::query::{self as translation, RawParams};

use super::error::Error;
use super::state::State;

/// Normalize the parameters, translate them to SQL, run the statement and shape its rows.
pub async fn query(state: &State, params: RawParams) -> Result<QueryResponse, Error> {
    let layer = &state.configuration.layer;

    // Compile the query.
    let plan = async {
        let request = translation::normalize(layer, &params)?;
        translation::translate(layer, &request)
    }
    .instrument(info_span!("Plan query"))
    .await
    .map_err(Error::from)?;

    // Execute the query.
    let rows = query_engine_execution::query::execute(
        &state.engine,
        &state.metrics,
        state.configuration.query_timeout(),
        &plan,
    )
    .instrument(info_span!("Execute query"))
    .await?;

    Ok(response::shape_response(plan.mode, layer, rows)?)
}
