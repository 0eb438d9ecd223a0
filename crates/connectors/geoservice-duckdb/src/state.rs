//! Transient state used by the connector.
//!
//! This is initialized on startup.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info_span, Instrument};

use geoservice_duckdb_configuration::Configuration;
use query_engine_execution::engine::EngineHandle;
use query_engine_execution::metrics;

/// State for our connector.
#[derive(Clone, Debug)]
pub struct State {
    pub configuration: Arc<Configuration>,
    pub engine: EngineHandle,
    pub metrics: metrics::Metrics,
    pub metrics_registry: prometheus::Registry,
}

/// Register the metrics and wrap them, with the engine handle, inside a connector State.
///
/// The engine may still be initializing; queries fail fast until it is ready.
pub async fn create_state(
    configuration: Configuration,
    engine: EngineHandle,
) -> Result<State, InitializationError> {
    let mut metrics_registry = prometheus::Registry::new();

    let metrics = async {
        metrics::initialise_metrics(&mut metrics_registry)
            .map_err(InitializationError::MetricsError)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    Ok(State {
        configuration: Arc::new(configuration),
        engine,
        metrics,
        metrics_registry,
    })
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
}
