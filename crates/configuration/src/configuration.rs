//! Configuration for the connector.

use std::time::Duration;

use query_engine_metadata::metadata;

use crate::version1::EngineSettings;

/// The 'Configuration' type collects all the information necessary to serve queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', once every secret has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub layer: metadata::LayerMetadata,
    pub engine: EngineSettings,
}

impl Configuration {
    /// How long a single statement may run.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.query_timeout_seconds)
    }
}
