//! Errors for query execution.

use std::time::Duration;

use crate::engine::EngineError;

/// A type for execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the query engine is not ready yet")]
    NotReady,
    #[error("the query engine failed to initialize: {0}")]
    InitializationFailed(String),
    #[error("query execution failed: {0}")]
    Execution(#[from] EngineError),
    #[error("query did not complete within {} seconds", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("unexpected query result: {0}")]
    UnexpectedResult(String),
}

impl Error {
    /// Whether the engine could not take the query at all.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Error::NotReady | Error::InitializationFailed(_))
    }
}
