//! The engine capability and the handle tracking whether it can take queries.

use std::future::Future;
use std::sync::Arc;

use query_engine_sql::sql;
use tokio::sync::RwLock;

use crate::error::Error;

/// One result row, column by column.
pub type Row = Vec<serde_json::Value>;

/// A failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Something that runs SQL statements and returns their rows.
#[async_trait::async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, query: &sql::string::SQL) -> Result<Vec<Row>, EngineError>;
}

/// Whether the engine can take queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
    Failed(String),
}

enum EngineState {
    Uninitialized,
    Ready(Arc<dyn Engine>),
    Failed(String),
}

/// Shared access to the engine. Clones refer to the same engine.
#[derive(Clone)]
pub struct EngineHandle {
    state: Arc<RwLock<EngineState>>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// A handle whose engine has yet to be initialized.
    pub fn uninitialized() -> Self {
        Self::with_state(EngineState::Uninitialized)
    }

    /// A handle to an engine that is ready to take queries.
    pub fn ready(engine: Arc<dyn Engine>) -> Self {
        Self::with_state(EngineState::Ready(engine))
    }

    fn with_state(state: EngineState) -> Self {
        EngineHandle {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Initialize the engine in the background. Queries fail with
    /// `Error::NotReady` until the initialization completes.
    pub fn initialize<F>(&self, initialization: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = Result<Arc<dyn Engine>, EngineError>> + Send + 'static,
    {
        let state = self.state.clone();
        tokio::spawn(async move {
            let new_state = match initialization.await {
                Ok(engine) => {
                    tracing::info!("Query engine initialized");
                    EngineState::Ready(engine)
                }
                Err(err) => {
                    tracing::error!(
                        meta.signal_type = "log",
                        event.domain = "geoservice",
                        event.name = "Engine initialization error",
                        name = "Engine initialization error",
                        body = %err,
                        error = true,
                    );
                    EngineState::Failed(err.to_string())
                }
            };
            *state.write().await = new_state;
        })
    }

    pub async fn readiness(&self) -> Readiness {
        match &*self.state.read().await {
            EngineState::Uninitialized => Readiness::Uninitialized,
            EngineState::Ready(_) => Readiness::Ready,
            EngineState::Failed(message) => Readiness::Failed(message.clone()),
        }
    }

    /// The engine, if it is ready.
    pub async fn engine(&self) -> Result<Arc<dyn Engine>, Error> {
        match &*self.state.read().await {
            EngineState::Uninitialized => Err(Error::NotReady),
            EngineState::Ready(engine) => Ok(engine.clone()),
            EngineState::Failed(message) => Err(Error::InitializationFailed(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    #[async_trait::async_trait]
    impl Engine for Empty {
        async fn run(&self, _query: &sql::string::SQL) -> Result<Vec<Row>, EngineError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn uninitialized_engines_are_not_ready() {
        let handle = EngineHandle::uninitialized();
        assert_eq!(handle.readiness().await, Readiness::Uninitialized);
        assert!(matches!(handle.engine().await, Err(Error::NotReady)));
    }

    #[tokio::test]
    async fn initialization_makes_every_clone_ready() {
        let handle = EngineHandle::uninitialized();
        let clone = handle.clone();
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let task = handle.initialize(async move {
            let _ = wait.await;
            Ok(Arc::new(Empty) as Arc<dyn Engine>)
        });
        assert_eq!(clone.readiness().await, Readiness::Uninitialized);

        release.send(()).unwrap();
        task.await.unwrap();
        assert_eq!(clone.readiness().await, Readiness::Ready);
        assert!(clone.engine().await.is_ok());
    }

    #[tokio::test]
    async fn failed_initialization_is_reported() {
        let handle = EngineHandle::uninitialized();
        handle
            .initialize(async { Err(EngineError("no spatial extension".to_string())) })
            .await
            .unwrap();

        assert_eq!(
            handle.readiness().await,
            Readiness::Failed("no spatial extension".to_string())
        );
        match handle.engine().await {
            Err(Error::InitializationFailed(message)) => {
                assert_eq!(message, "no spatial extension");
            }
            other => panic!("expected an initialization failure, got {:?}", other.err()),
        }
    }
}
