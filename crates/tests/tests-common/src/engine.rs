//! An in-memory engine answering statements from a script.

use std::collections::VecDeque;
use std::sync::Arc;

use query_engine_execution::engine::{Engine, EngineError, Row};
use query_engine_sql::sql;
use tokio::sync::Mutex;

/// Answers statements with queued results, in order, and remembers what it was asked.
///
/// Once the queue is empty every statement is answered with no rows.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    answers: Mutex<VecDeque<Result<Vec<Row>, EngineError>>>,
    received: Mutex<Vec<sql::string::SQL>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// An engine answering the first statement with `rows`.
    pub async fn answering(rows: Vec<Row>) -> Arc<Self> {
        let engine = Self::new();
        engine.push_rows(rows).await;
        engine
    }

    pub async fn push_rows(&self, rows: Vec<Row>) {
        self.answers.lock().await.push_back(Ok(rows));
    }

    pub async fn push_error(&self, message: &str) {
        self.answers
            .lock()
            .await
            .push_back(Err(EngineError(message.to_string())));
    }

    /// Every statement received so far, oldest first.
    pub async fn received(&self) -> Vec<sql::string::SQL> {
        self.received.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Engine for ScriptedEngine {
    async fn run(&self, query: &sql::string::SQL) -> Result<Vec<Row>, EngineError> {
        self.received.lock().await.push(query.clone());
        self.answers
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}
