//! An engine backed by an embedded DuckDB database.

use std::sync::{Arc, Mutex, PoisonError};

use query_engine_sql::sql;

use crate::engine::{Engine, EngineError, Row};

/// A DuckDB connection. Statements run one at a time on the blocking thread pool.
///
/// Dropping the future returned by `run` cancels its statement: a statement still
/// waiting for the connection never starts, and a running one is interrupted.
#[derive(Clone)]
pub struct DuckDbEngine {
    connection: Arc<Mutex<duckdb::Connection>>,
    interrupt: Arc<duckdb::InterruptHandle>,
}

impl DuckDbEngine {
    /// Open an in-memory database and install and load the given extensions.
    pub fn open_in_memory(extensions: &[String]) -> Result<DuckDbEngine, EngineError> {
        let connection = duckdb::Connection::open_in_memory().map_err(engine_error)?;
        for extension in extensions {
            if !extension
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(EngineError(format!(
                    "invalid extension name '{extension}'"
                )));
            }
            connection
                .execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
                .map_err(engine_error)?;
            tracing::info!(extension = %extension, "DuckDB extension loaded");
        }
        Ok(DuckDbEngine {
            interrupt: connection.interrupt_handle(),
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Open the database on the blocking thread pool.
    pub async fn initialize(extensions: Vec<String>) -> Result<DuckDbEngine, EngineError> {
        tokio::task::spawn_blocking(move || DuckDbEngine::open_in_memory(&extensions))
            .await
            .map_err(|err| EngineError(err.to_string()))?
    }
}

#[async_trait::async_trait]
impl Engine for DuckDbEngine {
    async fn run(&self, query: &sql::string::SQL) -> Result<Vec<Row>, EngineError> {
        let connection = self.connection.clone();
        let query = query.clone();
        let guard = CancelOnDrop {
            progress: Arc::new(Progress(Mutex::new(Stage::Waiting))),
            interrupt: self.interrupt.clone(),
        };
        let progress = guard.progress.clone();

        let result = tokio::task::spawn_blocking(move || {
            // A panic while running a statement leaves the connection usable.
            let connection = connection.lock().unwrap_or_else(PoisonError::into_inner);
            // Declared after the connection guard so it is dropped first, even on panic.
            let Some(_running) = progress.start() else {
                return Err(EngineError("the statement was cancelled".to_string()));
            };
            run_blocking(&connection, &query)
        })
        .await
        .map_err(|err| EngineError(err.to_string()))?;

        drop(guard);
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Waiting,
    Running,
    Finished,
    Cancelled,
}

/// Where a statement is, shared between its caller and the blocking task.
struct Progress(Mutex<Stage>);

impl Progress {
    fn stage(&self) -> std::sync::MutexGuard<'_, Stage> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `Running` unless the statement was cancelled while waiting.
    /// The stage moves to `Finished` when the returned value is dropped.
    fn start(&self) -> Option<Running<'_>> {
        let mut stage = self.stage();
        if *stage == Stage::Cancelled {
            return None;
        }
        *stage = Stage::Running;
        Some(Running(self))
    }
}

struct Running<'a>(&'a Progress);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        let mut stage = self.0.stage();
        if *stage == Stage::Running {
            *stage = Stage::Finished;
        }
    }
}

/// Cancels the statement of a `run` future that is dropped before it completes.
///
/// The stage lock is held while interrupting, so the interrupt can only reach
/// the statement this guard belongs to.
struct CancelOnDrop {
    progress: Arc<Progress>,
    interrupt: Arc<duckdb::InterruptHandle>,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let mut stage = self.progress.stage();
        match *stage {
            Stage::Waiting => *stage = Stage::Cancelled,
            Stage::Running => {
                self.interrupt.interrupt();
                *stage = Stage::Cancelled;
                tracing::warn!("Interrupted a statement whose caller gave up");
            }
            Stage::Finished | Stage::Cancelled => {}
        }
    }
}

fn run_blocking(
    connection: &duckdb::Connection,
    query: &sql::string::SQL,
) -> Result<Vec<Row>, EngineError> {
    let params: Vec<&str> = query
        .params
        .iter()
        .map(|param| match param {
            sql::string::Param::String(text) => text.as_str(),
        })
        .collect();

    let mut statement = connection.prepare(&query.sql).map_err(engine_error)?;
    let mut rows = statement
        .query(duckdb::params_from_iter(params))
        .map_err(engine_error)?;

    let mut result = vec![];
    while let Some(row) = rows.next().map_err(engine_error)? {
        let column_count = row.as_ref().column_count();
        let values = (0..column_count)
            .map(|index| row.get::<_, duckdb::types::Value>(index).map(to_json))
            .collect::<Result<Row, _>>()
            .map_err(engine_error)?;
        result.push(values);
    }
    Ok(result)
}

fn to_json(value: duckdb::types::Value) -> serde_json::Value {
    use duckdb::types::Value;
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::TinyInt(i) => i.into(),
        Value::SmallInt(i) => i.into(),
        Value::Int(i) => i.into(),
        Value::BigInt(i) => i.into(),
        Value::UTinyInt(i) => i.into(),
        Value::USmallInt(i) => i.into(),
        Value::UInt(i) => i.into(),
        Value::UBigInt(i) => i.into(),
        Value::HugeInt(i) => i64::try_from(i).map_or_else(|_| i.to_string().into(), Into::into),
        Value::Float(f) => serde_json::Number::from_f64(f64::from(f))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Double(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(text) => serde_json::Value::String(text),
        Value::List(values) => serde_json::Value::Array(values.into_iter().map(to_json).collect()),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

fn engine_error(err: duckdb::Error) -> EngineError {
    EngineError(err.to_string())
}
