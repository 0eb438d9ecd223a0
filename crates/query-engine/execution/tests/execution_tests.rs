use std::sync::Arc;
use std::time::Duration;

use query_engine_execution::engine::{Engine, EngineError, EngineHandle, Row};
use query_engine_execution::error::Error;
use query_engine_execution::{metrics, query};
use query_engine_sql::sql;

/// Answers every statement with one row, after a delay.
struct Delayed {
    delay: Duration,
}

#[async_trait::async_trait]
impl Engine for Delayed {
    async fn run(&self, query: &sql::string::SQL) -> Result<Vec<Row>, EngineError> {
        tokio::time::sleep(self.delay).await;
        if query.sql.contains("fail") {
            Err(EngineError("Binder Error: no such column".to_string()))
        } else {
            Ok(vec![vec![serde_json::json!(7)]])
        }
    }
}

fn plan(table: &str) -> sql::execution_plan::ExecutionPlan {
    let count = sql::helpers::select_count(
        sql::ast::From::Table(sql::helpers::make_table_alias(table)),
        sql::ast::Where(sql::helpers::true_expr()),
    );
    sql::execution_plan::ExecutionPlan {
        mode: sql::execution_plan::QueryMode::Count,
        statements: sql::execution_plan::StatementSet {
            features: count.clone(),
            count: count.clone(),
            extent: count,
            filter: sql::ast::Where(sql::helpers::true_expr()),
        },
    }
}

fn metrics() -> metrics::Metrics {
    metrics::initialise_metrics(&mut prometheus::Registry::new()).unwrap()
}

#[tokio::test]
async fn queries_before_initialization_fail_fast() {
    let metrics = metrics();
    let result = query::execute(
        &EngineHandle::uninitialized(),
        &metrics,
        Duration::from_secs(30),
        &plan("places"),
    )
    .await;
    assert!(matches!(result, Err(Error::NotReady)));
    assert!(result.unwrap_err().is_not_ready());
}

#[tokio::test]
async fn ready_engines_return_rows() {
    let metrics = metrics();
    let engine = EngineHandle::ready(Arc::new(Delayed {
        delay: Duration::ZERO,
    }));
    let rows = query::execute(&engine, &metrics, Duration::from_secs(30), &plan("places"))
        .await
        .unwrap();
    assert_eq!(rows, vec![vec![serde_json::json!(7)]]);
    assert_eq!(metrics.query_total.get(), 1);
    assert_eq!(metrics.count_query_total.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_queries_time_out() {
    let metrics = metrics();
    let engine = EngineHandle::ready(Arc::new(Delayed {
        delay: Duration::from_secs(600),
    }));
    let result = query::execute(&engine, &metrics, Duration::from_secs(5), &plan("places")).await;
    assert!(matches!(result, Err(Error::Timeout(timeout)) if timeout == Duration::from_secs(5)));
    assert_eq!(metrics.query_error_total.get(), 1);
    assert_eq!(metrics.query_total.get(), 0);
}

#[tokio::test]
async fn engine_errors_are_execution_errors() {
    let metrics = metrics();
    let engine = EngineHandle::ready(Arc::new(Delayed {
        delay: Duration::ZERO,
    }));
    let result = query::execute(&engine, &metrics, Duration::from_secs(30), &plan("fail")).await;
    match result {
        Err(Error::Execution(EngineError(message))) => {
            assert_eq!(message, "Binder Error: no such column");
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert_eq!(metrics.query_error_total.get(), 1);
}

#[tokio::test]
async fn a_failed_query_does_not_affect_the_next() {
    let metrics = metrics();
    let engine = EngineHandle::ready(Arc::new(Delayed {
        delay: Duration::ZERO,
    }));
    let timeout = Duration::from_secs(30);
    assert!(query::execute(&engine, &metrics, timeout, &plan("fail")).await.is_err());
    assert!(query::execute(&engine, &metrics, timeout, &plan("places")).await.is_ok());
}
