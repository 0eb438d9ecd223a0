//! Execute an execution plan against the engine.

use std::time::Duration;

use query_engine_sql::sql;
use tracing::{info_span, Instrument};

use crate::engine::{EngineHandle, Row};
use crate::error::Error;
use crate::metrics;

/// Run the statement answering the plan and return its rows.
///
/// Fails fast when the engine is not ready, and gives up after `timeout`.
pub async fn execute(
    engine: &EngineHandle,
    metrics: &metrics::Metrics,
    timeout: Duration,
    plan: &sql::execution_plan::ExecutionPlan,
) -> Result<Vec<Row>, Error> {
    let engine = engine.engine().await?;
    let query = plan.query_sql();

    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(
            generated_sql = %pretty_print(&query.sql),
            params = query.params.len(),
        );
    }

    let timer = metrics.query_execution_seconds.start_timer();
    let result = tokio::time::timeout(timeout, engine.run(&query))
        .instrument(info_span!("Database request"))
        .await;
    let elapsed = timer.stop_and_record();

    let rows = match result {
        Ok(Ok(rows)) => rows,
        Ok(Err(err)) => {
            metrics.query_error_total.inc();
            return Err(Error::Execution(err));
        }
        Err(_) => {
            metrics.query_error_total.inc();
            return Err(Error::Timeout(timeout));
        }
    };

    tracing::info!(
        rows = rows.len(),
        elapsed_seconds = elapsed,
        "Query executed"
    );

    metrics.query_total.inc();
    if plan.mode != sql::execution_plan::QueryMode::Features {
        metrics.count_query_total.inc();
    }
    Ok(rows)
}

fn pretty_print(sql: &str) -> String {
    sqlformat::format(
        sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}
