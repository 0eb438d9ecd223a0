//! Metrics setup and update for query execution.

use prometheus::core::{AtomicI64, AtomicU64, GenericCounter, GenericGauge};
use prometheus::Histogram;

use crate::engine::Readiness;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub count_query_total: GenericCounter<AtomicU64>,
    pub query_error_total: GenericCounter<AtomicU64>,
    pub query_execution_seconds: Histogram,
    pub engine_ready: GenericGauge<AtomicI64>,
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, prometheus::Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new int gauge metric and register it with the provided Prometheus Registry
fn add_int_gauge_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicI64>, prometheus::Error> {
    let int_gauge =
        prometheus::IntGauge::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_gauge.clone()))?;
    Ok(int_gauge)
}

/// Create a new histogram metric and register it with the provided Prometheus Registry
fn add_histogram_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<Histogram, prometheus::Error> {
    let histogram = Histogram::with_opts(prometheus::HistogramOpts::new(
        metric_name,
        metric_description,
    ))?;
    metrics_registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

/// Setup counters, gauges and histograms used to produce Prometheus metrics
pub fn initialise_metrics(
    metrics_registry: &mut prometheus::Registry,
) -> Result<Metrics, prometheus::Error> {
    let query_total = add_int_counter_metric(
        metrics_registry,
        "geoservice_duckdb_query_total",
        "Total successful queries.",
    )?;

    let count_query_total = add_int_counter_metric(
        metrics_registry,
        "geoservice_duckdb_count_query_total",
        "Total successful count and extent queries.",
    )?;

    let query_error_total = add_int_counter_metric(
        metrics_registry,
        "geoservice_duckdb_query_error_total",
        "Total queries that failed to execute.",
    )?;

    let query_execution_seconds = add_histogram_metric(
        metrics_registry,
        "geoservice_duckdb_query_execution_seconds",
        "Time spent running statements against the engine, in seconds.",
    )?;

    let engine_ready = add_int_gauge_metric(
        metrics_registry,
        "geoservice_duckdb_engine_ready",
        "1 when the query engine can take queries, 0 otherwise.",
    )?;

    Ok(Metrics {
        query_total,
        count_query_total,
        query_error_total,
        query_execution_seconds,
        engine_ready,
    })
}

/// Update the gauges that mirror the engine state.
pub fn update_engine_metrics(readiness: &Readiness, metrics: &Metrics) {
    metrics
        .engine_ready
        .set(i64::from(*readiness == Readiness::Ready));
}
