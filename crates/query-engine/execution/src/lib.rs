//! Query execution against the analytical engine, and shaping of its results.

#[cfg(feature = "duckdb")]
pub mod duckdb;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod query;
pub mod response;
