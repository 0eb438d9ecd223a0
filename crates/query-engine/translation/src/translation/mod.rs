//! Translate incoming geoservice parameters to an ExecutionPlan (SQL) to be run against DuckDB.

pub mod error;
pub mod query;
