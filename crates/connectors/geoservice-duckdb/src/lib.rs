pub mod error;
pub mod query;
pub mod routes;
pub mod state;
