pub mod deployment;
pub mod engine;
pub mod fixtures;
