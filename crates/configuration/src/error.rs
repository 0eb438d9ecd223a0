//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use crate::environment::Variable;

/// The errors that can be thrown when parsing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The errors that can be thrown when turning a parsed configuration into the runtime one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("missing environment variable when processing {variable}: {message}")]
    MissingEnvironmentVariable { variable: Variable, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
