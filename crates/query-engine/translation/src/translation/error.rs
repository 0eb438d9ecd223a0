//! Errors for translation.

use query_engine_metadata::metadata::Wkid;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("layer metadata has no usable field list: {0}")]
    InvalidFieldList(String),
    #[error("invalid value for parameter '{parameter}': {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },
    #[error("unsupported spatial relation '{0}'")]
    UnsupportedSpatialRelation(String),
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    #[error("cannot reproject geometries from wkid {from} to wkid {to}")]
    UnsupportedReprojection { from: Wkid, to: Wkid },
    #[error("invalid where clause: {0}")]
    InvalidWhereClause(String),
    #[error("unknown field '{0}' in orderByFields")]
    UnknownOrderByField(String),
}

/// Which side of the contract an error falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The layer metadata cannot serve requests.
    Configuration,
    /// The request itself cannot be translated.
    Translation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFieldList(_) => ErrorKind::Configuration,
            _ => ErrorKind::Translation,
        }
    }

    pub(crate) fn invalid_parameter(parameter: &'static str, message: impl Into<String>) -> Error {
        Error::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }
}
