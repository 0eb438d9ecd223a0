//! Errors returned to geoservice clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use query_engine_execution::error as execution;
use query_engine_translation::translation::error as translation;

/// Everything that can go wrong while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(translation::Error),
    #[error(transparent)]
    Translation(translation::Error),
    #[error(transparent)]
    Execution(#[from] execution::Error),
}

impl From<translation::Error> for Error {
    fn from(error: translation::Error) -> Self {
        match error.kind() {
            translation::ErrorKind::Configuration => Error::Configuration(error),
            translation::ErrorKind::Translation => Error::Translation(error),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Translation(_) => StatusCode::BAD_REQUEST,
            Error::Execution(err) if err.is_not_ready() => StatusCode::SERVICE_UNAVAILABLE,
            Error::Execution(execution::Error::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Error::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

#[derive(Serialize)]
struct JsonErrorResponse {
    error: ErrorBody,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = JsonErrorResponse {
            error: ErrorBody {
                code: status.as_u16(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (
                Error::from(translation::Error::InvalidFieldList("empty".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::from(translation::Error::UnknownOrderByField("height".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(execution::Error::NotReady),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::from(execution::Error::InitializationFailed(
                    "no spatial extension".to_string(),
                )),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::from(execution::Error::Timeout(Duration::from_secs(30))),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                Error::from(execution::Error::UnexpectedResult("no rows".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }
}
