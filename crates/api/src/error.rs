//! API error types with HTTP response mapping.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ErrorKind, ServiceError};
use indexmap::IndexMap;
use orchestration::AggregateFailure;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A single classified failure.
    Service(ServiceError),
    /// One or more sub-requests of an aggregated read failed.
    Aggregate(AggregateFailure),
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    failures: Option<&'a IndexMap<String, ServiceError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (kind, body) = match &self {
            ApiError::Service(err) => (
                err.kind,
                ErrorBody {
                    error: err.message.clone(),
                    kind: err.kind,
                    failures: None,
                },
            ),
            ApiError::Aggregate(failure) => (
                failure.kind(),
                ErrorBody {
                    error: failure.to_string(),
                    kind: failure.kind(),
                    failures: Some(failure.failures()),
                },
            ),
        };

        if kind == ErrorKind::Internal {
            tracing::error!(error = %body.error, "internal server error");
        }

        (status_for(kind), Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<AggregateFailure> for ApiError {
    fn from(failure: AggregateFailure) -> Self {
        ApiError::Aggregate(failure)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Service(ServiceError::invalid_argument(rejection.body_text()))
    }
}

/// Parses a path segment into a typed id, rejecting anything that is not an
/// integer as invalid input.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ServiceError::invalid_argument(format!("invalid {what} id: {raw:?}")).into())
}
