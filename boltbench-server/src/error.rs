//! Error types for the HTTP API layer.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use boltbench_perf::BenchError;
use boltbench_service::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// Error type for API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A benchmark could not be completed.
    #[error(transparent)]
    Bench(#[from] BenchError),

    /// A validation, auto-heal or single operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request body could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Bench(BenchError::InvalidRequest(_)) | ApiError::BadRequest(_) => {
                tracing::debug!(error = &self as &dyn std::error::Error, "bad request");
                StatusCode::BAD_REQUEST
            }
            ApiError::Bench(_) | ApiError::Service(_) => {
                tracing::error!(
                    error = &self as &dyn std::error::Error,
                    "backend error handling request"
                );
                StatusCode::BAD_GATEWAY
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use boltbench_perf::request::RequestError;

    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let error = ApiError::from(BenchError::from(RequestError::MissingBucket));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_errors_are_gateway_errors() {
        let error = ApiError::from(BenchError::Backend {
            backend: "bolt",
            operation: "get",
            target: "key".into(),
            cause: boltbench_service::BackendError::Injected("boom".into()),
        });
        assert_eq!(
            error.to_string(),
            "get on `key` failed against bolt: injected failure: boom"
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
