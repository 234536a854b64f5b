use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use quizdesk_core::ValidationErrors;
use quizdesk_infra::StoreError;

/// Failures a request handler can end with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Per-field report, answered with `400`.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    /// The store refused the write (dangling reference, duplicate key).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Integrity(msg) => ApiError::Conflict(msg),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": "invalid input",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal server error",
                )
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_failures_become_conflicts() {
        let err: ApiError = StoreError::integrity("dangling reference").into();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn backend_failures_are_server_errors() {
        let err: ApiError = StoreError::backend("connection reset").into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut fields = ValidationErrors::new();
        fields.add("name", "This field is required.");
        let err: ApiError = fields.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
