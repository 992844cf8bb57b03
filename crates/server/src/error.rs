//! Structured errors for the tailr HTTP binding.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors that end a request before the gateway produces an outcome.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input parameters (e.g., empty page).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Storage or other internal failure.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<tailr_core::Error> for ApiError {
    fn from(err: tailr_core::Error) -> Self {
        match err {
            tailr_core::Error::InvalidInput(msg) => ApiError::InvalidInput(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}
