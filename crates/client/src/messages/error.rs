//! Generation client error types.

use std::sync::Arc;

/// Errors from the Messages API client.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API key configured.
    #[error("missing API key: TAILR_API_KEY not set")]
    MissingApiKey,

    /// Request could not be built from the given inputs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Backend answered with a non-success status.
    #[error("backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Success response that could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GenerationError::Timeout } else { GenerationError::Network(Arc::new(err)) }
    }
}

impl From<GenerationError> for tailr_core::Error {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Backend { status, message } => {
                tailr_core::Error::Generation { status: Some(status), message }
            }
            GenerationError::InvalidRequest(msg) => tailr_core::Error::InvalidInput(msg),
            other => tailr_core::Error::Generation { status: None, message: other.to_string() },
        }
    }
}
