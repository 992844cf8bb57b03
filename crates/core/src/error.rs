//! Unified error types for tailr.
//!
//! Every variant renders with a stable upper-case code prefix so that
//! callers and logs can match on it without parsing prose.

use tokio_rusqlite::rusqlite;

/// Unified error type for the personalization engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty page identifier).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Another apply or rebuild is already running for this user.
    #[error("BUSY: generation already in progress for user {0}")]
    Busy(String),

    /// The generative backend rejected or failed the request.
    #[error("GENERATION_FAILED: {}", describe_generation(.status, .message))]
    Generation { status: Option<u16>, message: String },

    /// The generative backend did not answer within the configured bound.
    #[error("GENERATION_TIMEOUT: no response after {0}ms")]
    GenerationTimeout(u64),

    /// Some, but not all, of the cache keys for one artifact were written.
    #[error("PARTIAL_CACHE_WRITE: wrote [{}] before failing on {failed_key}: {source}", .written.join(", "))]
    PartialCacheWrite {
        written: Vec<String>,
        failed_key: String,
        #[source]
        source: Box<Error>,
    },

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

fn describe_generation(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("backend returned {status}: {message}"),
        None => message.to_string(),
    }
}

impl Error {
    /// Whether the caller should back off and retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Busy(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Busy("u-1".to_string());
        assert!(err.to_string().starts_with("BUSY"));
        assert!(err.to_string().contains("u-1"));
    }

    #[test]
    fn test_generation_error_carries_status() {
        let err = Error::Generation { status: Some(529), message: "overloaded".to_string() };
        let text = err.to_string();
        assert!(text.contains("GENERATION_FAILED"));
        assert!(text.contains("529"));
        assert!(text.contains("overloaded"));
    }

    #[test]
    fn test_partial_write_lists_keys() {
        let err = Error::PartialCacheWrite {
            written: vec!["a".to_string(), "b".to_string()],
            failed_key: "c".to_string(),
            source: Box::new(Error::MigrationFailed("boom".to_string())),
        };
        assert!(err.to_string().contains("[a, b]"));
        assert!(err.to_string().contains("on c"));
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(Error::Busy("u".into()).is_retryable());
        assert!(!Error::GenerationTimeout(10).is_retryable());
        assert!(!Error::InvalidInput("x".into()).is_retryable());
    }
}
