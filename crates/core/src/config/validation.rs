//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, StoreKind};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `api_base_url` is not an http(s) URL
    /// - `model` or `user_agent` is empty
    /// - `max_tokens` is 0 or exceeds 64000
    /// - `generation_timeout_ms` is less than 1s or exceeds 10 minutes
    /// - `retry_after_ms` is 0 or exceeds 1 minute
    /// - `db_path` is empty while the SQLite store is selected
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "api_base_url".into(),
                reason: "must start with http:// or https://".into(),
            });
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "model".into(), reason: "must not be empty".into() });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid { field: "max_tokens".into(), reason: "must be greater than 0".into() });
        }
        if self.max_tokens > 64_000 {
            return Err(ConfigError::Invalid { field: "max_tokens".into(), reason: "must not exceed 64000".into() });
        }

        if self.generation_timeout_ms < 1_000 {
            return Err(ConfigError::Invalid {
                field: "generation_timeout_ms".into(),
                reason: "must be at least 1000ms".into(),
            });
        }
        if self.generation_timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "generation_timeout_ms".into(),
                reason: "must not exceed 10 minutes (600000ms)".into(),
            });
        }

        if self.retry_after_ms == 0 || self.retry_after_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "retry_after_ms".into(),
                reason: "must be between 1 and 60000".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.store == StoreKind::Sqlite && self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if self.store == StoreKind::Memory {
            tracing::warn!("memory store selected; artifacts and edit history are lost on restart");
        }

        if self.history_window == 0 {
            tracing::warn!("history_window is 0; only the latest edit is sent to the backend");
        }

        Ok(())
    }
}
