//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TAILR_*)
//! 2. TOML config file (if TAILR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which backend holds artifacts and edit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// How much history a clear request discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearScope {
    /// Every page's history for the user.
    User,
    /// Only the requested page's history.
    Page,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TAILR_*)
/// 2. TOML config file (if TAILR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP binding listens on.
    ///
    /// Set via TAILR_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Storage backend.
    #[serde(default = "default_store")]
    pub store: StoreKind,

    /// Path to SQLite cache database.
    ///
    /// Set via TAILR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the Messages API (or a gateway in front of it).
    ///
    /// Set via TAILR_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key for the generative backend.
    ///
    /// Set via TAILR_API_KEY environment variable.
    /// Required only when the server starts.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional token forwarded as `cf-aig-authorization` to an AI gateway.
    #[serde(default)]
    pub gateway_token: Option<String>,

    /// Model identifier sent with every generation request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token ceiling per generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on one generation call in milliseconds.
    ///
    /// Set via TAILR_GENERATION_TIMEOUT_MS environment variable.
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    /// How many earlier edits are listed alongside the latest one.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Scope of the history wipe performed by clear-cache.
    #[serde(default = "default_clear_scope")]
    pub clear_scope: ClearScope,

    /// Delay clients should wait before retrying a busy request.
    #[serde(default = "default_retry_after_ms")]
    pub retry_after_ms: u64,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

fn default_store() -> StoreKind {
    StoreKind::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tailr-cache.sqlite")
}

fn default_api_base_url() -> String {
    "https://api.anthropic.com".into()
}

fn default_model() -> String {
    "claude-haiku-4-5".into()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_generation_timeout_ms() -> u64 {
    120_000
}

fn default_history_window() -> usize {
    20
}

fn default_clear_scope() -> ClearScope {
    ClearScope::User
}

fn default_retry_after_ms() -> u64 {
    1200
}

fn default_user_agent() -> String {
    "tailr/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            store: default_store(),
            db_path: default_db_path(),
            api_base_url: default_api_base_url(),
            api_key: None,
            gateway_token: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            generation_timeout_ms: default_generation_timeout_ms(),
            history_window: default_history_window(),
            clear_scope: default_clear_scope(),
            retry_after_ms: default_retry_after_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Generation timeout as Duration for use with tokio.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TAILR_`
    /// 2. TOML file from `TAILR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TAILR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TAILR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the backend API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the API key is not set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "api_key".into(),
                hint: "Set TAILR_API_KEY environment variable".into(),
            })
    }
}
