//! Generation client for a Messages-style LLM API.
//!
//! ### Protocol
//!
//! - **Endpoint**: `{base_url}/v1/messages` (direct API or an AI gateway in front of it)
//! - **Authentication**: `x-api-key` and `Authorization: Bearer` headers, plus
//!   `cf-aig-authorization` when a gateway token is configured.
//! - **Retries**: none. One call per generation; the caller decides what to do
//!   with a failure.
//! - **Output**: the first text block, with any surrounding code fence removed.
//!   A missing or blank text block falls back to the unmodified base document.

pub mod error;
pub mod request;
pub mod response;

pub use error::GenerationError;
pub use request::{Message, MessagesRequest, Prompt, SYSTEM_PROMPT};
pub use response::{MessagesResponse, error_message, strip_code_fences};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use tailr_core::{AppConfig, Generator};

/// Default base URL for the Messages API.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "tailr/0.1";

/// Generation client configuration.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    /// Base URL (default: https://api.anthropic.com).
    pub base_url: String,
    /// Optional AI gateway token sent as `cf-aig-authorization`.
    pub gateway_token: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Earlier edits listed alongside the latest one.
    pub history_window: usize,
    /// Request timeout (default: 120s).
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            gateway_token: None,
            model: "claude-haiku-4-5".to_string(),
            max_tokens: 4000,
            history_window: 20,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GenerationConfig {
    /// Derive client settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .require_api_key()
            .map_err(|_| GenerationError::MissingApiKey)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            gateway_token: config.gateway_token.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            history_window: config.history_window,
            timeout: config.generation_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Messages API client.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: Arc<GenerationConfig>,
}

impl GenerationClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GenerationError::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config) })
    }

    /// Generate a personalized document.
    ///
    /// Makes exactly one backend call. Blank output yields `base_document`
    /// unchanged.
    pub async fn generate(&self, base_document: &str, page: &str, history: &[String]) -> Result<String, GenerationError> {
        let prompt = Prompt { page, base_document, history };
        prompt.validate()?;
        let body = prompt.into_request(&self.config.model, self.config.max_tokens, self.config.history_window);

        let start = Instant::now();
        let url = format!("{}/v1/messages", self.config.base_url);
        tracing::debug!(page, history_len = history.len(), "calling generation backend");

        let mut request = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.config.gateway_token {
            request = request.header("cf-aig-authorization", token);
        }

        let http_response = request.json(&body).send().await?;

        let status = http_response.status();
        tracing::info!(page, status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "generation backend responded");

        if !status.is_success() {
            let text = http_response.text().await.unwrap_or_default();
            tracing::error!(page, status = status.as_u16(), body = %text, "generation backend error");
            return Err(GenerationError::Backend { status: status.as_u16(), message: error_message(&text) });
        }

        let bytes = http_response.bytes().await?;
        let parsed: MessagesResponse =
            serde_json::from_slice(&bytes).map_err(|e| GenerationError::Parse(e.to_string()))?;

        match parsed.first_text().map(strip_code_fences).filter(|text| !text.trim().is_empty()) {
            Some(document) => Ok(document),
            None => {
                tracing::warn!(page, "no usable document in generation output; falling back to base document");
                Ok(base_document.to_string())
            }
        }
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate(&self, base_document: &str, page: &str, history: &[String]) -> Result<String, tailr_core::Error> {
        GenerationClient::generate(self, base_document, page, history)
            .await
            .map_err(tailr_core::Error::from)
    }
}
