//! Messages API response types and output cleanup.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Raw success response from the Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// One content block; only text blocks carry a document.
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block, if it has any non-blank text.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| block.text.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Best human-readable message from an error response body.
///
/// Uses `error.message` from a JSON envelope when present, the raw body otherwise.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```[\w-]*\n?").expect("valid regex"));
static CLOSING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n?```$").expect("valid regex"));

/// Remove a markdown code fence wrapped around the whole output.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = OPENING_FENCE.replace(trimmed, "");
    let without_close = CLOSING_FENCE.replace(&without_open, "");
    without_close.trim().to_string()
}
