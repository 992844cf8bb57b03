//! Messages API request types and prompt assembly.

use serde::Serialize;

use super::GenerationError;

/// Fixed instruction sent as the system prompt of every generation.
pub const SYSTEM_PROMPT: &str = "You are a senior web designer. You will receive the full HTML of a page. \
Return a complete, valid HTML document. \
Preserve existing <script> tags, asset links, and data attributes. \
Only make the requested visual/content changes. Do not fetch remote resources. \
Do not break the page's JS initialization. Keep #root and main scripts intact if present. \
Do not return any text other than the HTML. No description, no explanation, no nothing.";

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

/// Inputs for one generation.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub page: &'a str,
    pub base_document: &'a str,
    /// Oldest first; the last entry is the edit being applied.
    pub history: &'a [String],
}

impl Prompt<'_> {
    /// Validate the prompt inputs.
    pub fn validate(&self) -> Result<(), GenerationError> {
        match self.history.last() {
            None => Err(GenerationError::InvalidRequest("edit history cannot be empty".to_string())),
            Some(latest) if latest.trim().is_empty() => {
                Err(GenerationError::InvalidRequest("latest edit cannot be empty".to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Build the request body.
    ///
    /// At most `history_window` earlier edits are listed; older ones are
    /// summarized by count only.
    pub fn into_request(self, model: &str, max_tokens: u32, history_window: usize) -> MessagesRequest {
        let (latest, earlier) = match self.history.split_last() {
            Some((latest, earlier)) => (latest.as_str(), earlier),
            None => ("", &[][..]),
        };

        let mut messages = vec![
            Message::user(format!("<!--PAGE: {}-->", self.page)),
            Message::user(self.base_document),
            Message::user(format!("User request: {latest}")),
        ];

        if let Some(summary) = summarize_earlier(earlier, history_window) {
            messages.push(Message::user(summary));
        }

        MessagesRequest { model: model.to_string(), max_tokens, system: SYSTEM_PROMPT.to_string(), messages }
    }
}

fn summarize_earlier(earlier: &[String], window: usize) -> Option<String> {
    if earlier.is_empty() {
        return None;
    }

    let omitted = earlier.len().saturating_sub(window);
    let kept = &earlier[omitted..];

    match (omitted, kept.is_empty()) {
        (0, _) => Some(format!("Previous requests: {}", kept.join(" | "))),
        (n, true) => Some(format!("Previous requests: {n} earlier requests omitted")),
        (n, false) => Some(format!("Previous requests: ({n} earlier requests omitted) {}", kept.join(" | "))),
    }
}
