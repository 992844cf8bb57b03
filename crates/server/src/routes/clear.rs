//! `POST /api/clear-cache`: drop the caller's latest artifact and edit history.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tailr_core::ClearOutcome;

use crate::error::ApiError;
use crate::handler::AppState;
use crate::identity::UserId;

const DEFAULT_PAGE: &str = "catalog";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearParams {
    pub page: Option<String>,
}

impl ClearParams {
    /// Parse an optional JSON body. An empty body clears the default page.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidInput(format!("invalid JSON body: {e}")))
    }

    pub fn page(&self) -> &str {
        self.page.as_deref().unwrap_or(DEFAULT_PAGE)
    }
}

pub async fn clear_impl(State(state): State<AppState>, user: UserId, body: Bytes) -> Result<Response, ApiError> {
    let params = ClearParams::from_body(&body)?;
    let response = match state.gateway.clear_cache(&user.uid, params.page()).await? {
        ClearOutcome::Ok => Json(json!({ "ok": true, "message": "Cache and history cleared" })).into_response(),
    };
    Ok(user.attach(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_to_catalog() {
        assert_eq!(ClearParams::from_body(b"").unwrap().page(), "catalog");
        assert_eq!(ClearParams::from_body(b"{}").unwrap().page(), "catalog");
        assert_eq!(ClearParams::from_body(br#"{"page":"checkout"}"#).unwrap().page(), "checkout");
    }

    #[test]
    fn test_malformed_body_is_invalid_input() {
        assert!(matches!(ClearParams::from_body(b"{nope"), Err(ApiError::InvalidInput(_))));
    }
}
