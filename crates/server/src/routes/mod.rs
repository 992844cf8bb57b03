//! Route implementations.
//!
//! One module per endpoint. Each maps a gateway outcome onto a status code and
//! a small JSON (or HTML) body.

pub mod clear;
pub mod prompt;
pub mod rebuild;
pub mod view;

use std::time::Duration;

use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// Body returned when a document was generated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBody {
    pub ok: bool,
    pub html: String,
    pub page_url: String,
}

pub(crate) fn generated(document: String, page_url: String) -> Response {
    Json(GeneratedBody { ok: true, html: document, page_url }).into_response()
}

/// 429 with both a `Retry-After` header (whole seconds) and the exact delay.
pub(crate) fn busy(retry_after: Duration) -> Response {
    let millis = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX);
    let seconds = millis.div_ceil(1000).max(1);

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "ok": false, "busy": true, "retryAfterMs": millis })),
    )
        .into_response();
    response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(seconds));
    response
}

pub(crate) fn failed(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "ok": false, "error": message }))).into_response()
}
