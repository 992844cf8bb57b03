//! `POST /api/rebuild`: replay the caller's history against a new base document.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tailr_core::RebuildOutcome;

use super::{busy, failed, generated};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::identity::UserId;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RebuildParams {
    pub page: String,
    pub base_html: String,
}

pub async fn rebuild_impl(
    State(state): State<AppState>, user: UserId, payload: Result<Json<RebuildParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(params) = payload?;
    let outcome = state.gateway.rebuild(&user.uid, &params.page, &params.base_html).await?;

    let response = match outcome {
        RebuildOutcome::Ok { document, page_url } => generated(document, page_url),
        RebuildOutcome::Skipped => Json(json!({ "ok": true, "skipped": true })).into_response(),
        RebuildOutcome::Busy => busy(state.retry_after),
        RebuildOutcome::Failed(message) => failed(message),
    };

    Ok(user.attach(response))
}
