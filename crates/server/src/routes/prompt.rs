//! `POST /api/prompt`: record an edit and regenerate the page.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use serde::Deserialize;
use tailr_core::EditOutcome;

use super::{busy, failed, generated};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::identity::UserId;

/// Request body for an edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptParams {
    pub page: String,
    /// Free-text edit request.
    pub prompt: String,
    /// The unpersonalized document the edit applies to.
    pub base_html: String,
}

pub async fn prompt_impl(
    State(state): State<AppState>, user: UserId, payload: Result<Json<PromptParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(params) = payload?;
    let outcome = state
        .gateway
        .edit(&user.uid, &params.page, &params.base_html, &params.prompt)
        .await?;

    let response = match outcome {
        EditOutcome::Ok { document, page_url } => generated(document, page_url),
        EditOutcome::Busy => busy(state.retry_after),
        EditOutcome::Failed(message) => failed(message),
    };

    Ok(user.attach(response))
}
