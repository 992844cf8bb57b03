//! `GET /p/{page}`: serve the caller's personalized page from cache.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tailr_core::ViewOutcome;

use crate::error::ApiError;
use crate::handler::AppState;
use crate::identity::UserId;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    /// Hash of the base document the client currently holds.
    pub base_hash: Option<String>,
}

pub async fn view_impl(
    State(state): State<AppState>, user: UserId, Path(page): Path<String>, Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let base_hash = query.base_hash.as_deref().filter(|hash| !hash.is_empty());
    let outcome = state.gateway.view(&user.uid, &page, base_hash).await?;

    let response = match outcome {
        ViewOutcome::Served(document) => {
            ([(CONTENT_TYPE, "text/html; charset=utf-8")], document).into_response()
        }
        ViewOutcome::RebuildRequired => {
            (StatusCode::ACCEPTED, [(CONTENT_TYPE, "text/plain")], "Rebuild required").into_response()
        }
        ViewOutcome::NotCached => (StatusCode::NOT_FOUND, "Not cached").into_response(),
    };

    Ok(user.attach(response))
}
