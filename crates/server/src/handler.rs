//! HTTP router for tailr.
//!
//! This module wires the gateway into axum and routes each endpoint to its
//! implementation under [`crate::routes`].

use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use serde_json::json;
use tailr_core::Gateway;
use tower_http::trace::TraceLayer;

use crate::routes::{clear, prompt, rebuild, view};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    /// Delay advertised to clients on a busy response.
    pub retry_after: Duration,
}

/// Build the axum router with all tailr endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/p/{page}", get(view::view_impl))
        .route("/api/prompt", post(prompt::prompt_impl))
        .route("/api/rebuild", post(rebuild::rebuild_impl))
        .route("/api/clear-cache", post(clear::clear_impl))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "actors": state.gateway.actors().len(),
    }))
}
