//! tailr server entry point.
//!
//! Boots the HTTP binding in front of the personalization gateway.
//! Logging goes to stderr as JSON, filtered by `RUST_LOG`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tailr_client::{GenerationClient, GenerationConfig};
use tailr_core::config::StoreKind;
use tailr_core::{ActorSettings, AppConfig, CacheDb, Gateway, HistoryStore, KvStore, MemoryStore};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod identity;
mod routes;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let generator = GenerationClient::new(GenerationConfig::from_app_config(&config)?)?;

    let (kv, history): (Arc<dyn KvStore>, Arc<dyn HistoryStore>) = match config.store {
        StoreKind::Sqlite => {
            let db = Arc::new(
                CacheDb::open(&config.db_path)
                    .await
                    .with_context(|| format!("opening cache database at {}", config.db_path.display()))?,
            );
            (db.clone(), db)
        }
        StoreKind::Memory => {
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    };

    let gateway = Gateway::new(kv, history, Arc::new(generator), ActorSettings::from(&config));
    let app = handler::build_router(handler::AppState { gateway, retry_after: config.retry_after() });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, store = ?config.store, model = %config.model, "Starting tailr server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("tailr server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
