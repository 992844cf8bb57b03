//! Core types and shared functionality for tailr.
//!
//! This crate provides:
//! - Artifact cache and edit history storage (SQLite or in-memory)
//! - The per-user actor that serializes regeneration
//! - The gateway protocol that decides between serving, rebuilding and delegating
//! - Unified error types
//! - Configuration structures

pub mod actor;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generate;

#[cfg(test)]
mod testing;

pub use actor::{ActorLease, ActorRegistry, ActorSettings, RebuildResult, UserActor};
pub use cache::{CacheDb, HistoryStore, KvStore, MemoryStore, hash_document};
pub use config::AppConfig;
pub use error::Error;
pub use gateway::{ClearOutcome, EditOutcome, Gateway, RebuildOutcome, ViewOutcome};
pub use generate::Generator;
