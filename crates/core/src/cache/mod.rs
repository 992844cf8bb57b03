//! Artifact cache and edit history storage.
//!
//! This module provides the storage the personalization engine relies on:
//!
//! - Content hashing of base documents (SHA-256)
//! - The `KvStore` / `HistoryStore` seams
//! - A SQLite backend via tokio-rusqlite with automatic schema migrations
//! - An in-memory backend for tests

pub mod connection;
pub mod hash;
pub mod history;
pub mod keys;
pub mod kv;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::hash_document;
pub use memory::MemoryStore;
pub use store::{HistoryStore, KvStore};
