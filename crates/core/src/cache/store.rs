//! Storage seams used by the actor and the gateway.
//!
//! Both traits promise per-call atomicity only. Nothing here offers a
//! transaction spanning several keys.

use async_trait::async_trait;

use crate::Error;

/// Shared key-value store for generated artifacts and their pointers.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Durable edit history, scoped to (user, page).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All recorded edits for (user, page), oldest first.
    async fn load(&self, uid: &str, page: &str) -> Result<Vec<String>, Error>;

    /// Record one more edit and return the new history length.
    async fn append(&self, uid: &str, page: &str, edit: &str) -> Result<usize, Error>;

    /// Drop the history of every page for `uid`. Returns the number of edits removed.
    async fn clear_user(&self, uid: &str) -> Result<u64, Error>;

    /// Drop the history of a single page for `uid`. Returns the number of edits removed.
    async fn clear_page(&self, uid: &str, page: &str) -> Result<u64, Error>;
}
