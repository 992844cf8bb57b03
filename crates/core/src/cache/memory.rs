//! In-process store, used in tests and for throwaway deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{HistoryStore, KvStore};
use crate::Error;

/// Volatile [`KvStore`] and [`HistoryStore`] backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    history: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key-value entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load(&self, uid: &str, page: &str) -> Result<Vec<String>, Error> {
        let history = self.history.read().await;
        Ok(history
            .get(&(uid.to_string(), page.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, uid: &str, page: &str, edit: &str) -> Result<usize, Error> {
        let mut history = self.history.write().await;
        let edits = history.entry((uid.to_string(), page.to_string())).or_default();
        edits.push(edit.to_string());
        Ok(edits.len())
    }

    async fn clear_user(&self, uid: &str) -> Result<u64, Error> {
        let mut history = self.history.write().await;
        let mut removed = 0u64;
        history.retain(|(owner, _), edits| {
            if owner == uid {
                removed += edits.len() as u64;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn clear_page(&self, uid: &str, page: &str) -> Result<u64, Error> {
        let mut history = self.history.write().await;
        Ok(history
            .remove(&(uid.to_string(), page.to_string()))
            .map(|edits| edits.len() as u64)
            .unwrap_or(0))
    }
}
