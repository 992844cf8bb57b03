//! Key-value operations on the SQLite cache.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::keys;
use super::store::KvStore;
use crate::Error;

impl CacheDb {
    /// Remove every cached artifact and edit recorded for `uid`.
    ///
    /// Returns the number of rows deleted across both tables.
    pub async fn purge_user(&self, uid: &str) -> Result<u64, Error> {
        let owner = uid.to_string();
        let prefix = keys::user_prefix(uid);
        let removed = self
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                // prefix match without LIKE so `%` and `_` in uids stay literal
                let entries = tx.execute(
                    "DELETE FROM kv_entries WHERE substr(key, 1, length(?1)) = ?1",
                    params![prefix],
                )?;
                let edits = tx.execute("DELETE FROM edit_history WHERE user_id = ?1", params![owner])?;
                tx.commit()?;
                Ok((entries + edits) as u64)
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(uid, removed, "purged user");
        Ok(removed)
    }
}

#[async_trait]
impl KvStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM kv_entries WHERE key = ?1", params![key], |row| {
                    row.get(0)
                });

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Upsert: inserts if the key doesn't exist, replaces the value if it does.
    async fn put(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
