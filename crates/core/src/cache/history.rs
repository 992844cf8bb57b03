//! Edit history persistence.
//!
//! Each accepted edit is one row keyed by (user, page, seq); `seq` starts
//! at 1 and only ever increases, so loading in `seq` order replays the
//! edits exactly as they were accepted.

use async_trait::async_trait;
use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::store::HistoryStore;
use crate::Error;

#[async_trait]
impl HistoryStore for CacheDb {
    async fn load(&self, uid: &str, page: &str) -> Result<Vec<String>, Error> {
        let uid = uid.to_string();
        let page = page.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT edit_text FROM edit_history
                     WHERE user_id = ?1 AND page_id = ?2
                     ORDER BY seq ASC",
                )?;
                let rows = stmt.query_map(params![uid, page], |row| row.get(0))?;
                let edits = rows.collect::<Result<Vec<String>, _>>()?;
                Ok(edits)
            })
            .await
            .map_err(Error::from)
    }

    async fn append(&self, uid: &str, page: &str, edit: &str) -> Result<usize, Error> {
        let uid = uid.to_string();
        let page = page.to_string();
        let edit = edit.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let next: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM edit_history
                     WHERE user_id = ?1 AND page_id = ?2",
                    params![uid, page],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "INSERT INTO edit_history (user_id, page_id, seq, edit_text, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![uid, page, next, edit, now],
                )?;
                tx.commit()?;
                Ok(next as usize)
            })
            .await
            .map_err(Error::from)
    }

    async fn clear_user(&self, uid: &str) -> Result<u64, Error> {
        let uid = uid.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM edit_history WHERE user_id = ?1", params![uid])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn clear_page(&self, uid: &str, page: &str) -> Result<u64, Error> {
        let uid = uid.to_string();
        let page = page.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM edit_history WHERE user_id = ?1 AND page_id = ?2",
                    params![uid, page],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
