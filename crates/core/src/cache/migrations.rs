//! Schema for the artifact cache and edit history.
//!
//! - `kv_entries`: one row per cache key (archived artifacts and the two
//!   `latest` pointers per user and page), upserted in place.
//! - `edit_history`: one row per accepted edit, keyed by
//!   (`user_id`, `page_id`, `seq`) so history replays in acceptance order.
//!
//! Applied versions are recorded in `_migrations`; each step runs in its own
//! transaction together with its version row.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered schema steps: (version, SQL).
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_kv_entries.sql")),
    (2, include_str!("../../migrations/002_edit_history.sql")),
];

/// Highest schema version this build knows about.
pub const LATEST_VERSION: i64 = MIGRATIONS[MIGRATIONS.len() - 1].0;

/// Bring the schema up to [`LATEST_VERSION`].
///
/// # Errors
///
/// Returns `MigrationFailed` if the database was written by a newer build,
/// or the underlying SQLite error if a step fails. A failed step leaves the
/// previous version in place.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
        if current > LATEST_VERSION {
            return Err(Error::MigrationFailed(format!(
                "schema version {current} is newer than supported version {LATEST_VERSION}"
            )));
        }

        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            tracing::debug!(version, "applying cache migration");
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
