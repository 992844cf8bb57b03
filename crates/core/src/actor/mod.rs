//! Per-user single-writer actor.
//!
//! Every user identity maps to one [`UserActor`]. Apply and rebuild claim the
//! actor's [`BusyFlag`] before touching history or the cache; a second caller
//! gets [`Error::Busy`] immediately instead of queueing. Clear is not gated.
//!
//! Cache writes for one artifact are ordered archive, latest artifact,
//! latest base hash. The store only guarantees per-key atomicity, so a
//! failure part way through is reported as [`Error::PartialCacheWrite`].

mod busy;
mod registry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use busy::{BusyFlag, BusyGuard};
pub use registry::{ActorLease, ActorRegistry};

use crate::Error;
use crate::cache::{HistoryStore, KvStore, keys};
use crate::config::{AppConfig, ClearScope};
use crate::generate::Generator;

/// Tunables shared by every actor.
#[derive(Debug, Clone, Copy)]
pub struct ActorSettings {
    pub generation_timeout: Duration,
    pub clear_scope: ClearScope,
}

impl From<&AppConfig> for ActorSettings {
    fn from(config: &AppConfig) -> Self {
        Self { generation_timeout: config.generation_timeout(), clear_scope: config.clear_scope }
    }
}

/// Collaborators shared by every actor.
pub struct ActorContext {
    kv: Arc<dyn KvStore>,
    history: Arc<dyn HistoryStore>,
    generator: Arc<dyn Generator>,
    settings: ActorSettings,
}

impl ActorContext {
    pub fn new(
        kv: Arc<dyn KvStore>, history: Arc<dyn HistoryStore>, generator: Arc<dyn Generator>, settings: ActorSettings,
    ) -> Self {
        Self { kv, history, generator, settings }
    }
}

/// Outcome of a rebuild that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildResult {
    Rebuilt(String),
    /// No history to replay; nothing was generated or written.
    Skipped,
}

/// Exclusive owner of one user's edit history and generation slot.
pub struct UserActor {
    uid: String,
    busy: BusyFlag,
    ctx: Arc<ActorContext>,
}

impl UserActor {
    pub fn new(uid: impl Into<String>, ctx: Arc<ActorContext>) -> Self {
        Self { uid: uid.into(), busy: BusyFlag::new(), ctx }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    fn claim(&self) -> Result<BusyGuard<'_>, Error> {
        self.busy.try_acquire().ok_or_else(|| {
            debug!(uid = %self.uid, "rejecting request: generation in progress");
            Error::Busy(self.uid.clone())
        })
    }

    /// Record `edit` and regenerate the page from the full history.
    ///
    /// The edit stays recorded even when generation fails; nothing is written
    /// to the cache in that case.
    pub async fn apply(&self, page: &str, base_document: &str, base_hash: &str, edit: &str) -> Result<String, Error> {
        let _guard = self.claim()?;

        let mut history = self.ctx.history.load(&self.uid, page).await?;
        let len = self.ctx.history.append(&self.uid, page, edit).await?;
        history.push(edit.to_string());
        info!(uid = %self.uid, page, history_len = len, "applying edit");

        let document = self.generate(page, base_document, &history).await?;
        self.write_artifact(page, base_hash, &document).await?;

        Ok(document)
    }

    /// Replay the existing history against a new base document.
    pub async fn rebuild(&self, page: &str, base_document: &str, base_hash: &str) -> Result<RebuildResult, Error> {
        let _guard = self.claim()?;

        let history = self.ctx.history.load(&self.uid, page).await?;
        if history.is_empty() {
            debug!(uid = %self.uid, page, "nothing to rebuild");
            return Ok(RebuildResult::Skipped);
        }
        info!(uid = %self.uid, page, history_len = history.len(), "rebuilding from history");

        let document = self.generate(page, base_document, &history).await?;
        self.write_artifact(page, base_hash, &document).await?;

        Ok(RebuildResult::Rebuilt(document))
    }

    /// Discard persisted history according to the configured scope.
    ///
    /// Returns the number of edits removed; clearing nothing is a success.
    pub async fn clear(&self, page: &str) -> Result<u64, Error> {
        clear_history(&self.ctx, &self.uid, page).await
    }

    async fn generate(&self, page: &str, base_document: &str, history: &[String]) -> Result<String, Error> {
        let timeout = self.ctx.settings.generation_timeout;
        let call = self.ctx.generator.generate(base_document, page, history);

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(err)) => {
                error!(uid = %self.uid, page, error = %err, "generation failed");
                Err(err)
            }
            Err(_) => {
                error!(uid = %self.uid, page, timeout_ms = timeout.as_millis() as u64, "generation timed out");
                Err(Error::GenerationTimeout(timeout.as_millis() as u64))
            }
        }
    }

    async fn write_artifact(&self, page: &str, base_hash: &str, document: &str) -> Result<(), Error> {
        let writes = [
            (keys::artifact(&self.uid, page, base_hash), document),
            (keys::latest_artifact(&self.uid, page), document),
            (keys::latest_base_hash(&self.uid, page), base_hash),
        ];

        let mut written = Vec::with_capacity(writes.len());
        for (key, value) in writes {
            if let Err(err) = self.ctx.kv.put(&key, value).await {
                if written.is_empty() {
                    return Err(err);
                }
                warn!(uid = %self.uid, page, written = ?written, failed_key = %key, error = %err, "partial cache write");
                return Err(Error::PartialCacheWrite { written, failed_key: key, source: Box::new(err) });
            }
            written.push(key);
        }

        debug!(uid = %self.uid, page, base_hash, "artifact cached");
        Ok(())
    }
}

async fn clear_history(ctx: &ActorContext, uid: &str, page: &str) -> Result<u64, Error> {
    let removed = match ctx.settings.clear_scope {
        ClearScope::User => ctx.history.clear_user(uid).await?,
        ClearScope::Page => ctx.history.clear_page(uid, page).await?,
    };
    info!(uid, page, scope = ?ctx.settings.clear_scope, removed, "history cleared");
    Ok(removed)
}
