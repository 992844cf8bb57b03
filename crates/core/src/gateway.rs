//! Request-level protocol in front of the actors.
//!
//! Views are answered straight from the cache and never wait on an actor.
//! Edits and rebuilds are delegated to the owning [`UserActor`](crate::actor::UserActor);
//! `Busy` comes back as a retryable outcome rather than an error.
//!
//! With the `user` clear scope, clearing one page drops the history of every
//! page but only the latest artifact of the cleared one. Other pages keep
//! serving their artifact; once their base document changes, `view` reports
//! `RebuildRequired` and `rebuild` can only answer `Skipped`. Clients should
//! fall back to the base document after a skipped rebuild.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Error;
use crate::actor::{ActorContext, ActorRegistry, ActorSettings, RebuildResult};
use crate::cache::{HistoryStore, KvStore, hash_document, keys};
use crate::generate::Generator;

/// Answer to a page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Served(String),
    /// Nothing generated yet; the caller should show the base document.
    NotCached,
    /// The cached artifact was built from a different base document.
    RebuildRequired,
}

/// Answer to an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Ok { document: String, page_url: String },
    Busy,
    Failed(String),
}

/// Answer to a rebuild request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    Ok { document: String, page_url: String },
    Skipped,
    Busy,
    Failed(String),
}

/// Answer to a clear request. Storage failures are logged, not returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Ok,
}

/// Public path of a personalized page.
pub fn page_url(page: &str) -> String {
    format!("/p/{page}")
}

#[derive(Clone)]
pub struct Gateway {
    kv: Arc<dyn KvStore>,
    actors: ActorRegistry,
}

impl Gateway {
    pub fn new(
        kv: Arc<dyn KvStore>, history: Arc<dyn HistoryStore>, generator: Arc<dyn Generator>, settings: ActorSettings,
    ) -> Self {
        let ctx = Arc::new(ActorContext::new(kv.clone(), history, generator, settings));
        Self { kv, actors: ActorRegistry::new(ctx) }
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    /// Look up the latest artifact for (user, page) and check it against the
    /// caller's base hash.
    pub async fn view(&self, uid: &str, page: &str, client_base_hash: Option<&str>) -> Result<ViewOutcome, Error> {
        validate_page(page)?;

        let Some(document) = self.kv.get(&keys::latest_artifact(uid, page)).await? else {
            debug!(uid, page, "no cached artifact");
            return Ok(ViewOutcome::NotCached);
        };
        let cached_hash = self.kv.get(&keys::latest_base_hash(uid, page)).await?;

        if let (Some(client), Some(cached)) = (client_base_hash, cached_hash.as_deref())
            && client != cached
        {
            info!(uid, page, "base document changed; rebuild required");
            return Ok(ViewOutcome::RebuildRequired);
        }

        debug!(uid, page, "serving cached artifact");
        Ok(ViewOutcome::Served(document))
    }

    pub async fn edit(&self, uid: &str, page: &str, base_document: &str, edit: &str) -> Result<EditOutcome, Error> {
        validate_page(page)?;
        if edit.trim().is_empty() {
            return Err(Error::InvalidInput("edit request cannot be empty".into()));
        }

        let base_hash = hash_document(base_document);
        let actor = self.actors.lease(uid);

        Ok(match actor.apply(page, base_document, &base_hash, edit).await {
            Ok(document) => EditOutcome::Ok { document, page_url: page_url(page) },
            Err(err) if err.is_retryable() => EditOutcome::Busy,
            Err(err) => EditOutcome::Failed(err.to_string()),
        })
    }

    pub async fn rebuild(&self, uid: &str, page: &str, base_document: &str) -> Result<RebuildOutcome, Error> {
        validate_page(page)?;

        let base_hash = hash_document(base_document);
        let actor = self.actors.lease(uid);
        let result = actor.rebuild(page, base_document, &base_hash).await;
        drop(actor);

        Ok(match result {
            Ok(RebuildResult::Rebuilt(document)) => RebuildOutcome::Ok { document, page_url: page_url(page) },
            Ok(RebuildResult::Skipped) => {
                self.warn_if_orphaned(uid, page).await;
                RebuildOutcome::Skipped
            }
            Err(err) if err.is_retryable() => RebuildOutcome::Busy,
            Err(err) => RebuildOutcome::Failed(err.to_string()),
        })
    }

    /// Drop the latest artifact pointer, then the user's history.
    ///
    /// Both steps run even if the first one fails; failures are logged only.
    pub async fn clear_cache(&self, uid: &str, page: &str) -> Result<ClearOutcome, Error> {
        validate_page(page)?;

        if let Err(err) = self.kv.delete(&keys::latest_artifact(uid, page)).await {
            warn!(uid, page, error = %err, "failed to delete latest artifact");
        }

        match self.actors.clear(uid, page).await {
            Ok(removed) => info!(uid, page, removed, "cache and history cleared"),
            Err(err) => warn!(uid, page, error = %err, "failed to clear history"),
        }

        Ok(ClearOutcome::Ok)
    }

    /// A skipped rebuild leaves any existing artifact in place.
    async fn warn_if_orphaned(&self, uid: &str, page: &str) {
        match self.kv.get(&keys::latest_artifact(uid, page)).await {
            Ok(Some(_)) => warn!(uid, page, "rebuild skipped but an artifact without history is still cached"),
            Ok(None) => {}
            Err(err) => debug!(uid, page, error = %err, "could not check for a cached artifact"),
        }
    }
}

fn validate_page(page: &str) -> Result<(), Error> {
    if page.trim().is_empty() {
        return Err(Error::InvalidInput("page cannot be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::testing::{FlakyStore, ScriptedGenerator, settings};

    const BASE: &str = "<html>A</html>";
    const RED: &str = "<html style=color:red>A</html>";

    struct Fixture {
        gateway: Gateway,
        store: Arc<MemoryStore>,
        generator: Arc<ScriptedGenerator>,
    }

    fn fixture(generator: ScriptedGenerator) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(generator);
        let gateway = Gateway::new(store.clone(), store.clone(), generator.clone(), settings());
        Fixture { gateway, store, generator }
    }

    #[tokio::test]
    async fn test_view_without_artifact_is_not_cached() {
        let f = fixture(ScriptedGenerator::returning(RED));
        let outcome = f.gateway.view("u", "catalog", None).await.unwrap();
        assert_eq!(outcome, ViewOutcome::NotCached);
    }

    #[tokio::test]
    async fn test_edit_then_view_round_trip() {
        let f = fixture(ScriptedGenerator::returning(RED));
        let h0 = hash_document(BASE);

        let outcome = f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();
        assert_eq!(outcome, EditOutcome::Ok { document: RED.to_string(), page_url: "/p/catalog".to_string() });

        let view = f.gateway.view("u", "catalog", Some(&h0)).await.unwrap();
        assert_eq!(view, ViewOutcome::Served(RED.to_string()));

        let view = f.gateway.view("u", "catalog", None).await.unwrap();
        assert_eq!(view, ViewOutcome::Served(RED.to_string()));
    }

    #[tokio::test]
    async fn test_changed_base_requires_rebuild() {
        let f = fixture(ScriptedGenerator::returning(RED));
        f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();

        let h2 = hash_document("<html>B</html>");
        let view = f.gateway.view("u", "catalog", Some(&h2)).await.unwrap();
        assert_eq!(view, ViewOutcome::RebuildRequired);
    }

    #[tokio::test]
    async fn test_artifact_without_hash_pointer_is_served() {
        let f = fixture(ScriptedGenerator::returning(RED));
        f.store.put(&keys::latest_artifact("u", "catalog"), RED).await.unwrap();

        let view = f.gateway.view("u", "catalog", Some("anything")).await.unwrap();
        assert_eq!(view, ViewOutcome::Served(RED.to_string()));
    }

    #[tokio::test]
    async fn test_rebuild_flow_after_base_change() {
        let f = fixture(ScriptedGenerator::new(|base, _| Ok(base.replace("<html>", "<html class=red>"))));
        f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();

        let new_base = "<html>B</html>";
        let h2 = hash_document(new_base);
        assert_eq!(f.gateway.view("u", "catalog", Some(&h2)).await.unwrap(), ViewOutcome::RebuildRequired);

        let outcome = f.gateway.rebuild("u", "catalog", new_base).await.unwrap();
        assert_eq!(
            outcome,
            RebuildOutcome::Ok { document: "<html class=red>B</html>".to_string(), page_url: "/p/catalog".to_string() }
        );
        assert_eq!(
            f.gateway.view("u", "catalog", Some(&h2)).await.unwrap(),
            ViewOutcome::Served("<html class=red>B</html>".to_string())
        );
        assert_eq!(f.generator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rebuild_without_history_is_skipped() {
        let f = fixture(ScriptedGenerator::returning(RED));
        let outcome = f.gateway.rebuild("u", "catalog", BASE).await.unwrap();
        assert_eq!(outcome, RebuildOutcome::Skipped);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_second_edit_while_first_in_flight_is_busy() {
        let f = fixture(ScriptedGenerator::returning(RED).gated());

        let first = {
            let gateway = f.gateway.clone();
            tokio::spawn(async move { gateway.edit("u", "catalog", BASE, "make it red").await })
        };
        f.generator.started.notified().await;

        let second = f.gateway.edit("u", "catalog", BASE, "make it blue").await.unwrap();
        assert_eq!(second, EditOutcome::Busy);
        let rebuild = f.gateway.rebuild("u", "catalog", BASE).await.unwrap();
        assert_eq!(rebuild, RebuildOutcome::Busy);

        // views never wait on the actor
        assert_eq!(f.gateway.view("u", "catalog", None).await.unwrap(), ViewOutcome::NotCached);

        f.generator.release();
        assert!(matches!(first.await.unwrap().unwrap(), EditOutcome::Ok { .. }));
        assert_eq!(f.store.load("u", "catalog").await.unwrap(), vec!["make it red"]);
    }

    #[tokio::test]
    async fn test_failed_generation_maps_to_failed() {
        let f = fixture(ScriptedGenerator::failing(529, "overloaded"));
        let outcome = f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();
        match outcome {
            EditOutcome::Failed(message) => {
                assert!(message.contains("GENERATION_FAILED"));
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(f.gateway.view("u", "catalog", None).await.unwrap(), ViewOutcome::NotCached);
    }

    #[tokio::test]
    async fn test_clear_cache_then_view_is_not_cached() {
        let f = fixture(ScriptedGenerator::returning(RED));
        f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();

        assert_eq!(f.gateway.clear_cache("u", "catalog").await.unwrap(), ClearOutcome::Ok);

        assert_eq!(f.gateway.view("u", "catalog", None).await.unwrap(), ViewOutcome::NotCached);
        assert!(f.store.load("u", "catalog").await.unwrap().is_empty());
        assert_eq!(f.gateway.rebuild("u", "catalog", BASE).await.unwrap(), RebuildOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_clear_cache_still_clears_history_when_delete_fails() {
        struct NoDelete(MemoryStore);

        #[async_trait::async_trait]
        impl KvStore for NoDelete {
            async fn get(&self, key: &str) -> Result<Option<String>, Error> {
                self.0.get(key).await
            }
            async fn put(&self, key: &str, value: &str) -> Result<(), Error> {
                self.0.put(key, value).await
            }
            async fn delete(&self, _key: &str) -> Result<(), Error> {
                Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
            }
        }

        let history = Arc::new(MemoryStore::new());
        let gateway = Gateway::new(
            Arc::new(NoDelete(MemoryStore::new())),
            history.clone(),
            Arc::new(ScriptedGenerator::returning(RED)),
            settings(),
        );
        gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();

        assert_eq!(gateway.clear_cache("u", "catalog").await.unwrap(), ClearOutcome::Ok);
        assert!(history.load("u", "catalog").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_write_surfaces_as_failed() {
        let kv = Arc::new(FlakyStore::failing_on(keys::latest_artifact("u", "catalog")));
        let gateway = Gateway::new(
            kv,
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedGenerator::returning(RED)),
            settings(),
        );

        let outcome = gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();
        assert!(matches!(outcome, EditOutcome::Failed(message) if message.contains("PARTIAL_CACHE_WRITE")));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let f = fixture(ScriptedGenerator::returning(RED));
        assert!(matches!(f.gateway.view("u", " ", None).await, Err(Error::InvalidInput(_))));
        assert!(matches!(f.gateway.edit("u", "catalog", BASE, "  ").await, Err(Error::InvalidInput(_))));
        assert!(matches!(f.gateway.rebuild("u", "", BASE).await, Err(Error::InvalidInput(_))));
        assert!(f.generator.calls().is_empty());
        assert!(f.store.load("u", "catalog").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let f = fixture(ScriptedGenerator::returning(RED));
        f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();

        assert_eq!(f.gateway.view("v", "catalog", None).await.unwrap(), ViewOutcome::NotCached);
        assert_eq!(f.gateway.view("u", "checkout", None).await.unwrap(), ViewOutcome::NotCached);
    }

    #[tokio::test]
    async fn test_actors_do_not_outlive_requests() {
        let f = fixture(ScriptedGenerator::returning(RED));

        for i in 0..50 {
            let uid = format!("visitor-{i}");
            f.gateway.clear_cache(&uid, "catalog").await.unwrap();
            assert_eq!(f.gateway.rebuild(&uid, "catalog", BASE).await.unwrap(), RebuildOutcome::Skipped);
        }
        assert!(f.gateway.actors().is_empty());

        f.gateway.edit("u", "catalog", BASE, "make it red").await.unwrap();
        assert_eq!(f.gateway.actors().len(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_edit_keeps_its_actor() {
        let f = fixture(ScriptedGenerator::returning(RED).gated());

        let first = {
            let gateway = f.gateway.clone();
            tokio::spawn(async move { gateway.edit("u", "catalog", BASE, "make it red").await })
        };
        f.generator.started.notified().await;
        assert_eq!(f.gateway.actors().len(), 1);

        f.generator.release();
        first.await.unwrap().unwrap();
        assert!(f.gateway.actors().is_empty());
    }

    #[tokio::test]
    async fn test_user_scope_clear_orphans_other_pages() {
        let f = fixture(ScriptedGenerator::returning(RED));
        f.gateway.edit("u", "checkout", BASE, "make it red").await.unwrap();

        f.gateway.clear_cache("u", "catalog").await.unwrap();

        let h2 = hash_document("<html>B</html>");
        assert_eq!(f.gateway.view("u", "checkout", Some(&h2)).await.unwrap(), ViewOutcome::RebuildRequired);
        assert_eq!(f.gateway.rebuild("u", "checkout", "<html>B</html>").await.unwrap(), RebuildOutcome::Skipped);
        // the old artifact is still served to clients that do not send a hash
        assert_eq!(f.gateway.view("u", "checkout", None).await.unwrap(), ViewOutcome::Served(RED.to_string()));
        assert_eq!(f.generator.calls().len(), 1);
    }
}
