//! Lookup of the one actor owning each user identity.

use std::ops::Deref;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{ActorContext, UserActor};
use crate::Error;

type ActorMap = Arc<DashMap<String, Arc<UserActor>>>;

/// Concurrent map from user identity to its actor.
///
/// Actors are created on first use and evicted when the last [`ActorLease`]
/// for them is dropped. While any lease is alive the entry stays put, so two
/// overlapping requests for the same user always share one busy flag.
#[derive(Clone)]
pub struct ActorRegistry {
    actors: ActorMap,
    ctx: Arc<ActorContext>,
}

impl ActorRegistry {
    pub fn new(ctx: Arc<ActorContext>) -> Self {
        Self { actors: Arc::new(DashMap::new()), ctx }
    }

    /// Borrow the actor for `uid`, creating it if needed.
    pub fn lease(&self, uid: &str) -> ActorLease {
        let existing = self.actors.get(uid).map(|actor| Arc::clone(actor.value()));
        let actor = match existing {
            Some(actor) => actor,
            None => {
                let entry = self
                    .actors
                    .entry(uid.to_string())
                    .or_insert_with(|| Arc::new(UserActor::new(uid, self.ctx.clone())));
                Arc::clone(entry.value())
            }
        };
        ActorLease { actor: Some(actor), actors: Arc::clone(&self.actors) }
    }

    /// Discard history for `uid` without materializing an actor.
    pub async fn clear(&self, uid: &str, page: &str) -> Result<u64, Error> {
        super::clear_history(&self.ctx, uid, page).await
    }

    /// Number of actors currently held by at least one lease.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

/// Shared handle on a registered actor; evicts it on drop when idle.
pub struct ActorLease {
    actor: Option<Arc<UserActor>>,
    actors: ActorMap,
}

impl Deref for ActorLease {
    type Target = UserActor;

    fn deref(&self) -> &UserActor {
        self.actor.as_deref().unwrap_or_else(|| unreachable!("actor is only taken in drop"))
    }
}

impl Drop for ActorLease {
    fn drop(&mut self) {
        let Some(actor) = self.actor.take() else { return };
        let uid = actor.uid().to_string();
        drop(actor);

        // The shard write lock blocks new leases, so a count of one means
        // only the map still refers to the actor.
        if self
            .actors
            .remove_if(&uid, |_, actor| Arc::strong_count(actor) == 1 && !actor.is_busy())
            .is_some()
        {
            debug!(uid = %uid, "evicted idle actor");
        }
    }
}
