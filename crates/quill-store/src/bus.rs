//! Commit notification fan-out.
//!
//! A `CommitBus` holds the listeners of one repository instance — it is an
//! injected dependency, not process-global state, and dies with the
//! repository that owns it. Per commit, `before` runs for every listener
//! ahead of the write attempt and any listener may veto, aborting the whole
//! operation; this is the only cancellation point. `after` runs once the
//! write is durable, and a failure there is logged and swallowed: a durable
//! write is never rolled back on behalf of a listener. The two phases carry
//! opposite failure philosophies on purpose; keep them that way.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use quill_core::event::UpdateEvent;

use crate::error::StoreError;

/// External observer of commits: search indexers, identifier resolvers,
/// audit sinks.
pub trait CommitListener: Send + Sync {
    /// Called before the write is attempted. Returning an error vetoes the
    /// commit: no write happens and the mutation resolves to `Canceled`.
    ///
    /// # Errors
    ///
    /// Any error vetoes the commit; its message becomes the cancel reason.
    fn before_commit(&self, event: &UpdateEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }

    /// Called after the write is durable. Errors are logged per listener
    /// and never propagated.
    ///
    /// # Errors
    ///
    /// Returned errors are captured by the bus; they cannot affect the
    /// committed write.
    fn after_commit(&self, event: &UpdateEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }
}

struct ListenerEntry {
    id: u64,
    listener: Arc<dyn CommitListener>,
}

/// Listener registry for one repository instance.
#[derive(Default)]
pub struct CommitBus {
    entries: RwLock<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl CommitBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The returned handle unsubscribes on `close()`
    /// or drop; multiple concurrent registrations are legal.
    pub fn register(self: &Arc<Self>, listener: Arc<dyn CommitListener>) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ListenerEntry { id, listener });
        Registration {
            bus: Arc::downgrade(self),
            id,
        }
    }

    /// Deliver the vetoable pre-write notification.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Canceled` carrying the first veto's message.
    pub fn before(&self, event: &UpdateEvent) -> Result<(), StoreError> {
        for listener in self.snapshot() {
            if let Err(veto) = listener.before_commit(event) {
                return Err(StoreError::Canceled(veto.to_string()));
            }
        }
        Ok(())
    }

    /// Deliver the best-effort post-write notification to every listener.
    /// Listener failures are isolated and logged, never propagated.
    pub fn after(&self, event: &UpdateEvent) {
        for listener in self.snapshot() {
            if let Err(e) = listener.after_commit(event) {
                tracing::warn!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    "after-commit listener failed: {e:#}"
                );
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clone the current listener set out from under the lock, so delivery
    /// never holds the lock while listener code runs. Registrations that
    /// happen mid-delivery catch the next commit.
    fn snapshot(&self) -> Vec<Arc<dyn CommitListener>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }

    fn unregister(&self, id: u64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry.id != id);
    }
}

/// Subscription handle. Closing (or dropping) it unsubscribes.
#[must_use = "dropping the registration unsubscribes the listener"]
pub struct Registration {
    bus: Weak<CommitBus>,
    id: u64,
}

impl Registration {
    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unregister(self.id);
        }
    }
}
