//! The document repository façade.
//!
//! One repository per entity kind, composing the store handle, the bounded
//! write executor, the commit bus, the id factory, and the edit-command
//! factory. Logical record states: absent → active → (edited →) active →
//! removed. Removal is logical: `get` treats removed as absent, while
//! `get_any` (audit access) still sees the row.

use std::sync::Arc;

use quill_core::document::{Document, Record};
use quill_core::enums::ActionKind;
use quill_core::event::UpdateEvent;
use quill_core::ids::{IdFactory, IdFactoryProvider};
use quill_config::StoreConfig;
use serde_json::Value;

use crate::bus::{CommitBus, CommitListener, Registration};
use crate::command::{
    EditCommand, EditCommandFactory, InsertDocument, RemoveDocument, UpdateContext,
    UpdateDocument, run_commit,
};
use crate::error::StoreError;
use crate::executor::{WriteExecutor, WriteHandle};
use crate::journal::{JournalListener, JournalWriter};
use crate::observer::ObservedTask;
use crate::{AuditRow, QuillStore, Snapshot};

/// Get/create/edit/remove/register over one entity kind's documents.
pub struct DocumentRepository<D: Document> {
    store: Arc<QuillStore>,
    executor: Arc<WriteExecutor>,
    bus: Arc<CommitBus>,
    commands: EditCommandFactory<D>,
    ids: IdFactory,
    actor: Option<String>,
    /// Listeners the repository itself owns (e.g. the journal); they
    /// unsubscribe when the repository is dropped.
    _own_registrations: Vec<Registration>,
}

impl<D: Document> DocumentRepository<D> {
    #[must_use]
    pub fn new(
        store: Arc<QuillStore>,
        executor: Arc<WriteExecutor>,
        bus: Arc<CommitBus>,
        actor: Option<String>,
    ) -> Self {
        let commands = EditCommandFactory::new(Arc::clone(&executor), Arc::clone(&bus), actor.clone());
        Self {
            store,
            executor,
            bus,
            commands,
            ids: IdFactoryProvider::factory(D::KIND),
            actor,
            _own_registrations: Vec::new(),
        }
    }

    /// Open a full repository stack from configuration: local store,
    /// bounded executor, fresh bus, and, if configured, the commit journal
    /// registered as a listener.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store or journal directory cannot be
    /// opened.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        tracing::debug!(
            kind = %D::KIND,
            path = %config.path,
            workers = config.workers,
            "opening document repository"
        );
        let store = Arc::new(QuillStore::open_local(&config.path).await?);
        let executor = Arc::new(WriteExecutor::new(store.conn().clone(), config.workers));
        let bus = Arc::new(CommitBus::new());
        let mut repo = Self::new(store, executor, bus, config.actor());

        if !config.journal_dir.is_empty() {
            let writer = JournalWriter::new(config.journal_dir.clone().into())?;
            let registration = repo.register(Arc::new(JournalListener::new(writer)));
            repo._own_registrations.push(registration);
        }
        Ok(repo)
    }

    /// The underlying store handle, for lower-level (audit) queries.
    #[must_use]
    pub fn store(&self) -> &QuillStore {
        &self.store
    }

    /// This repository's commit bus.
    #[must_use]
    pub const fn bus(&self) -> &Arc<CommitBus> {
        &self.bus
    }

    /// Stop accepting writes. In-flight commits complete; queued ones abort.
    pub fn shutdown(&self) {
        self.executor.close();
    }

    /// Fetch the active record for `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is absent or logically
    /// removed.
    pub async fn get(&self, id: &str) -> Result<Record<D>, StoreError> {
        let snapshot = self
            .store
            .fetch_snapshot(D::KIND, id, false)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: D::KIND.as_str().to_string(),
                id: id.to_string(),
            })?;
        Self::adapt_snapshot(id, snapshot)
    }

    /// Audit-level access: the raw row including bookkeeping, visible even
    /// after logical removal. `None` only if the id never existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the row cannot be read.
    pub async fn get_any(&self, id: &str) -> Result<Option<AuditRow>, StoreError> {
        self.store.fetch_audit_row(D::KIND, id).await
    }

    /// An edit command for a brand-new record with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if id generation fails.
    pub fn create(&self) -> Result<EditCommand<D>, StoreError> {
        let id = self.ids.next_id()?;
        Ok(self.commands.create(id, Arc::new(InsertDocument)))
    }

    /// An edit command for a brand-new record with a caller-chosen id.
    #[must_use]
    pub fn create_with_id(&self, id: impl Into<String>) -> EditCommand<D> {
        self.commands.create(id.into(), Arc::new(InsertDocument))
    }

    /// An edit command seeded with the current snapshot of `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` unless the record is active.
    pub async fn edit(&self, id: &str) -> Result<EditCommand<D>, StoreError> {
        let snapshot = self
            .store
            .fetch_snapshot(D::KIND, id, false)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: D::KIND.as_str().to_string(),
                id: id.to_string(),
            })?;
        Ok(self
            .commands
            .edit(id.to_string(), snapshot, Arc::new(UpdateDocument)))
    }

    /// Logically remove `id` (active → removed), through the same
    /// before/write/after pipeline as every other mutation.
    ///
    /// Returns immediately; `NotFound` for a missing or already-removed
    /// record surfaces through the future.
    pub fn remove(&self, id: &str) -> WriteHandle<()> {
        let event = UpdateEvent::new(ActionKind::Delete, D::KIND, id, self.actor.clone());
        let ctx = UpdateContext {
            event,
            original: None,
            updated: Value::Null,
        };
        run_commit(
            &self.executor,
            Arc::clone(&self.bus),
            Arc::new(RemoveDocument),
            ctx,
            (),
            ObservedTask::unobserved(),
        )
    }

    /// Register a commit listener on this repository's bus.
    pub fn register(&self, listener: Arc<dyn CommitListener>) -> Registration {
        self.bus.register(listener)
    }

    /// The most recently touched active records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or a stored document no
    /// longer adapts.
    pub async fn list(&self, limit: u32) -> Result<Vec<Record<D>>, StoreError> {
        let snapshots = self.store.list_snapshots(D::KIND, limit).await?;
        snapshots
            .into_iter()
            .map(|snapshot| {
                let id = snapshot
                    .doc
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Self::adapt_snapshot(&id, snapshot)
            })
            .collect()
    }

    fn adapt_snapshot(id: &str, snapshot: Snapshot) -> Result<Record<D>, StoreError> {
        let dto: D = serde_json::from_value(snapshot.doc).map_err(|e| {
            StoreError::ExecutionFailed(format!(
                "stored document for {} {id} is unreadable: {e}",
                D::KIND
            ))
        })?;
        Record::adapt(dto).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_repo;
    use quill_core::entities::{Note, Work};
    use quill_core::event::UpdateEvent;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn get_absent_id_is_not_found() {
        let repo = test_repo::<Work>().await;
        let err = repo.get("wrk-ffffffffffffffff").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn create_assigns_fresh_prefixed_id() {
        let repo = test_repo::<Work>().await;
        let mut command = repo.create().unwrap();
        command.set("title", "Philosophiæ Naturalis");

        let record = command.execute().await.unwrap();
        assert!(record.id().starts_with("wrk-"));
        assert_eq!(record.title.as_deref(), Some("Philosophiæ Naturalis"));

        let fetched = repo.get(record.id()).await.unwrap();
        assert_eq!(fetched.title, record.title);
    }

    #[tokio::test]
    async fn edit_requires_an_active_record() {
        let repo = test_repo::<Work>().await;
        let err = repo.edit("wrk-ffffffffffffffff").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn edit_preserves_unstaged_fields() {
        let repo = test_repo::<Work>().await;
        let mut create = repo.create().unwrap();
        create
            .set("title", "First Edition")
            .set("publisher", "Maison d'Hiver")
            .set("publication_year", 1855);
        let created = create.execute().await.unwrap();

        let mut edit = repo.edit(created.id()).await.unwrap();
        edit.set("title", "Second Edition");
        let updated = edit.execute().await.unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.title.as_deref(), Some("Second Edition"));
        assert_eq!(updated.publisher.as_deref(), Some("Maison d'Hiver"));
        assert_eq!(updated.publication_year, Some(1855));
    }

    #[tokio::test]
    async fn stale_edit_is_rejected_with_conflict() {
        let repo = test_repo::<Work>().await;
        let mut create = repo.create().unwrap();
        create.set("title", "Contended");
        let created = create.execute().await.unwrap();

        // Two commands seeded from the same snapshot.
        let mut first = repo.edit(created.id()).await.unwrap();
        let mut second = repo.edit(created.id()).await.unwrap();

        first.set("title", "First writer");
        first.execute().await.unwrap();

        second.set("title", "Second writer");
        let err = second.execute().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // The first write stands.
        let current = repo.get(created.id()).await.unwrap();
        assert_eq!(current.title.as_deref(), Some("First writer"));
    }

    #[tokio::test]
    async fn remove_is_logical_and_get_treats_removed_as_absent() {
        let repo = test_repo::<Note>().await;
        let mut create = repo.create().unwrap();
        create.set("body", "ephemeral");
        let note = create.execute().await.unwrap();

        repo.remove(note.id()).await.unwrap();

        let err = repo.get(note.id()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        // Audit access still sees the row.
        let audit = repo.get_any(note.id()).await.unwrap().unwrap();
        assert!(!audit.snapshot.active);
        assert_eq!(audit.snapshot.doc["body"], "ephemeral");
    }

    #[tokio::test]
    async fn removing_twice_is_not_found_the_second_time() {
        let repo = test_repo::<Note>().await;
        let mut create = repo.create().unwrap();
        create.set("body", "once");
        let note = create.execute().await.unwrap();

        repo.remove(note.id()).await.unwrap();
        let err = repo.remove(note.id()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_returns_active_records_only() {
        let repo = test_repo::<Note>().await;
        for body in ["alpha", "beta", "gamma"] {
            let mut create = repo.create().unwrap();
            create.set("body", body);
            create.execute().await.unwrap();
        }
        let all = repo.list(10).await.unwrap();
        assert_eq!(all.len(), 3);

        repo.remove(all[0].id()).await.unwrap();
        let remaining = repo.list(10).await.unwrap();
        assert_eq!(remaining.len(), 2);
    }

    struct VetoEmbargoed {
        after_calls: AtomicU32,
    }

    impl CommitListener for VetoEmbargoed {
        fn before_commit(&self, event: &UpdateEvent) -> anyhow::Result<()> {
            if event.entity_id.ends_with("embargoed") {
                anyhow::bail!("record is embargoed");
            }
            Ok(())
        }

        fn after_commit(&self, _event: &UpdateEvent) -> anyhow::Result<()> {
            self.after_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn veto_prevents_the_write_and_the_after_phase() {
        let repo = test_repo::<Work>().await;
        let listener = Arc::new(VetoEmbargoed {
            after_calls: AtomicU32::new(0),
        });
        let _registration = repo.register(listener.clone());

        let mut command = repo.create_with_id("wrk-embargoed");
        command.set("title", "Never written");
        let err = command.execute().await.unwrap_err();
        assert!(matches!(err, StoreError::Canceled(_)));

        assert!(repo.get_any("wrk-embargoed").await.unwrap().is_none(), "no write attempted");
        assert_eq!(listener.after_calls.load(Ordering::SeqCst), 0);

        // A non-embargoed id sails through the same listener.
        let mut fine = repo.create_with_id("wrk-cleared");
        fine.set("title", "Written");
        fine.execute().await.unwrap();
        assert_eq!(listener.after_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn events_carry_the_repository_actor() {
        struct CaptureActor {
            actor: std::sync::Mutex<Option<String>>,
        }
        impl CommitListener for CaptureActor {
            fn after_commit(&self, event: &UpdateEvent) -> anyhow::Result<()> {
                *self.actor.lock().unwrap() = event.actor.clone();
                Ok(())
            }
        }

        let repo = crate::test_support::helpers::test_repo_with_actor::<Note>(
            Some("curator@example.org".to_string()),
        )
        .await;
        let capture = Arc::new(CaptureActor {
            actor: std::sync::Mutex::new(None),
        });
        let _registration = repo.register(capture.clone());

        let mut create = repo.create().unwrap();
        create.set("body", "attributed");
        create.execute().await.unwrap();

        assert_eq!(
            capture.actor.lock().unwrap().as_deref(),
            Some("curator@example.org")
        );
    }
}
