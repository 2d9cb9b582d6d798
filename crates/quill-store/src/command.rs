//! One-shot edit commands and their commit strategies.
//!
//! An `EditCommand` binds one change set to one target id and (for edits)
//! the original snapshot. `execute()` is an irrevocable staged→submitted
//! transition guarded by a single compare-and-swap: the first call wins,
//! every later call resolves to `IllegalState` without submitting anything.
//!
//! The submitted unit of work runs the full commit pipeline off-thread:
//! `before` listeners (vetoable), then the strategy's write, then `after`
//! listeners (best effort).

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quill_core::document::{Document, Record};
use quill_core::enums::ActionKind;
use quill_core::event::UpdateEvent;
use serde_json::Value;

use crate::Snapshot;
use crate::bus::CommitBus;
use crate::changeset::ChangeSet;
use crate::error::StoreError;
use crate::executor::{TaskFuture, WriteExecutor, WriteHandle};
use crate::observer::{ObservedTask, TaskObserver};

/// What the commit logic gets to see: the event being committed, the
/// original snapshot (absent for creation), and the fully materialized
/// updated document.
pub struct UpdateContext {
    pub event: UpdateEvent,
    pub original: Option<Snapshot>,
    pub updated: Value,
}

impl UpdateContext {
    /// The snapshot the command was seeded with, if any.
    #[must_use]
    pub const fn original(&self) -> Option<&Snapshot> {
        self.original.as_ref()
    }

    /// True when there was no prior record (a create).
    #[must_use]
    pub const fn is_creation(&self) -> bool {
        self.original.is_none()
    }
}

/// Boxed future returned by a commit strategy.
pub type CommitFuture = Pin<Box<dyn Future<Output = Result<Snapshot, StoreError>> + Send>>;

/// Where and how an edit command's staged state becomes durable.
///
/// A strategy receives the connection for its exclusive duration and the
/// update context, performs the write, and resolves to the stored snapshot.
pub trait CommitStrategy: Send + Sync + 'static {
    fn commit(&self, conn: libsql::Connection, ctx: UpdateContext) -> CommitFuture;
}

/// INSERT a brand-new document row at revision 1.
pub struct InsertDocument;

impl CommitStrategy for InsertDocument {
    fn commit(&self, conn: libsql::Connection, ctx: UpdateContext) -> CommitFuture {
        Box::pin(async move {
            let doc_text = serde_json::to_string(&ctx.updated)
                .map_err(|e| StoreError::ExecutionFailed(format!("serialize document: {e}")))?;
            let now = ctx.event.ts.to_rfc3339();
            conn.execute(
                "INSERT INTO documents (id, kind, doc, revision, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, 1, ?4, ?4)",
                libsql::params![
                    ctx.event.entity_id.as_str(),
                    ctx.event.kind.as_str(),
                    doc_text.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    StoreError::ExecutionFailed(format!(
                        "id {} already exists",
                        ctx.event.entity_id
                    ))
                } else {
                    StoreError::LibSql(e)
                }
            })?;

            Ok(Snapshot {
                doc: ctx.updated,
                revision: 1,
                active: true,
            })
        })
    }
}

/// UPDATE an existing active row, guarded by the original's revision.
///
/// A concurrent edit that committed first moves the revision, and this
/// strategy then rejects the stale write with `Conflict` rather than
/// silently overwriting it.
pub struct UpdateDocument;

impl CommitStrategy for UpdateDocument {
    fn commit(&self, conn: libsql::Connection, ctx: UpdateContext) -> CommitFuture {
        Box::pin(async move {
            let Some(original) = ctx.original else {
                return Err(StoreError::IllegalState(
                    "update strategy requires an original snapshot".to_string(),
                ));
            };
            let doc_text = serde_json::to_string(&ctx.updated)
                .map_err(|e| StoreError::ExecutionFailed(format!("serialize document: {e}")))?;
            let now = ctx.event.ts.to_rfc3339();
            let id = ctx.event.entity_id.as_str();
            let kind = ctx.event.kind;

            let affected = conn
                .execute(
                    "UPDATE documents
                     SET doc = ?1, revision = revision + 1, updated_at = ?2
                     WHERE id = ?3 AND kind = ?4 AND active = 1 AND revision = ?5",
                    libsql::params![
                        doc_text.as_str(),
                        now.as_str(),
                        id,
                        kind.as_str(),
                        original.revision
                    ],
                )
                .await?;

            if affected == 0 {
                // Zero rows means either the record is gone or someone else
                // committed first; tell those apart for the caller.
                let mut rows = conn
                    .query(
                        "SELECT revision FROM documents
                         WHERE id = ?1 AND kind = ?2 AND active = 1",
                        libsql::params![id, kind.as_str()],
                    )
                    .await?;
                return match rows.next().await? {
                    Some(_) => Err(StoreError::Conflict {
                        id: id.to_string(),
                        expected: original.revision,
                    }),
                    None => Err(StoreError::NotFound {
                        kind: kind.as_str().to_string(),
                        id: id.to_string(),
                    }),
                };
            }

            Ok(Snapshot {
                doc: ctx.updated,
                revision: original.revision + 1,
                active: true,
            })
        })
    }
}

/// Logical removal: flip the active flag, keep the row for audit access.
pub struct RemoveDocument;

impl CommitStrategy for RemoveDocument {
    fn commit(&self, conn: libsql::Connection, ctx: UpdateContext) -> CommitFuture {
        Box::pin(async move {
            let now = ctx.event.ts.to_rfc3339();
            let id = ctx.event.entity_id.as_str();
            let kind = ctx.event.kind;

            let affected = conn
                .execute(
                    "UPDATE documents SET active = 0, updated_at = ?1
                     WHERE id = ?2 AND kind = ?3 AND active = 1",
                    libsql::params![now.as_str(), id, kind.as_str()],
                )
                .await?;
            if affected == 0 {
                return Err(StoreError::NotFound {
                    kind: kind.as_str().to_string(),
                    id: id.to_string(),
                });
            }

            Ok(Snapshot {
                doc: ctx.updated,
                revision: ctx.original.map_or(0, |s| s.revision),
                active: false,
            })
        })
    }
}

/// Submit the full commit pipeline for one mutation as one unit of work.
///
/// Ordering inside the worker: `before` strictly precedes the write, which
/// strictly precedes `after`. A veto means the strategy is never invoked.
pub(crate) fn run_commit<T>(
    executor: &WriteExecutor,
    bus: Arc<CommitBus>,
    strategy: Arc<dyn CommitStrategy>,
    ctx: UpdateContext,
    value: T,
    observed: ObservedTask<T>,
) -> WriteHandle<T>
where
    T: Send + 'static,
{
    executor.submit_observed(
        move |conn| {
            Box::pin(async move {
                let event = ctx.event.clone();
                bus.before(&event)?;
                strategy.commit(conn, ctx).await?;
                bus.after(&event);
                Ok(value)
            }) as TaskFuture<T>
        },
        observed,
    )
}

/// One-shot mutation builder bound to a commit strategy.
pub struct EditCommand<D: Document> {
    target_id: String,
    action: ActionKind,
    original: Option<Snapshot>,
    changes: ChangeSet,
    strategy: Arc<dyn CommitStrategy>,
    executor: Arc<WriteExecutor>,
    bus: Arc<CommitBus>,
    actor: Option<String>,
    observer: Option<Arc<dyn TaskObserver<Record<D>>>>,
    executed: AtomicBool,
    _kind: PhantomData<fn() -> D>,
}

impl<D: Document> std::fmt::Debug for EditCommand<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditCommand")
            .field("target_id", &self.target_id)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl<D: Document> EditCommand<D> {
    /// The id this command is bound to.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.target_id
    }

    /// The original snapshot the command was seeded with. Stays valid for
    /// diffing no matter what the command stages.
    #[must_use]
    pub const fn original(&self) -> Option<&Snapshot> {
        self.original.as_ref()
    }

    /// Stage `field = value`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.changes.set(field, value);
        self
    }

    /// Stage removal of `field`.
    pub fn remove(&mut self, field: impl Into<String>) -> &mut Self {
        self.changes.remove(field);
        self
    }

    /// Attach an observer for the eventual unit of work.
    pub fn observe(&mut self, observer: Arc<dyn TaskObserver<Record<D>>>) -> &mut Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }

    /// Commit the staged changes. Callable exactly once.
    ///
    /// Returns immediately; the write, listener callbacks, and any failure
    /// all flow through the returned future. A second call — including a
    /// concurrent one racing the first — resolves to `IllegalState` and
    /// never submits a second write.
    pub fn execute(&self) -> WriteHandle<Record<D>> {
        if self
            .executed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return WriteHandle::ready(Err(StoreError::IllegalState(
                "edit command already executed".to_string(),
            )));
        }

        let original_fields = match &self.original {
            None => None,
            Some(snapshot) => match snapshot.doc.as_object() {
                Some(fields) => Some(fields),
                None => {
                    return WriteHandle::ready(Err(StoreError::ExecutionFailed(format!(
                        "stored document for {} is not a JSON object",
                        self.target_id
                    ))));
                }
            },
        };

        let mut updated = self.changes.apply(original_fields);
        // The id was bound at command creation and is immutable thereafter,
        // whatever the change set staged.
        updated.insert("id".to_string(), Value::String(self.target_id.clone()));
        let updated = Value::Object(updated);

        let dto: D = match serde_json::from_value(updated.clone()) {
            Ok(dto) => dto,
            Err(e) => {
                return WriteHandle::ready(Err(StoreError::InvalidData(format!(
                    "staged fields do not form a valid {}: {e}",
                    D::KIND
                ))));
            }
        };
        let record = match Record::adapt(dto) {
            Ok(record) => record,
            Err(e) => return WriteHandle::ready(Err(e.into())),
        };

        tracing::debug!(
            kind = %D::KIND,
            id = %self.target_id,
            action = %self.action,
            "submitting edit command"
        );
        let event = UpdateEvent::new(
            self.action,
            D::KIND,
            self.target_id.clone(),
            self.actor.clone(),
        );
        let ctx = UpdateContext {
            event,
            original: self.original.clone(),
            updated,
        };

        run_commit(
            &self.executor,
            Arc::clone(&self.bus),
            Arc::clone(&self.strategy),
            ctx,
            record,
            ObservedTask::new(self.observer.clone()),
        )
    }
}

/// Builds edit commands bound to this repository's executor, bus, and actor.
pub struct EditCommandFactory<D: Document> {
    executor: Arc<WriteExecutor>,
    bus: Arc<CommitBus>,
    actor: Option<String>,
    _kind: PhantomData<fn() -> D>,
}

impl<D: Document> EditCommandFactory<D> {
    #[must_use]
    pub const fn new(
        executor: Arc<WriteExecutor>,
        bus: Arc<CommitBus>,
        actor: Option<String>,
    ) -> Self {
        Self {
            executor,
            bus,
            actor,
            _kind: PhantomData,
        }
    }

    /// A command for a record that does not exist yet.
    #[must_use]
    pub fn create(&self, id: String, strategy: Arc<dyn CommitStrategy>) -> EditCommand<D> {
        self.command(id, ActionKind::Create, None, strategy)
    }

    /// A command seeded with the current snapshot of an existing record.
    #[must_use]
    pub fn edit(
        &self,
        id: String,
        original: Snapshot,
        strategy: Arc<dyn CommitStrategy>,
    ) -> EditCommand<D> {
        self.command(id, ActionKind::Update, Some(original), strategy)
    }

    fn command(
        &self,
        target_id: String,
        action: ActionKind,
        original: Option<Snapshot>,
        strategy: Arc<dyn CommitStrategy>,
    ) -> EditCommand<D> {
        EditCommand {
            target_id,
            action,
            original,
            changes: ChangeSet::new(),
            strategy,
            executor: Arc::clone(&self.executor),
            bus: Arc::clone(&self.bus),
            actor: self.actor.clone(),
            observer: None,
            executed: AtomicBool::new(false),
            _kind: PhantomData,
        }
    }
}
