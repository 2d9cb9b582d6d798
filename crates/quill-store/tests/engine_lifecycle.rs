//! End-to-end lifecycle tests against the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use quill_core::entities::{Person, Work};
use quill_core::event::UpdateEvent;
use quill_store::QuillStore;
use quill_store::bus::{CommitBus, CommitListener};
use quill_store::error::StoreError;
use quill_store::executor::WriteExecutor;
use quill_store::observer::TaskObserver;
use quill_store::repository::DocumentRepository;

async fn in_memory_repo<D: quill_core::document::Document>() -> DocumentRepository<D> {
    let store = Arc::new(QuillStore::open_local(":memory:").await.unwrap());
    let executor = Arc::new(WriteExecutor::new(store.conn().clone(), 4));
    let bus = Arc::new(CommitBus::new());
    DocumentRepository::new(store, executor, bus, None)
}

#[tokio::test]
async fn create_edit_remove_lifecycle() {
    let repo = in_memory_repo::<Work>().await;

    // Create with title "Foo": fresh non-null id, title round-trips.
    let mut create = repo.create().unwrap();
    create.set("title", "Foo");
    let created = create.execute().await.unwrap();
    assert!(!created.id().is_empty());
    assert!(created.id().starts_with("wrk-"));
    assert_eq!(created.title.as_deref(), Some("Foo"));

    // Edit to "Bar": same id, new title.
    let mut edit = repo.edit(created.id()).await.unwrap();
    edit.set("title", "Bar");
    let updated = edit.execute().await.unwrap();
    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.title.as_deref(), Some("Bar"));

    // Remove, then get fails NotFound.
    repo.remove(created.id()).await.unwrap();
    let err = repo.get(created.id()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn concurrent_creates_with_distinct_ids_both_succeed() {
    let repo = Arc::new(in_memory_repo::<Person>().await);

    let repo_a = Arc::clone(&repo);
    let a = tokio::spawn(async move {
        let mut command = repo_a.create_with_id("prs-000000000000000a");
        command.set("display_name", "Ada Lovelace");
        command.execute().await
    });
    let repo_b = Arc::clone(&repo);
    let b = tokio::spawn(async move {
        let mut command = repo_b.create_with_id("prs-000000000000000b");
        command.set("display_name", "Charles Babbage");
        command.execute().await
    });

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let ada = repo.get("prs-000000000000000a").await.unwrap();
    let charles = repo.get("prs-000000000000000b").await.unwrap();
    assert_eq!(ada.display_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(charles.display_name.as_deref(), Some("Charles Babbage"));
}

#[derive(Default)]
struct TerminalCounter {
    finished: AtomicU32,
    failed: AtomicU32,
    aborted: AtomicU32,
}

impl TaskObserver<quill_core::document::Record<Work>> for TerminalCounter {
    fn finished(&self, _result: &quill_core::document::Record<Work>) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
    fn failed(&self, _message: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn aborted(&self) {
        self.aborted.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn failing_write_fires_observer_error_exactly_once() {
    let repo = in_memory_repo::<Work>().await;

    let mut first = repo.create_with_id("wrk-00000000000000aa");
    first.set("title", "Original");
    first.execute().await.unwrap();

    // Same explicit id again: the write itself fails.
    let counter = Arc::new(TerminalCounter::default());
    let mut duplicate = repo.create_with_id("wrk-00000000000000aa");
    duplicate.set("title", "Duplicate");
    duplicate.observe(counter.clone());

    let err = duplicate.execute().await.unwrap_err();
    assert!(matches!(err, StoreError::ExecutionFailed(_)));
    assert_eq!(counter.failed.load(Ordering::SeqCst), 1);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 0);
    assert_eq!(counter.aborted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_write_fires_observer_finish() {
    let repo = in_memory_repo::<Work>().await;

    let counter = Arc::new(TerminalCounter::default());
    let mut command = repo.create().unwrap();
    command.set("title", "Observed");
    command.observe(counter.clone());

    command.execute().await.unwrap();
    assert_eq!(counter.finished.load(Ordering::SeqCst), 1);
    assert_eq!(counter.failed.load(Ordering::SeqCst), 0);
}

struct AfterCounter {
    calls: AtomicU32,
}

impl CommitListener for AfterCounter {
    fn after_commit(&self, _event: &UpdateEvent) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn every_successful_mutation_notifies_after_listeners() {
    let repo = in_memory_repo::<Work>().await;
    let counter = Arc::new(AfterCounter {
        calls: AtomicU32::new(0),
    });
    let _registration = repo.register(counter.clone());

    let mut create = repo.create().unwrap();
    create.set("title", "Counted");
    let record = create.execute().await.unwrap();

    let mut edit = repo.edit(record.id()).await.unwrap();
    edit.set("title", "Counted again");
    edit.execute().await.unwrap();

    repo.remove(record.id()).await.unwrap();

    assert_eq!(counter.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn journal_records_commits_when_configured() {
    let journal_dir = tempfile::tempdir().unwrap();
    let config = quill_config::StoreConfig {
        path: ":memory:".to_string(),
        workers: 2,
        journal_dir: journal_dir.path().to_string_lossy().into_owned(),
        actor: "curator@example.org".to_string(),
    };

    let repo = DocumentRepository::<Work>::open(&config).await.unwrap();
    let mut create = repo.create().unwrap();
    create.set("title", "Journaled");
    let record = create.execute().await.unwrap();
    repo.remove(record.id()).await.unwrap();

    let path = journal_dir.path().join("work.jsonl");
    let events: Vec<UpdateEvent> = serde_jsonlines::json_lines(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, quill_core::enums::ActionKind::Create);
    assert_eq!(events[1].action, quill_core::enums::ActionKind::Delete);
    assert_eq!(events[0].actor.as_deref(), Some("curator@example.org"));
    assert_eq!(events[0].entity_id, record.id());
}

#[tokio::test]
async fn shutdown_rejects_new_writes_with_illegal_state() {
    let repo = in_memory_repo::<Work>().await;
    repo.shutdown();

    let mut command = repo.create().unwrap();
    command.set("title", "Too late");
    let err = command.execute().await.unwrap_err();
    assert!(matches!(err, StoreError::IllegalState(_)));
}
