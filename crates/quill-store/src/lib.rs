//! # quill-store
//!
//! The JSON-document persistence engine for the Quill catalog.
//!
//! Every catalog entity (work, person, relation, article, note) lives as one
//! row in a single `documents` table with one JSON document column. All
//! mutation is mediated by one-shot edit commands: a command stages a change
//! set, and `execute()` submits exactly one unit of work to a bounded async
//! executor. Around each durable write, commit listeners are notified twice:
//! `before` (vetoable — the only cancellation point) and `after` (best
//! effort, failures swallowed).
//!
//! Uses the `libsql` crate (C `SQLite` fork) for embedded storage.

pub mod bus;
pub mod changeset;
pub mod command;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod journal;
mod migrations;
pub mod observer;
pub mod repository;
mod test_support;

use chrono::{DateTime, Utc};
use libsql::Builder;
use quill_core::enums::EntityKind;

use error::StoreError;
use helpers::parse_datetime;

/// A stored document as read from (or about to be written to) storage:
/// the JSON document plus its engine bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The JSON document column, parsed.
    pub doc: serde_json::Value,
    /// Optimistic-concurrency token; starts at 1, bumped on every update.
    pub revision: i64,
    /// False once the record has been logically removed.
    pub active: bool,
}

/// Audit-level view of a row, including rows `get` no longer sees.
#[derive(Debug, Clone)]
pub struct AuditRow {
    pub snapshot: Snapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Central storage handle for the catalog's document rows.
///
/// Wraps a libSQL database and connection. Repositories and commit
/// strategies go through this handle; nothing above it sees SQL.
pub struct QuillStore {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl QuillStore {
    /// Open a local-only database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrations
    /// fail.
    pub async fn open_local(path: &str) -> Result<Self, StoreError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Read one document row by kind and id.
    ///
    /// With `include_removed` false, logically removed rows read as absent —
    /// this is the lookup behind `get`/`edit`. Audit paths pass true.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or the stored JSON is corrupt.
    pub async fn fetch_snapshot(
        &self,
        kind: EntityKind,
        id: &str,
        include_removed: bool,
    ) -> Result<Option<Snapshot>, StoreError> {
        let sql = if include_removed {
            "SELECT doc, revision, active FROM documents WHERE id = ?1 AND kind = ?2"
        } else {
            "SELECT doc, revision, active FROM documents WHERE id = ?1 AND kind = ?2 AND active = 1"
        };
        let mut rows = self.conn.query(sql, libsql::params![id, kind.as_str()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_snapshot(&row, id)?)),
            None => Ok(None),
        }
    }

    /// Read one row with its bookkeeping timestamps, regardless of the
    /// active flag. Lower-level audit access; `get` never goes through here.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or a column cannot be parsed.
    pub async fn fetch_audit_row(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<AuditRow>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT doc, revision, active, created_at, updated_at
                 FROM documents WHERE id = ?1 AND kind = ?2",
                libsql::params![id, kind.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(AuditRow {
                snapshot: Self::row_to_snapshot(&row, id)?,
                created_at: parse_datetime(&row.get::<String>(3)?)?,
                updated_at: parse_datetime(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    /// List the most recently touched active documents of one kind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or stored JSON is corrupt.
    pub async fn list_snapshots(
        &self,
        kind: EntityKind,
        limit: u32,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT doc, revision, active, id FROM documents
                 WHERE kind = ?1 AND active = 1
                 ORDER BY updated_at DESC, id DESC LIMIT ?2",
                libsql::params![kind.as_str(), i64::from(limit)],
            )
            .await?;

        let mut snapshots = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(3)?;
            snapshots.push(Self::row_to_snapshot(&row, &id)?);
        }
        Ok(snapshots)
    }

    fn row_to_snapshot(row: &libsql::Row, id: &str) -> Result<Snapshot, StoreError> {
        let doc_text: String = row.get(0)?;
        let doc = serde_json::from_str(&doc_text).map_err(|e| {
            StoreError::ExecutionFailed(format!("corrupt document column for {id}: {e}"))
        })?;
        Ok(Snapshot {
            doc,
            revision: row.get(1)?,
            active: row.get::<i64>(2)? != 0,
        })
    }
}
