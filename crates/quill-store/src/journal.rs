//! JSONL commit journal.
//!
//! Appends every durable commit's `UpdateEvent` to per-kind
//! `{journal_dir}/{kind}.jsonl` files. External consumers (indexers,
//! resolvers) that were offline can catch up by replaying the journal.
//! Uses `serde_jsonlines::append_json_lines` for atomic per-line appends.

use std::path::{Path, PathBuf};

use quill_core::event::UpdateEvent;

use crate::bus::CommitListener;
use crate::error::StoreError;

/// Appends commit events to per-kind JSONL files.
pub struct JournalWriter {
    journal_dir: PathBuf,
    enabled: bool,
}

impl JournalWriter {
    /// Create a new `JournalWriter` pointing at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created.
    pub fn new(journal_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&journal_dir).map_err(|e| StoreError::Other(e.into()))?;
        Ok(Self {
            journal_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer (for tests or when no journal is wanted).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            journal_dir: PathBuf::new(),
            enabled: false,
        }
    }

    /// Whether journal writing is currently enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append one event to its kind's JSONL file.
    ///
    /// File path: `{journal_dir}/{event.kind}.jsonl`
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file write fails.
    pub fn append(&self, event: &UpdateEvent) -> Result<(), StoreError> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.journal_dir.join(format!("{}.jsonl", event.kind));
        serde_jsonlines::append_json_lines(&path, [event])
            .map_err(|e| StoreError::Other(e.into()))?;
        Ok(())
    }

    /// The directory where journal files are stored.
    #[must_use]
    pub fn journal_dir(&self) -> &Path {
        &self.journal_dir
    }
}

/// Adapts the journal to the commit bus: never vetoes, appends after every
/// durable write. Append failures surface to the bus, which logs and
/// swallows them like any other after-phase failure.
pub struct JournalListener {
    writer: JournalWriter,
}

impl JournalListener {
    #[must_use]
    pub const fn new(writer: JournalWriter) -> Self {
        Self { writer }
    }
}

impl CommitListener for JournalListener {
    fn after_commit(&self, event: &UpdateEvent) -> anyhow::Result<()> {
        self.writer.append(event).map_err(anyhow::Error::from)
    }
}
