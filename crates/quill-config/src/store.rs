//! Engine/store configuration.

use serde::{Deserialize, Serialize};

/// Default bound for the write executor's worker pool.
const fn default_workers() -> usize {
    4
}

fn default_path() -> String {
    ".quill/catalog.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the libSQL database file, or `":memory:"`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum number of concurrently executing write tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory for JSONL commit journal files. Empty disables the journal.
    #[serde(default)]
    pub journal_dir: String,

    /// Actor label stamped into commit events. Empty means unattributed.
    #[serde(default)]
    pub actor: String,
}

impl StoreConfig {
    /// Actor as an option, mapping the empty string to `None`.
    #[must_use]
    pub fn actor(&self) -> Option<String> {
        if self.actor.is_empty() {
            None
        } else {
            Some(self.actor.clone())
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            workers: default_workers(),
            journal_dir: String::new(),
            actor: String::new(),
        }
    }
}
