//! Engine error types for quill-store.

use quill_core::errors::CoreError;
use thiserror::Error;

/// Errors from persistence engine operations.
///
/// The engine never retries: every failure surfaces exactly once, through
/// the future returned by the mutating call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No active record for the id (absent or logically removed).
    #[error("Entity not found: {kind} {id}")]
    NotFound { kind: String, id: String },

    /// Staged data failed deserialization or entity-specific validation.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A concurrent edit moved the record past the command's original
    /// snapshot; the stale write was rejected.
    #[error("Stale edit rejected for {id}: revision {expected} has moved")]
    Conflict { id: String, expected: i64 },

    /// Infrastructure failure during the write. Non-recoverable.
    #[error("Write execution failed: {0}")]
    ExecutionFailed(String),

    /// A before-commit listener vetoed the operation. No write was attempted.
    #[error("Commit canceled: {0}")]
    Canceled(String),

    /// Double execute, or the executor has no connection to hand out.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            CoreError::Validation(msg) => Self::InvalidData(msg),
            CoreError::Other(e) => Self::Other(e),
        }
    }
}
