//! Cross-cutting error types for Quill.
//!
//! This module defines errors that can originate from any crate in the
//! system. Engine-specific errors (`StoreError`, `ConfigError`) are defined
//! in their respective crates.

use thiserror::Error;

/// Errors that can be raised by any Quill crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no active record.
    #[error("Entity not found: {kind} {id}")]
    NotFound { kind: String, id: String },

    /// Data failed entity-specific validation (adapter rejected the DTO).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
