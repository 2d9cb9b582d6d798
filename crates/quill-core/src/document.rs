//! The storage-facing document contract and the immutable record view.
//!
//! A `Document` is the serializable shape stored in the JSON column: one
//! impl per entity kind, all fields beyond the id optional so a freshly
//! synthesized (empty) document is valid JSON. A `Record` is the
//! application-facing view: built from a document by the adapter, which
//! runs entity-specific validation, and never mutated afterwards.

use std::ops::Deref;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::enums::EntityKind;
use crate::errors::CoreError;

/// Storage contract for one entity kind.
///
/// Implementors are plain serde structs whose `id` field is assigned by the
/// engine exactly once; every other field must tolerate absence via
/// `#[serde(default)]` so a change set applied to no snapshot deserializes
/// cleanly.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The entity kind this document stores.
    const KIND: EntityKind;

    /// The entity's id. Assigned once, immutable thereafter.
    fn id(&self) -> &str;

    /// Entity-specific semantic validation, run by the record adapter.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violated rule.
    fn validate(&self) -> Result<(), CoreError>;
}

/// Immutable application-facing view of a stored entity.
///
/// Read access goes through `Deref`; there is no mutable access. Mutation
/// happens exclusively through edit commands, which produce a fresh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<D: Document> {
    doc: D,
}

impl<D: Document> Record<D> {
    /// Adapt a document into a record, running validation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the document fails its
    /// entity-specific rules.
    pub fn adapt(doc: D) -> Result<Self, CoreError> {
        doc.validate()?;
        Ok(Self { doc })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.doc.id()
    }

    /// Consume the record, yielding the underlying document (e.g. for
    /// serialization). The record itself is gone afterwards, so the
    /// immutability of the view is preserved.
    #[must_use]
    pub fn into_inner(self) -> D {
        self.doc
    }
}

impl<D: Document> Deref for Record<D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        &self.doc
    }
}
