//! Entity kinds and mutation actions for Quill.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The kinds of catalog entities the engine stores.
///
/// Each kind maps to one id prefix and one logical namespace inside the
/// shared `documents` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Work,
    Person,
    Relation,
    Article,
    Note,
}

impl EntityKind {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Person => "person",
            Self::Relation => "relation",
            Self::Article => "article",
            Self::Note => "note",
        }
    }

    /// The id prefix for this kind, e.g. `"wrk"` for works.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Work => ids::PREFIX_WORK,
            Self::Person => ids::PREFIX_PERSON,
            Self::Relation => ids::PREFIX_RELATION,
            Self::Article => ids::PREFIX_ARTICLE,
            Self::Note => ids::PREFIX_NOTE,
        }
    }

    /// All kinds, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Work,
            Self::Person,
            Self::Relation,
            Self::Article,
            Self::Note,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// What a committed mutation did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
