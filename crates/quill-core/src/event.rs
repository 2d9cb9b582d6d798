//! The commit event envelope.
//!
//! Every durable mutation produces one `UpdateEvent`, delivered to commit
//! listeners before the write (vetoable) and again after it succeeds.
//! External observers such as search indexers and identifier resolvers
//! consume these events to stay in step with the catalog.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ActionKind, EntityKind};

/// Immutable description of one committed create/update/delete.
///
/// Events carry no document payload. Listeners that need the new state
/// re-read it by id, which keeps the envelope stable as entity schemas
/// evolve.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UpdateEvent {
    /// What the mutation did.
    pub action: ActionKind,

    /// Which entity kind was affected.
    pub kind: EntityKind,

    /// Id of the affected entity.
    pub entity_id: String,

    /// Who performed the mutation. `None` for unattributed background work.
    pub actor: Option<String>,

    /// When the mutation was staged for commit.
    pub ts: DateTime<Utc>,
}

impl UpdateEvent {
    /// Build an event stamped with the current time.
    #[must_use]
    pub fn new(
        action: ActionKind,
        kind: EntityKind,
        entity_id: impl Into<String>,
        actor: Option<String>,
    ) -> Self {
        Self {
            action,
            kind,
            entity_id: entity_id.into(),
            actor,
            ts: Utc::now(),
        }
    }
}
