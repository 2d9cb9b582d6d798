use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::EntityKind;
use crate::errors::CoreError;

/// A curatorial note, optionally attached to another catalog entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Id of the entity this note annotates, if any.
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document for Note {
    const KIND: EntityKind = EntityKind::Note;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self.body.as_deref() {
            Some(b) if !b.trim().is_empty() => Ok(()),
            _ => Err(CoreError::Validation(
                "note requires a non-empty body".to_string(),
            )),
        }
    }
}
