use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::EntityKind;
use crate::errors::CoreError;

/// A typed, directed link between two catalog entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Relation {
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    /// Relation label, e.g. `"authored"`, `"cites"`, `"translation_of"`.
    #[serde(default)]
    pub relation: Option<String>,
}

impl Document for Relation {
    const KIND: EntityKind = EntityKind::Relation;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), CoreError> {
        let source = self
            .source_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CoreError::Validation("relation requires a source_id".to_string())
            })?;
        let target = self
            .target_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CoreError::Validation("relation requires a target_id".to_string())
            })?;
        if source == target {
            return Err(CoreError::Validation(
                "relation endpoints must be distinct".to_string(),
            ));
        }
        if self.relation.as_deref().is_none_or(str::is_empty) {
            return Err(CoreError::Validation(
                "relation requires a label".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(source: &str, target: &str, label: &str) -> Relation {
        Relation {
            id: "rel-0000000000000000".to_string(),
            source_id: Some(source.to_string()),
            target_id: Some(target.to_string()),
            relation: Some(label.to_string()),
        }
    }

    #[test]
    fn self_relation_is_rejected() {
        let rel = relation("wrk-1", "wrk-1", "cites");
        assert!(matches!(rel.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn complete_relation_validates() {
        let rel = relation("prs-1", "wrk-1", "authored");
        assert!(rel.validate().is_ok());
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let rel = Relation {
            id: "rel-0000000000000000".to_string(),
            source_id: Some("prs-1".to_string()),
            ..Relation::default()
        };
        assert!(rel.validate().is_err());
    }
}
