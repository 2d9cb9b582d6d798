use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::EntityKind;
use crate::errors::CoreError;

/// A catalogued scholarly work: monograph, dataset, collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Work {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Ids of the people credited as creators, in citation order.
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl Document for Work {
    const KIND: EntityKind = EntityKind::Work;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => Ok(()),
            _ => Err(CoreError::Validation(
                "work requires a non-empty title".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Record;

    #[test]
    fn work_without_title_is_rejected() {
        let work = Work {
            id: "wrk-0000000000000000".to_string(),
            ..Work::default()
        };
        assert!(matches!(
            Record::adapt(work),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn blank_title_is_rejected() {
        let work = Work {
            id: "wrk-0000000000000000".to_string(),
            title: Some("   ".to_string()),
            ..Work::default()
        };
        assert!(Record::adapt(work).is_err());
    }

    #[test]
    fn valid_work_adapts() {
        let work = Work {
            id: "wrk-0000000000000000".to_string(),
            title: Some("On the Origin of Species".to_string()),
            publication_year: Some(1859),
            ..Work::default()
        };
        let record = Record::adapt(work).unwrap();
        assert_eq!(record.title.as_deref(), Some("On the Origin of Species"));
    }
}
