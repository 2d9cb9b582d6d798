use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::EntityKind;
use crate::errors::CoreError;

/// A published article, optionally contained in a work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Id of the containing work (journal issue, proceedings volume).
    #[serde(default)]
    pub work_id: Option<String>,
    /// Ids of the people credited as authors, in byline order.
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
}

impl Document for Article {
    const KIND: EntityKind = EntityKind::Article;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation(
                "article requires a non-empty title".to_string(),
            ));
        }
        if let Some(doi) = self.doi.as_deref() {
            if !doi.starts_with("10.") {
                return Err(CoreError::Validation(format!(
                    "'{doi}' is not a DOI (must start with '10.')"
                )));
            }
        }
        Ok(())
    }
}
