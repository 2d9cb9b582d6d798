use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::enums::EntityKind;
use crate::errors::CoreError;

/// A person: author, editor, contributor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    /// ORCID iD in its dashed 19-character form, e.g. `0000-0002-1825-0097`.
    #[serde(default)]
    pub orcid: Option<String>,
}

impl Document for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self
            .display_name
            .as_deref()
            .is_none_or(|n| n.trim().is_empty())
        {
            return Err(CoreError::Validation(
                "person requires a non-empty display_name".to_string(),
            ));
        }
        if let Some(orcid) = self.orcid.as_deref() {
            if !is_orcid_shaped(orcid) {
                return Err(CoreError::Validation(format!(
                    "'{orcid}' is not a dashed 19-character ORCID iD"
                )));
            }
        }
        Ok(())
    }
}

/// Structural check only; checksum verification belongs to the resolver.
fn is_orcid_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 9 | 14 => *b == b'-',
            // the last position may carry the X check digit
            18 => b.is_ascii_digit() || *b == b'X',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orcid_shapes() {
        assert!(is_orcid_shaped("0000-0002-1825-0097"));
        assert!(is_orcid_shaped("0000-0002-1694-233X"));
        assert!(!is_orcid_shaped("0000-0002-1825-009"));
        assert!(!is_orcid_shaped("0000000218250097"));
        assert!(!is_orcid_shaped("0000-0002-1825-00X7"));
    }

    #[test]
    fn person_with_bad_orcid_is_rejected() {
        let person = Person {
            id: "prs-0000000000000000".to_string(),
            display_name: Some("Ada Lovelace".to_string()),
            orcid: Some("not-an-orcid".to_string()),
            ..Person::default()
        };
        assert!(person.validate().is_err());
    }
}
