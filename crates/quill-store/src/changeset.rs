//! Staged field mutations.
//!
//! A `ChangeSet` accumulates named field operations without touching any
//! document. `apply` replays them onto a snapshot as a pure function: the
//! input is copied, never mutated, so the caller's original stays usable
//! for diffing and audit. Serialized change sets double as the partial
//! payload recorded for update commits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One staged mutation of one named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldOp {
    Set { field: String, value: Value },
    Remove { field: String },
}

/// Ordered list of staged field operations.
///
/// Operations replay in call order; the last write per field wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    ops: Vec<FieldOp>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `field = value`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.ops.push(FieldOp::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Stage removal of `field`.
    pub fn remove(&mut self, field: impl Into<String>) -> &mut Self {
        self.ops.push(FieldOp::Remove {
            field: field.into(),
        });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn ops(&self) -> &[FieldOp] {
        &self.ops
    }

    /// Replay the staged operations onto a snapshot.
    ///
    /// Pure and total: with no snapshot (creation) an empty document is
    /// synthesized and staged fields are layered on top; with a snapshot the
    /// fields are copied first, so the input is never mutated in place.
    #[must_use]
    pub fn apply(&self, snapshot: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut doc = snapshot.cloned().unwrap_or_default();
        for op in &self.ops {
            match op {
                FieldOp::Set { field, value } => {
                    doc.insert(field.clone(), value.clone());
                }
                FieldOp::Remove { field } => {
                    doc.remove(field);
                }
            }
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn snapshot() -> Map<String, Value> {
        let Value::Object(map) = json!({
            "id": "wrk-0000000000000000",
            "title": "Original",
            "publisher": "Old House",
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn apply_never_mutates_the_input() {
        let original = snapshot();
        let before = original.clone();

        let mut changes = ChangeSet::new();
        changes
            .set("title", "Changed")
            .remove("publisher")
            .set("publication_year", 1859);
        let _updated = changes.apply(Some(&original));

        assert_eq!(original, before, "input snapshot must be untouched");
    }

    #[test]
    fn empty_changeset_is_identity() {
        let original = snapshot();
        let updated = ChangeSet::new().apply(Some(&original));
        assert_eq!(updated, original);
    }

    #[test]
    fn apply_twice_is_idempotent() {
        let mut changes = ChangeSet::new();
        changes.set("title", "Changed").remove("publisher");

        let once = changes.apply(Some(&snapshot()));
        let twice = changes.apply(Some(&once));
        assert_eq!(twice, once);
    }

    #[test]
    fn apply_without_snapshot_synthesizes_empty_document() {
        let mut changes = ChangeSet::new();
        changes.set("title", "Fresh");

        let doc = changes.apply(None);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["title"], json!("Fresh"));
    }

    #[rstest]
    #[case(&[("title", "A"), ("title", "B")], "B")]
    #[case(&[("title", "A"), ("title", "B"), ("title", "C")], "C")]
    fn last_write_per_field_wins(#[case] writes: &[(&str, &str)], #[case] expected: &str) {
        let mut changes = ChangeSet::new();
        for (field, value) in writes {
            changes.set(*field, *value);
        }
        let doc = changes.apply(None);
        assert_eq!(doc["title"], json!(expected));
    }

    #[test]
    fn set_after_remove_reinstates_the_field() {
        let mut changes = ChangeSet::new();
        changes.remove("title").set("title", "Back");

        let doc = changes.apply(Some(&snapshot()));
        assert_eq!(doc["title"], json!("Back"));
    }

    #[test]
    fn remove_after_set_drops_the_field() {
        let mut changes = ChangeSet::new();
        changes.set("title", "Gone soon").remove("title");

        let doc = changes.apply(Some(&snapshot()));
        assert!(!doc.contains_key("title"));
    }

    #[test]
    fn serializes_as_tagged_op_list() {
        let mut changes = ChangeSet::new();
        changes.set("title", "Foo").remove("publisher");

        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(
            json,
            json!([
                {"op": "set", "field": "title", "value": "Foo"},
                {"op": "remove", "field": "publisher"},
            ])
        );
    }
}
