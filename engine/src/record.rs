//! Record types for storing data.

use crate::Key;
use serde::{Deserialize, Serialize};

/// A single roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, fixed once the record is created
    pub key: Key,
    /// Display name
    pub name: String,
    /// Classification label
    pub group: String,
    /// Expected to lie in [0, 100]; only imports may enforce that
    pub score: f64,
}

impl Record {
    /// Create a new record.
    pub fn new(key: Key, name: impl Into<String>, group: impl Into<String>, score: f64) -> Self {
        Self {
            key,
            name: name.into(),
            group: group.into(),
            score,
        }
    }

    /// Overwrite the fields the patch supplies, leaving the others alone.
    pub fn apply_patch(&mut self, patch: RecordPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(group) = patch.group {
            self.group = group;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
    }

    /// Replace everything but the key with the contents of `other`.
    pub(crate) fn overwrite_from(&mut self, other: Record) {
        self.name = other.name;
        self.group = other.group;
        self.score = other.score;
    }
}

/// A partial update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub group: Option<String>,
    pub score: Option<f64>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.group.is_none() && self.score.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_record() {
        let record = Record::new(10, "Dev Patel", "9-A", 82.0);

        assert_eq!(record.key, 10);
        assert_eq!(record.name, "Dev Patel");
        assert_eq!(record.group, "9-A");
        assert_eq!(record.score, 82.0);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut record = Record::new(5, "Name", "Class", 50.0);
        record.apply_patch(RecordPatch::new().with_score(97.5));

        assert_eq!(record.name, "Name");
        assert_eq!(record.group, "Class");
        assert_eq!(record.score, 97.5);

        record.apply_patch(RecordPatch::new().with_name("New Name").with_group("11-C"));
        assert_eq!(record.name, "New Name");
        assert_eq!(record.group, "11-C");
        assert_eq!(record.score, 97.5);
        assert_eq!(record.key, 5);
    }

    #[test]
    fn empty_patch() {
        assert!(RecordPatch::new().is_empty());
        assert!(!RecordPatch::new().with_group("X").is_empty());
    }

    #[test]
    fn json_field_names() {
        let record = Record::new(1, "Alice", "10-A", 88.5);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"key": 1, "name": "Alice", "group": "10-A", "score": 88.5})
        );
    }
}
