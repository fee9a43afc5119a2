//! The note entity.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::NoteId;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, time-derived at creation and never reassigned
    pub id: NoteId,
    /// Note content, never empty
    pub text: String,
    /// Last content mutation (creation or edit)
    pub date: DateTime<Utc>,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    /// Locked notes are hidden from the primary listing
    #[serde(default)]
    pub locked: bool,
}

impl Note {
    /// Creates a new unlocked note dated now
    pub fn new(id: NoteId, text: String, tags: Vec<String>) -> Self {
        Note {
            id,
            text,
            date: Utc::now(),
            tags,
            locked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_default() {
        let raw = r#"{"id":7,"text":"hello","date":"2024-05-01T10:00:00Z"}"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.id, 7);
        assert!(note.tags.is_empty());
        assert!(!note.locked);
    }

    #[test]
    fn persisted_field_names() {
        let note = Note::new(1, "x".to_string(), vec!["a".to_string()]);
        let value = serde_json::to_value(&note).unwrap();
        for field in ["id", "text", "date", "tags", "locked"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
