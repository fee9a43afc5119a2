use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{error, trace, warn};
use serde_json::{Map, Value};

use crate::{Collection, Note, NoteError, NoteId, Result};

/// Decodes a collection record. An absent or null record is an empty collection.
///
/// A record that is not a list fails as a whole. Individual entries are
/// decoded one by one: an entry without an `id` but with a parsable `date`
/// (as written by quick-capture clients) is given an id derived from that
/// date, and any other undecodable entry is skipped with a warning. Skipped
/// entries are gone once the collection is written back.
pub fn decode_collection(value: Option<&Value>, collection: Collection) -> Result<Vec<Note>> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        trace!("{} record absent, treating as empty", collection);
        return Ok(Vec::new());
    };

    let entries: Vec<Value> = serde_json::from_value(value.clone()).map_err(|e| {
        error!("Failed to decode {} record: {}", collection, e);
        NoteError::Serialization(e)
    })?;

    let mut taken: HashSet<NoteId> = entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_i64))
        .collect();

    let mut notes = Vec::with_capacity(entries.len());
    for (index, mut entry) in entries.into_iter().enumerate() {
        if let Value::Object(fields) = &mut entry {
            if !fields.contains_key("id") {
                if let Some(id) = id_from_date(fields, &taken) {
                    warn!(
                        "Entry {} of {} has no id, assigning {} from its date",
                        index, collection, id
                    );
                    taken.insert(id);
                    fields.insert("id".to_string(), Value::from(id));
                }
            }
        }

        match serde_json::from_value::<Note>(entry) {
            Ok(note) => notes.push(note),
            Err(e) => warn!("Skipping entry {} of {}: {}", index, collection, e),
        }
    }

    trace!("Decoded {} notes from {}", notes.len(), collection);
    Ok(notes)
}

/// Millisecond timestamp of the entry's `date`, bumped past any id already taken.
fn id_from_date(fields: &Map<String, Value>, taken: &HashSet<NoteId>) -> Option<NoteId> {
    let date = fields.get("date")?.as_str()?;
    let mut id = date.parse::<DateTime<Utc>>().ok()?.timestamp_millis();
    while taken.contains(&id) {
        id += 1;
    }
    Some(id)
}

/// Encodes a collection so it can be written back in one `set` call.
pub fn encode_collection(notes: &[Note]) -> Result<Value> {
    serde_json::to_value(notes).map_err(|e| {
        error!("Failed to encode notes: {}", e);
        NoteError::Serialization(e)
    })
}

/// Sorts by `date` descending. The sort is stable so equal dates keep storage order.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Case-insensitive substring match on the note text. An empty query matches everything.
pub fn text_matches(note: &Note, query: &str) -> bool {
    query.is_empty() || note.text.to_lowercase().contains(&query.to_lowercase())
}

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
