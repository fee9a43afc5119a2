//! CRUD and queries over the `notes` and `deletedNotes` collections.
//!
//! Every mutating call performs one read of the records it needs, computes
//! the complete new collection values and writes them back in a single `set`.
//! Nothing here serializes concurrent callers; see `Lifecycle` for that.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use chrono::Utc;
use log::{debug, error, info, trace};

use crate::{
    decode_collection, encode_collection, sort_newest_first, text_matches, Collection, Note,
    NoteCounts, NoteError, NoteId, Result, StorageAdapter, DELETED_NOTES_KEY, NOTES_KEY,
};

/// Hands out time-derived ids that strictly increase within a process.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `max(now_ms, last + 1)`
    pub fn next_id(&self) -> NoteId {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Rejects empty or whitespace-only text and returns it trimmed.
fn validated_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NoteError::validation("note text must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn not_found(id: NoteId, collection: Collection) -> NoteError {
    debug!("Note {} not found in {}", id, collection);
    NoteError::NotFound { id, collection }
}

/// Note repository over a shared storage adapter.
pub struct NoteRepository<S> {
    store: Arc<S>,
    ids: IdGenerator,
}

impl<S: StorageAdapter> NoteRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ids: IdGenerator::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn load(&self, collection: Collection) -> Result<Vec<Note>> {
        let key = collection.key();
        let records = self.store.get(&[key]).await.map_err(|e| {
            error!("Failed to read {}: {}", key, e);
            e
        })?;
        decode_collection(records.get(key), collection)
    }

    /// Reads both collections in one storage call.
    async fn load_both(&self) -> Result<(Vec<Note>, Vec<Note>)> {
        let records = self
            .store
            .get(&[NOTES_KEY, DELETED_NOTES_KEY])
            .await
            .map_err(|e| {
                error!("Failed to read note collections: {}", e);
                e
            })?;
        let notes = decode_collection(records.get(NOTES_KEY), Collection::Notes)?;
        let deleted = decode_collection(records.get(DELETED_NOTES_KEY), Collection::Deleted)?;
        Ok((notes, deleted))
    }

    /// Writes every staged collection in one storage call.
    async fn write(&self, staged: &[(Collection, &[Note])]) -> Result<()> {
        let mut items = HashMap::with_capacity(staged.len());
        for (collection, notes) in staged {
            items.insert(collection.key().to_string(), encode_collection(notes)?);
        }
        trace!("Writing {} record(s)", items.len());
        self.store.set(items).await.map_err(|e| {
            error!("Failed to write note collections: {}", e);
            e
        })
    }

    /// Unlocked notes, newest first, optionally filtered by a case-insensitive text query.
    pub async fn list_active(&self, query: Option<&str>) -> Result<Vec<Note>> {
        let query = query.unwrap_or("");
        let mut notes: Vec<Note> = self
            .load(Collection::Notes)
            .await?
            .into_iter()
            .filter(|n| !n.locked && text_matches(n, query))
            .collect();
        sort_newest_first(&mut notes);
        debug!("Listing {} active notes", notes.len());
        Ok(notes)
    }

    /// Locked notes, newest first.
    pub async fn list_locked(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .load(Collection::Notes)
            .await?
            .into_iter()
            .filter(|n| n.locked)
            .collect();
        sort_newest_first(&mut notes);
        debug!("Listing {} locked notes", notes.len());
        Ok(notes)
    }

    /// Everything in the trash regardless of its locked flag, newest first.
    pub async fn list_deleted(&self) -> Result<Vec<Note>> {
        let mut notes = self.load(Collection::Deleted).await?;
        sort_newest_first(&mut notes);
        debug!("Listing {} deleted notes", notes.len());
        Ok(notes)
    }

    /// A single unlocked note. Locked and deleted notes are reported as not found.
    pub async fn get_active(&self, id: NoteId) -> Result<Note> {
        self.load(Collection::Notes)
            .await?
            .into_iter()
            .find(|n| n.id == id && !n.locked)
            .ok_or_else(|| not_found(id, Collection::Notes))
    }

    pub async fn counts(&self) -> Result<NoteCounts> {
        let (notes, deleted) = self.load_both().await?;
        let locked = notes.iter().filter(|n| n.locked).count();
        Ok(NoteCounts {
            active: notes.len() - locked,
            locked,
            deleted: deleted.len(),
        })
    }

    pub async fn create(&self, text: &str, tags: Vec<String>) -> Result<Note> {
        let text = validated_text(text)?;
        let (mut notes, deleted) = self.load_both().await?;

        let mut id = self.ids.next_id();
        while notes.iter().chain(deleted.iter()).any(|n| n.id == id) {
            debug!("Id {} already taken, drawing another", id);
            id = self.ids.next_id();
        }

        let note = Note::new(id, text, tags);
        notes.push(note.clone());
        self.write(&[(Collection::Notes, notes.as_slice())]).await?;

        info!("Created note {}", note.id);
        Ok(note)
    }

    /// Replaces the text and refreshes `date`; `locked` is left alone.
    pub async fn update(&self, id: NoteId, text: &str) -> Result<Note> {
        let text = validated_text(text)?;
        let mut notes = self.load(Collection::Notes).await?;

        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| not_found(id, Collection::Notes))?;
        note.text = text;
        note.date = Utc::now();
        let updated = note.clone();

        self.write(&[(Collection::Notes, notes.as_slice())]).await?;
        info!("Updated note {}", id);
        Ok(updated)
    }

    /// Sets the locked flag without touching `date`.
    pub async fn set_locked(&self, id: NoteId, locked: bool) -> Result<Note> {
        let mut notes = self.load(Collection::Notes).await?;

        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| not_found(id, Collection::Notes))?;
        if note.locked == locked {
            debug!("Note {} already has locked={}", id, locked);
            return Ok(note.clone());
        }
        note.locked = locked;
        let updated = note.clone();

        self.write(&[(Collection::Notes, notes.as_slice())]).await?;
        info!("Note {} locked={}", id, locked);
        Ok(updated)
    }

    /// Moves a note, unchanged, from `notes` to `deletedNotes`.
    pub async fn soft_delete(&self, id: NoteId) -> Result<()> {
        let (mut notes, mut deleted) = self.load_both().await?;

        let idx = notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| not_found(id, Collection::Notes))?;
        deleted.push(notes.remove(idx));

        self.write(&[
            (Collection::Notes, notes.as_slice()),
            (Collection::Deleted, deleted.as_slice()),
        ])
        .await?;
        info!("Moved note {} to trash", id);
        Ok(())
    }

    /// Moves a note, unchanged, from `deletedNotes` back to `notes`.
    pub async fn restore(&self, id: NoteId) -> Result<()> {
        let (mut notes, mut deleted) = self.load_both().await?;

        let idx = deleted
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| not_found(id, Collection::Deleted))?;
        notes.push(deleted.remove(idx));

        self.write(&[
            (Collection::Notes, notes.as_slice()),
            (Collection::Deleted, deleted.as_slice()),
        ])
        .await?;
        info!("Restored note {} from trash", id);
        Ok(())
    }

    /// Permanently removes a note from the trash. Strict: a second call fails.
    pub async fn purge(&self, id: NoteId) -> Result<()> {
        let mut deleted = self.load(Collection::Deleted).await?;

        let before = deleted.len();
        deleted.retain(|n| n.id != id);
        if deleted.len() == before {
            return Err(not_found(id, Collection::Deleted));
        }

        self.write(&[(Collection::Deleted, deleted.as_slice())]).await?;
        info!("Purged note {}", id);
        Ok(())
    }

    pub async fn purge_all(&self) -> Result<()> {
        let empty: Vec<Note> = Vec::new();
        self.write(&[(Collection::Deleted, empty.as_slice())]).await?;
        info!("Emptied trash");
        Ok(())
    }
}
