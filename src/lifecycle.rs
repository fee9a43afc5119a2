//! Note lifecycle: the operations the presentation layer calls.
//!
//! A [`Lifecycle`] composes the [`NoteRepository`] and the [`LockGate`] over
//! one shared store. Mutating operations are serialized through a single
//! writer lock, so operations issued through the same `Lifecycle` (e.g.
//! shared behind an `Arc`) cannot lose each other's updates. Anything writing
//! to the store around it is still last-writer-wins.
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex as TokioMutex;

use crate::{
    LockGate, Note, NoteCounts, NoteError, NoteId, NoteRepository, PinDigest, PinState, Result,
    StorageAdapter, DEFAULT_CAPTURE_TAG,
};

pub struct Lifecycle<S, D> {
    repo: NoteRepository<S>,
    gate: LockGate<S, D>,
    writer: TokioMutex<()>,
    capture_tag: String,
}

impl<S: StorageAdapter, D: PinDigest> Lifecycle<S, D> {
    pub fn new(store: Arc<S>, digest: D) -> Self {
        Self {
            repo: NoteRepository::new(Arc::clone(&store)),
            gate: LockGate::new(store, digest),
            writer: TokioMutex::new(()),
            capture_tag: DEFAULT_CAPTURE_TAG.to_string(),
        }
    }

    /// Overrides the tag attached by [`Lifecycle::capture_note`].
    pub fn with_capture_tag(mut self, tag: impl Into<String>) -> Self {
        self.capture_tag = tag.into();
        self
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.repo
    }

    pub fn gate(&self) -> &LockGate<S, D> {
        &self.gate
    }

    // --- reads ---

    pub async fn list_notes(&self, query: Option<&str>) -> Result<Vec<Note>> {
        self.repo.list_active(query).await
    }

    pub async fn list_trash(&self) -> Result<Vec<Note>> {
        self.repo.list_deleted().await
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Note> {
        self.repo.get_active(id).await
    }

    /// Text of an unlocked note; putting it on a clipboard is up to the caller.
    pub async fn copy_note_text(&self, id: NoteId) -> Result<String> {
        Ok(self.repo.get_active(id).await?.text)
    }

    pub async fn counts(&self) -> Result<NoteCounts> {
        self.repo.counts().await
    }

    pub async fn pin_state(&self) -> Result<PinState> {
        self.gate.state().await
    }

    /// Locked notes, only after the PIN has been verified.
    ///
    /// Viewing is gated on verification alone: it does not consult
    /// `can_lock`, so it reports `NoCredential` rather than an empty list once
    /// the PIN has been cleared.
    pub async fn view_locked_notes(&self, secret: &str) -> Result<Vec<Note>> {
        if !self.gate.verify(secret).await? {
            return Err(NoteError::Auth);
        }
        self.repo.list_locked().await
    }

    // --- mutations ---

    pub async fn create_note(&self, text: &str, tags: Vec<String>) -> Result<Note> {
        let _writer = self.writer.lock().await;
        self.repo.create(text, tags).await
    }

    /// Quick-capture entry point: creates a note tagged with the capture tag.
    pub async fn capture_note(&self, text: &str) -> Result<Note> {
        self.create_note(text, vec![self.capture_tag.clone()]).await
    }

    pub async fn edit_note(&self, id: NoteId, text: &str) -> Result<Note> {
        let _writer = self.writer.lock().await;
        self.repo.update(id, text).await
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.repo.soft_delete(id).await
    }

    pub async fn restore_note(&self, id: NoteId) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.repo.restore(id).await
    }

    pub async fn purge_note(&self, id: NoteId) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.repo.purge(id).await
    }

    pub async fn empty_trash(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.repo.purge_all().await
    }

    /// Locks a note. Requires a PIN to be set at call time.
    pub async fn lock_note(&self, id: NoteId) -> Result<Note> {
        let _writer = self.writer.lock().await;
        if !self.gate.can_lock().await? {
            warn!("Refusing to lock note {} without a PIN", id);
            return Err(NoteError::Precondition {
                reason: "pin-required".to_string(),
            });
        }
        self.repo.set_locked(id, true).await
    }

    /// Unlocks a note. No PIN check happens here; callers authorize the
    /// unlock by verifying first (see [`Lifecycle::view_locked_notes`]).
    pub async fn unlock_note(&self, id: NoteId) -> Result<Note> {
        let _writer = self.writer.lock().await;
        self.repo.set_locked(id, false).await
    }

    pub async fn set_pin(&self, secret: &str) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.gate.set_pin(secret).await
    }

    /// Removes the PIN. Locked notes keep their flag.
    pub async fn clear_pin(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.gate.clear_pin().await?;
        match self.repo.counts().await {
            Ok(counts) if counts.locked > 0 => {
                info!("PIN cleared while {} note(s) remain locked", counts.locked);
            }
            Ok(_) => {}
            Err(e) => warn!("PIN cleared but locked notes could not be counted: {}", e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Collection, MemoryStore, Sha256Digest};

    fn lifecycle() -> Lifecycle<MemoryStore, Sha256Digest> {
        Lifecycle::new(Arc::new(MemoryStore::new()), Sha256Digest::new())
    }

    #[tokio::test]
    async fn lock_requires_pin_and_leaves_note_untouched() {
        let app = lifecycle();
        let note = app.create_note("Buy milk", Vec::new()).await.unwrap();

        let err = app.lock_note(note.id).await.unwrap_err();
        assert!(matches!(err, NoteError::Precondition { ref reason } if reason == "pin-required"));
        assert!(!app.get_note(note.id).await.unwrap().locked);
    }

    #[tokio::test]
    async fn lock_without_pin_fails_precondition_even_for_unknown_id() {
        let app = lifecycle();
        assert!(matches!(
            app.lock_note(1).await.unwrap_err(),
            NoteError::Precondition { .. }
        ));
    }

    #[tokio::test]
    async fn deleted_note_cannot_be_locked() {
        let app = lifecycle();
        app.set_pin("1234").await.unwrap();
        let note = app.create_note("old", Vec::new()).await.unwrap();
        app.delete_note(note.id).await.unwrap();

        assert!(matches!(
            app.lock_note(note.id).await.unwrap_err(),
            NoteError::NotFound {
                collection: Collection::Notes,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn wrong_pin_is_auth_error_and_missing_pin_is_no_credential() {
        let app = lifecycle();
        assert!(matches!(
            app.view_locked_notes("1234").await.unwrap_err(),
            NoteError::NoCredential
        ));

        app.set_pin("1234").await.unwrap();
        assert!(matches!(
            app.view_locked_notes("0000").await.unwrap_err(),
            NoteError::Auth
        ));
        assert!(app.view_locked_notes("1234").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clearing_pin_keeps_notes_locked() {
        let app = lifecycle();
        app.set_pin("1234").await.unwrap();
        let note = app.create_note("secret", Vec::new()).await.unwrap();
        app.lock_note(note.id).await.unwrap();

        app.clear_pin().await.unwrap();
        assert_eq!(app.pin_state().await.unwrap(), PinState::NoPin);
        assert_eq!(app.counts().await.unwrap().locked, 1);
        assert!(app.list_notes(None).await.unwrap().is_empty());
        assert!(matches!(
            app.view_locked_notes("1234").await.unwrap_err(),
            NoteError::NoCredential
        ));
    }

    #[tokio::test]
    async fn unlock_needs_no_pin() {
        let app = lifecycle();
        app.set_pin("1234").await.unwrap();
        let note = app.create_note("secret", Vec::new()).await.unwrap();
        app.lock_note(note.id).await.unwrap();
        app.clear_pin().await.unwrap();

        let unlocked = app.unlock_note(note.id).await.unwrap();
        assert!(!unlocked.locked);
        assert_eq!(app.list_notes(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn copy_returns_text_of_unlocked_note() {
        let app = lifecycle();
        let note = app.create_note("copy me", Vec::new()).await.unwrap();
        assert_eq!(app.copy_note_text(note.id).await.unwrap(), "copy me");
    }

    #[tokio::test]
    async fn capture_uses_configured_tag() {
        let app = lifecycle();
        let note = app.capture_note("selected text").await.unwrap();
        assert_eq!(note.tags, vec![DEFAULT_CAPTURE_TAG.to_string()]);

        let custom = lifecycle().with_capture_tag("clipper");
        let note = custom.capture_note("x").await.unwrap();
        assert_eq!(note.tags, vec!["clipper".to_string()]);
    }
}
