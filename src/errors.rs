//! Error types for the notesaver application.
//!
//! This module defines the failures the note lifecycle can report to its
//! caller. None of them are retried internally; the presentation layer decides
//! how to show them.

use std::io;

use thiserror::Error;

use crate::{Collection, NoteId};

/// The main error type for the notesaver application.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Empty note text or empty PIN.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The id is not present in the collection the operation works on.
    #[error("Note {id} not found in {collection}")]
    NotFound { id: NoteId, collection: Collection },

    /// An operation's precondition does not hold (e.g. locking without a PIN).
    #[error("Precondition failed: {reason}")]
    Precondition { reason: String },

    /// A PIN check was requested but no PIN is configured.
    #[error("No PIN has been set")]
    NoCredential,

    /// The supplied PIN does not match the stored digest.
    #[error("Incorrect PIN")]
    Auth,

    /// The storage adapter failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl NoteError {
    pub fn validation(message: impl Into<String>) -> Self {
        NoteError::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        NoteError::Storage {
            message: message.into(),
        }
    }

    /// True for every failure that originated in the storage layer, including
    /// file and decode errors surfaced by the on-disk adapter.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            NoteError::Storage { .. } | NoteError::Io(_) | NoteError::Serialization(_)
        )
    }
}
