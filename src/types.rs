//! Core data structures for the notesaver application.
//!
//! This module contains the shared types used throughout the application,
//! including the record keys of the persisted layout and the CLI commands.
use std::fmt;

use clap::Subcommand;
use serde::Serialize;

use crate::NoteError;

/// A specialized Result type for notesaver operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Identifier of a note, derived from the creation time in milliseconds.
pub type NoteId = i64;

/// Record holding every note that is not soft-deleted.
pub const NOTES_KEY: &str = "notes";
/// Record holding soft-deleted notes.
pub const DELETED_NOTES_KEY: &str = "deletedNotes";
/// Record holding the digest of the current PIN.
pub const PIN_HASH_KEY: &str = "pinHash";

/// Tag attached to notes created through the quick-capture entry point.
pub const DEFAULT_CAPTURE_TAG: &str = "from-context-menu";

/// The two note collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Notes,
    Deleted,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::Notes => NOTES_KEY,
            Collection::Deleted => DELETED_NOTES_KEY,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// State of the single credential slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinState {
    NoPin,
    PinSet,
}

/// Number of notes in each listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoteCounts {
    pub active: usize,
    pub locked: usize,
    pub deleted: usize,
}

/// Available subcommands for the notesaver application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Add {
        /// Text of the note
        text: String,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,
    },

    /// Quickly capture text as a note tagged with the capture tag
    Capture {
        /// Text to capture
        text: String,
    },

    /// List unlocked notes, newest first
    List {
        /// Only show notes whose text contains this (case-insensitive)
        #[clap(short, long)]
        query: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a single unlocked note
    Show {
        /// ID of the note
        id: NoteId,
    },

    /// Replace the text of a note
    Edit {
        /// ID of the note to edit
        id: NoteId,

        /// New text
        text: String,
    },

    /// Print the raw text of a note, e.g. for piping into a clipboard tool
    Copy {
        /// ID of the note
        id: NoteId,
    },

    /// Move a note to the trash
    Delete {
        /// ID of the note to delete
        id: NoteId,
    },

    /// Move a note from the trash back to the notes
    Restore {
        /// ID of the note to restore
        id: NoteId,
    },

    /// Permanently remove a note from the trash
    Purge {
        /// ID of the note to purge
        id: NoteId,
    },

    /// List the trash
    Trash {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Permanently remove everything in the trash
    EmptyTrash {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Lock a note (requires a PIN to be set)
    Lock {
        /// ID of the note to lock
        id: NoteId,
    },

    /// Unlock a note after verifying the PIN
    Unlock {
        /// ID of the note to unlock
        id: NoteId,

        /// PIN (prompted for when omitted)
        #[clap(long)]
        pin: Option<String>,
    },

    /// List locked notes after verifying the PIN
    Locked {
        /// PIN (prompted for when omitted)
        #[clap(long)]
        pin: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// PIN management
    Pin {
        #[clap(subcommand)]
        action: PinCommand,
    },

    /// Show note counts and PIN status
    Status,
}

/// PIN subcommands
#[derive(Subcommand)]
pub enum PinCommand {
    /// Set or replace the PIN
    Set {
        /// New PIN (prompted for when omitted)
        #[clap(long)]
        pin: Option<String>,
    },

    /// Remove the PIN. Locked notes stay locked.
    Clear,

    /// Show whether a PIN is set
    Status,
}
