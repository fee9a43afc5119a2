//! Personal note-keeping library
//!
//! This library manages notes over a key-value store: an active list, a
//! PIN-protected locked area and a recoverable trash. The presentation layer
//! calls into [`Lifecycle`]; storage and PIN hashing are pluggable.

mod cli;
mod config;
mod digest;
mod errors;
mod gate;
mod helper;
mod lifecycle;
mod note;
mod repository;
mod storage;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use digest::*;
pub use errors::*;
pub use gate::*;
pub use helper::*;
pub use lifecycle::*;
pub use note::*;
pub use repository::*;
pub use storage::*;
pub use types::*;
