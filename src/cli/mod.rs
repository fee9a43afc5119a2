//! Command-line presentation layer.
//!
//! Everything that talks to a person lives here: argument parsing, PIN
//! prompts, confirmations and output formatting. The library core never
//! prompts.
mod app;
mod args;

pub use app::*;
pub use args::*;
