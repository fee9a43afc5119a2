//! CLI module for the notesaver application
//!
//! This module handles the command-line interface for interacting with the
//! note lifecycle.
use std::{
    io::{stdin, stdout, BufRead, Write},
    sync::Arc,
};

use log::{debug, info};

use crate::{
    parse_tags, Commands, Lifecycle, Note, NoteError, NoteId, PinCommand, PinDigest, PinState,
    Result, StorageAdapter,
};

/// CLI Application handler - processes CLI commands and interfaces with the lifecycle
pub struct App<S, D> {
    /// The note lifecycle backend
    lifecycle: Arc<Lifecycle<S, D>>,

    /// Whether to display verbose output
    verbose: bool,
}

impl<S: StorageAdapter, D: PinDigest> App<S, D> {
    /// Create a new CLI application with the given lifecycle backend
    pub fn new(lifecycle: Arc<Lifecycle<S, D>>, verbose: bool) -> Self {
        Self { lifecycle, verbose }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { text, tags } => {
                let note = self.lifecycle.create_note(&text, parse_tags(tags)).await?;
                println!("Created note {}", console::style(note.id).green());
            }

            Commands::Capture { text } => {
                let note = self.lifecycle.capture_note(&text).await?;
                println!("Captured note {}", console::style(note.id).green());
            }

            Commands::List { query, json } => {
                let notes = self.lifecycle.list_notes(query.as_deref()).await?;
                if json {
                    print_json(&notes)?;
                } else {
                    self.print_notes(&notes, "No notes found.");
                    let locked = self.lifecycle.counts().await?.locked;
                    if locked > 0 {
                        println!("{}", console::style(format!("Locked notes: {}", locked)).dim());
                    }
                }
            }

            Commands::Show { id } => {
                let note = self.lifecycle.get_note(id).await?;
                self.print_note(&note, true);
            }

            Commands::Edit { id, text } => {
                self.lifecycle.edit_note(id, &text).await?;
                println!("Updated note {}", id);
            }

            Commands::Copy { id } => {
                let text = self.lifecycle.copy_note_text(id).await?;
                print!("{}", text);
                stdout().flush()?;
            }

            Commands::Delete { id } => {
                self.lifecycle.delete_note(id).await?;
                println!("Moved note {} to the trash", id);
            }

            Commands::Restore { id } => {
                self.lifecycle.restore_note(id).await?;
                println!("Restored note {}", id);
            }

            Commands::Purge { id } => {
                self.lifecycle.purge_note(id).await?;
                println!("Permanently deleted note {}", id);
            }

            Commands::Trash { json } => {
                let notes = self.lifecycle.list_trash().await?;
                if json {
                    print_json(&notes)?;
                } else {
                    self.print_notes(&notes, "The trash is empty.");
                }
            }

            Commands::EmptyTrash { force } => self.handle_empty_trash(force).await?,

            Commands::Lock { id } => match self.lifecycle.lock_note(id).await {
                Ok(_) => println!("Locked note {}", id),
                Err(e @ NoteError::Precondition { .. }) => {
                    eprintln!("You must set a PIN before locking notes (notesaver pin set).");
                    return Err(e);
                }
                Err(e) => return Err(e),
            },

            Commands::Unlock { id, pin } => self.handle_unlock(id, pin).await?,

            Commands::Locked { pin, json } => {
                let secret = resolve_secret(pin, "Enter PIN to view locked notes: ")?;
                let notes = self.lifecycle.view_locked_notes(&secret).await?;
                if json {
                    print_json(&notes)?;
                } else {
                    self.print_notes(&notes, "No locked notes.");
                }
            }

            Commands::Pin { action } => self.handle_pin(action).await?,

            Commands::Status => {
                let counts = self.lifecycle.counts().await?;
                println!("Notes:   {}", counts.active);
                println!("Locked:  {}", counts.locked);
                println!("Trash:   {}", counts.deleted);
                println!("{}", pin_status_line(self.lifecycle.pin_state().await?));
            }
        }

        Ok(())
    }

    async fn handle_empty_trash(&self, force: bool) -> Result<()> {
        if !force {
            let answer = prompt(
                "Empty the trash? This will permanently delete all deleted notes. [y/N]: ",
            )?;
            if !is_yes(&answer) {
                println!("Cancelled.");
                return Ok(());
            }
        }
        self.lifecycle.empty_trash().await?;
        println!("Trash emptied.");
        Ok(())
    }

    async fn handle_unlock(&self, id: NoteId, pin: Option<String>) -> Result<()> {
        // Unlocking is authorized by a successful view of the locked notes.
        let secret = resolve_secret(pin, "Enter PIN: ")?;
        self.lifecycle.view_locked_notes(&secret).await?;
        debug!("PIN verified, unlocking note {}", id);
        self.lifecycle.unlock_note(id).await?;
        println!("Unlocked note {}", id);
        Ok(())
    }

    async fn handle_pin(&self, action: PinCommand) -> Result<()> {
        match action {
            PinCommand::Set { pin } => {
                let secret = resolve_secret(pin, "New PIN: ")?;
                self.lifecycle.set_pin(&secret).await?;
                println!("PIN saved.");
            }
            PinCommand::Clear => {
                self.lifecycle.clear_pin().await?;
                let locked = self.lifecycle.counts().await?.locked;
                println!("PIN removed.");
                if locked > 0 {
                    println!(
                        "{}",
                        console::style(format!(
                            "{} note(s) are still locked. Set a new PIN to view or unlock them.",
                            locked
                        ))
                        .yellow()
                    );
                }
            }
            PinCommand::Status => {
                println!("{}", pin_status_line(self.lifecycle.pin_state().await?));
            }
        }
        Ok(())
    }

    fn print_notes(&self, notes: &[Note], empty_message: &str) {
        if notes.is_empty() {
            println!("{}", empty_message);
            return;
        }
        for note in notes {
            self.print_note(note, self.verbose);
            println!();
        }
        info!("Displayed {} notes", notes.len());
    }

    fn print_note(&self, note: &Note, detailed: bool) {
        println!(
            "{} {}",
            console::style(note.id).cyan().bold(),
            console::style(note.date.format("%Y-%m-%d %H:%M")).dim()
        );

        if !note.tags.is_empty() {
            let tags = note
                .tags
                .iter()
                .map(|tag| format!("#{}", tag))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Tags: {}", console::style(tags).cyan());
        }

        if detailed {
            println!("{}", note.text);
        } else {
            println!("{}", preview(&note.text, 100));
        }
    }
}

fn pin_status_line(state: PinState) -> &'static str {
    match state {
        PinState::PinSet => "PIN is set.",
        PinState::NoPin => "No PIN set.",
    }
}

fn print_json(notes: &[Note]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(notes)?);
    Ok(())
}

/// First non-empty line, cut to `max_chars` characters.
fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    stdout().flush()?;
    read_line(&mut stdin().lock())
}

/// Uses the secret given on the command line, or prompts for one.
fn resolve_secret(given: Option<String>, message: &str) -> Result<String> {
    let secret = match given {
        Some(secret) => secret,
        None => prompt(message)?,
    };
    Ok(secret.trim().to_string())
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Err(NoteError::validation("no input"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
