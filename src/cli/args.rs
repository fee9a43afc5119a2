use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Personal notes with a PIN-protected locked area and a trash bin"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the notes data file (overrides the configuration)
    #[clap(long, value_parser)]
    pub data_file: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the notesaver application
    #[clap(subcommand)]
    pub command: Commands,
}
