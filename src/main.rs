use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info};

use notesaver::{App, Cli, Config, JsonFileStore, Lifecycle, Sha256Digest};

pub fn initialize_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", console::style(format!("Error: {}", e)).red());
            return ExitCode::FAILURE;
        }
    };
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    let filter = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    initialize_logger(filter);
    info!("Using data file {}", config.data_file.display());

    let digest = match &config.digest_key {
        Some(key) => Sha256Digest::with_key(key),
        None => Sha256Digest::new(),
    };
    let store = Arc::new(JsonFileStore::new(config.data_file.clone()));
    let lifecycle =
        Arc::new(Lifecycle::new(store, digest).with_capture_tag(config.capture_tag.clone()));

    let app = App::new(lifecycle, cli.verbose);
    match app.run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", console::style(format!("Error: {}", e)).red());
            ExitCode::FAILURE
        }
    }
}
