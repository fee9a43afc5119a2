use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{NoteError, Result, DEFAULT_CAPTURE_TAG};

const CONFIG_FILE_NAME: &str = "config.json";
const DATA_FILE_NAME: &str = "notes.json";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "notesaver")
}

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the `notes`, `deletedNotes` and `pinHash` records
    pub data_file: PathBuf,

    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,

    /// Tag attached to quick-captured notes
    pub capture_tag: String,

    /// Optional application key mixed into the PIN digest
    pub digest_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_file: data_dir.join(DATA_FILE_NAME),
            log_level: "info".to_string(),
            capture_tag: DEFAULT_CAPTURE_TAG.to_string(),
            digest_key: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => {
                    debug!("No platform config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read config file {}: {}", path.display(), e);
            NoteError::Config {
                message: format!("cannot read {}: {}", path.display(), e),
            }
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse config file {}: {}", path.display(), e);
            NoteError::Config {
                message: format!("invalid {}: {}", path.display(), e),
            }
        })?;

        if config.capture_tag.trim().is_empty() {
            return Err(NoteError::Config {
                message: "capture_tag must not be empty".to_string(),
            });
        }

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
