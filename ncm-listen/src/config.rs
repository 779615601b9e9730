//! Persisted settings (`config.toml` in the data directory).
//!
//! ```toml
//! [logger]
//! seq = 42
//! ```
//!
//! `logger.seq` is the playback log sequence number to resume from. It is
//! written back only after the server accepted an upload.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logger: LoggerSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoggerSettings {
    #[serde(default = "first_seq")]
    pub seq: u64,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self { seq: first_seq() }
    }
}

fn first_seq() -> u64 {
    1
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(data) => toml::from_str(&data)
                .with_context(|| format!("invalid settings file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    /// Write the whole document back to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = toml::to_string(self)?;
        fs::write(path, data).with_context(|| format!("cannot write {}", path.display()))
    }
}
