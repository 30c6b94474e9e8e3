//! Browser configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kestrel_telemetry::SearchProvider;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Install the telemetry middleware
    pub telemetry_enabled: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Providers considered for search ad attribution
    pub search_providers: Vec<SearchProvider>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("kestrel.db"),
            telemetry_enabled: true,
            log_level: "info".to_string(),
            search_providers: SearchProvider::defaults(),
        }
    }

    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(CoreError::Config("database_path cannot be empty".to_string()));
        }
        if self.log_level.trim().is_empty() {
            return Err(CoreError::Config("log_level cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Kestrel"))
            .unwrap_or_else(|| PathBuf::from(".kestrel"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
