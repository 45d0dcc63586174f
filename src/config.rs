//! Store configuration
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration for an in-memory store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};
use crate::schema::CopyMovePolicy;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Document store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for the document file (default: none, memory only)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// fsync after every append (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// FileAction copy/move convention (default: enforce)
    #[serde(default)]
    pub copy_move_policy: CopyMovePolicy,

    /// Minimum severity written to the log (default: WARN)
    #[serde(default)]
    pub log_level: Severity,
}

fn default_sync_writes() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_writes: default_sync_writes(),
            copy_move_policy: CopyMovePolicy::default(),
            log_level: Severity::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: StoreConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string()), ("log_level", config.log_level.as_str())],
        );

        Ok(config)
    }

    /// A store that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store persisted under `data_dir`
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Sets the copy/move convention policy
    pub fn with_copy_move_policy(mut self, policy: CopyMovePolicy) -> Self {
        self.copy_move_policy = policy;
        self
    }

    /// Returns whether documents are written to disk
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }
}
