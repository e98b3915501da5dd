//! Configuration loading and management
//!
//! Handles parsing of `tasklist.toml`, looked up in the data directory unless
//! a path is given explicitly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::controller::DEFAULT_CONFIRM_MESSAGE;
use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::{self, CorruptDataPolicy, TASKS_KEY};

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "tasklist.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Terminal UI configuration
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where and how the task list is persisted
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Data directory override
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Storage key holding the task list
    #[serde(default = "default_key")]
    pub key: String,

    /// What to do when the stored list does not parse
    #[serde(default)]
    pub on_corrupt: CorruptDataPolicy,

    /// How long to wait for the storage lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_key() -> String {
    TASKS_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_key(),
            on_corrupt: CorruptDataPolicy::default(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Terminal UI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Prompt shown before deleting a form
    #[serde(default = "default_confirm_message")]
    pub confirm_message: String,

    /// Highlight tasks whose due date has passed
    #[serde(default = "default_true")]
    pub highlight_overdue: bool,
}

fn default_confirm_message() -> String {
    DEFAULT_CONFIRM_MESSAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            confirm_message: default_confirm_message(),
            highlight_overdue: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `tasklist.toml` from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.ui.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        storage::validate_key(&self.key)
            .map_err(|_| Error::InvalidConfig(format!("storage.key '{}' is invalid", self.key)))?;
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if let Some(dir) = &self.dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "storage.dir cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl UiConfig {
    fn validate(&self) -> Result<()> {
        if self.confirm_message.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "ui.confirm_message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform data directory for tasklist, falling back to `./.tasklist`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tasklist")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}
