//! Persistence for the task list
//!
//! Tasks are stored as a single JSON array under one string key of a
//! key-value backend. Every mutation rewrites the whole array.
//!
//! # Backends
//!
//! ```text
//! MemoryStorage                 # HashMap, used by tests and dry runs
//! FileStorage                   # One file per key under a data directory
//!   <data_dir>/
//!     tasks.json                # Value of key "tasks"
//!     tasks.json.lock           # Exclusive lock held while writing
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

/// Key the task list is stored under
pub const TASKS_KEY: &str = "tasks";

/// String-keyed storage of string values.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Volatile backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with one entry.
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut items = HashMap::new();
        items.insert(key.into(), value.into());
        Self { items }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// On-disk backend: key `k` lives in `<dir>/k.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path of the file backing `key`
    pub fn item_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        lock::write_atomic_locked(&path, value.as_bytes(), self.lock_timeout_ms)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;
        lock::remove_locked(&path, self.lock_timeout_ms)
    }
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key '{key}'")))
    }
}

/// What `load` does with a stored value that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptDataPolicy {
    /// Return `Error::CorruptStorage`.
    #[default]
    Fail,
    /// Log a warning and start from an empty list. The stored value is left
    /// in place until the next save overwrites it.
    Reset,
}

/// Serializes the whole task list to and from one storage entry.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter<S> {
    backend: S,
    key: String,
    on_corrupt: CorruptDataPolicy,
}

impl<S: KeyValueStorage> PersistenceAdapter<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            key: TASKS_KEY.to_string(),
            on_corrupt: CorruptDataPolicy::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptDataPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Overwrite the stored entry with the full list.
    pub fn store(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks)?;
        self.backend.set_item(&self.key, &json)?;
        debug!(key = %self.key, count = tasks.len(), "tasks stored");
        Ok(())
    }

    /// Read the stored list. A missing entry is an empty list.
    pub fn load(&self) -> Result<Vec<Task>> {
        let Some(raw) = self.backend.get_item(&self.key)? else {
            debug!(key = %self.key, "no stored tasks");
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(key = %self.key, count = tasks.len(), "tasks loaded");
                Ok(tasks)
            }
            Err(source) => match self.on_corrupt {
                CorruptDataPolicy::Fail => Err(Error::CorruptStorage {
                    key: self.key.clone(),
                    source,
                }),
                CorruptDataPolicy::Reset => {
                    warn!(key = %self.key, error = %source, "stored tasks are corrupt; starting empty");
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Raw stored value, if any.
    pub fn raw(&self) -> Result<Option<String>> {
        self.backend.get_item(&self.key)
    }

    /// Delete the stored entry.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.remove_item(&self.key)?;
        debug!(key = %self.key, "stored tasks cleared");
        Ok(())
    }
}
