//! File locking and atomic writes for the on-disk storage backend
//!
//! - Exclusive locks (fs2/flock) on a sibling `<file>.lock`
//! - Atomic write pattern (write temp + rename)
//! - Lock timeout with a fixed retry interval

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::trace;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Default retry interval when waiting for a lock
const LOCK_RETRY_INTERVAL_MS: u64 = 50;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw OS errors 32/33.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

/// Exclusive lock on a file, released on drop
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire the lock, retrying until `timeout_ms` has passed.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(Error::LockFailed(path.to_path_buf()));
            }
            std::thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
        }
    }

    /// Take the lock if it is free; `Ok(None)` while someone else holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                trace!(path = %path.display(), "lock acquired");
                Ok(Some(FileLock {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(err) if is_lock_contended(&err) => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// `tasks.json` is guarded by `tasks.json.lock`
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

fn with_lock<T>(path: &Path, timeout_ms: u64, op: impl FnOnce() -> Result<T>) -> Result<T> {
    let _lock = FileLock::acquire(lock_path_for(path), timeout_ms)?;
    op()
}

/// Replace `path` with `data` via a sibling temp file and a rename, so
/// readers see either the old or the new content.
///
/// Takes no lock; see [`write_atomic_locked`].
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = path.with_file_name(temp_name);

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

pub fn write_atomic_locked(path: impl AsRef<Path>, data: &[u8], timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();
    with_lock(path, timeout_ms, || write_atomic(path, data))
}

/// Delete `path` under its lock. A missing file counts as removed.
pub fn remove_locked(path: impl AsRef<Path>, timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();
    with_lock(path, timeout_ms, || match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(Error::Io(err)),
        _ => Ok(()),
    })
}
