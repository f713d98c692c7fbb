//! Exclusive `index.lock` guarding index read-modify-write.
//!
//! The lock is a file created with `create_new`, so exactly one process can
//! hold it. The holder writes the new index into the lock file itself and
//! renames it over the index on commit; dropping an uncommitted guard
//! deletes the lock and leaves the index untouched.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};

/// How long to wait for the lock and when to call it stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockConfig {
    /// Give up after this long.
    pub timeout: Duration,
    /// Pause between attempts.
    pub retry_interval: Duration,
    /// A lock file older than this is reported as stale instead of busy.
    pub stale_after: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            retry_interval: Duration::from_millis(25),
            stale_after: Duration::from_secs(600),
        }
    }
}

/// An exclusive lock on an index file.
///
/// Released when dropped unless [`commit`](Self::commit) succeeded.
#[derive(Debug)]
pub struct IndexLock {
    lock_path: PathBuf,
    target: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl IndexLock {
    /// `<index>.lock` next to `index_path`.
    pub fn lock_path_for(index_path: &Path) -> PathBuf {
        let mut name = index_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("index"));
        name.push(".lock");
        index_path.with_file_name(name)
    }

    /// Take the lock for `index_path`, retrying until `config.timeout`.
    ///
    /// # Errors
    ///
    /// - [`IndexError::IndexLocked`] if another holder keeps the lock past
    ///   the timeout
    /// - [`IndexError::StaleLock`] if the lock file is older than
    ///   `config.stale_after`
    pub fn acquire(index_path: &Path, config: &LockConfig) -> IndexResult<Self> {
        let lock_path = Self::lock_path_for(index_path);
        let deadline = Instant::now() + config.timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(file) => {
                    debug!(path = %lock_path.display(), attempts, "acquired index lock");
                    return Ok(Self {
                        lock_path,
                        target: index_path.to_path_buf(),
                        file: Some(file),
                        committed: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::sleep(config.retry_interval.min(deadline - now));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let age = fs::metadata(&lock_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok());
        match age {
            Some(age) if age >= config.stale_after => {
                warn!(path = %lock_path.display(), age_secs = age.as_secs(), "stale index lock");
                Err(IndexError::StaleLock {
                    path: lock_path,
                    age_secs: age.as_secs(),
                })
            }
            _ => Err(IndexError::IndexLocked { path: lock_path }),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Path of the index this lock guards.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Write `contents` into the lock file and rename it over the index.
    pub fn commit(mut self, contents: &[u8]) -> IndexResult<()> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new().write(true).open(&self.lock_path)?,
        };
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.lock_path, &self.target)?;
        self.committed = true;
        debug!(path = %self.target.display(), bytes = contents.len(), "committed index");
        Ok(())
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}
