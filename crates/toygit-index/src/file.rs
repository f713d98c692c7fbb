//! Loading and saving the index file.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::IndexResult;
use crate::format;
use crate::index::Index;
use crate::lock::{IndexLock, LockConfig};

/// Read the index at `path`. A missing file is an empty index.
pub fn load(path: &Path) -> IndexResult<Index> {
    match fs::read(path) {
        Ok(bytes) => format::decode(&bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Index::new()),
        Err(e) => Err(e.into()),
    }
}

/// An index loaded while holding its lock.
///
/// Mutate it through [`index_mut`](Self::index_mut), then [`save`](Self::save).
/// Dropping it without saving releases the lock and discards the changes.
#[derive(Debug)]
pub struct LockedIndex {
    lock: IndexLock,
    index: Index,
}

impl LockedIndex {
    /// Lock the index at `path`, then load it.
    pub fn open(path: &Path, config: &LockConfig) -> IndexResult<Self> {
        let lock = IndexLock::acquire(path, config)?;
        let index = load(path)?;
        Ok(Self { lock, index })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    /// Write the index and release the lock.
    pub fn save(self) -> IndexResult<()> {
        let bytes = format::encode(&self.index)?;
        let entries = self.index.len();
        let path = self.lock.target().to_path_buf();
        self.lock.commit(&bytes)?;
        debug!(path = %path.display(), entries, "saved index");
        Ok(())
    }
}
