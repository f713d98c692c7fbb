//! Error types for the index crate.

use std::path::PathBuf;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index file fails its checksum or cannot be parsed.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Another process holds the index lock.
    #[error("index is locked: {} exists", path.display())]
    IndexLocked { path: PathBuf },

    /// The index lock has been held for longer than the stale threshold.
    #[error("stale index lock {} ({age_secs}s old); remove it if no other process is running", path.display())]
    StaleLock { path: PathBuf, age_secs: u64 },

    /// An invalid path was provided.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// The specified path was not found in the index.
    #[error("path not found in index: {0}")]
    PathNotFound(String),

    /// An entry could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A tree could not be built from the entries.
    #[error(transparent)]
    Object(#[from] toygit_object::ObjectError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] toygit_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
