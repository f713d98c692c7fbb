//! Staging index for toygit.
//!
//! Records which blob each tracked path should have in the next commit,
//! persists that record in a checksummed binary file, and serializes
//! concurrent updates through an exclusive `index.lock` file.
//!
//! # Key Types
//!
//! - [`Index`] -- The in-memory staging area (BTreeMap-backed)
//! - [`IndexEntry`] -- A tracked file with its cache-validity stamp
//! - [`LockedIndex`] -- An index loaded under the lock, saved atomically
//! - [`WorkdirStatus`] -- Working tree compared against the index

pub mod entry;
pub mod error;
pub mod file;
pub mod format;
pub mod index;
pub mod lock;
pub mod status;

pub use entry::{validate_path, CacheStamp, FileTime, IndexEntry};
pub use error::{IndexError, IndexResult};
pub use file::{load, LockedIndex};
pub use index::Index;
pub use lock::{IndexLock, LockConfig};
pub use status::{check_entry, FileState, WorkdirStatus};
