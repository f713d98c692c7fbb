//! Working directory status relative to the index.

use std::fs;
use std::io;
use std::path::Path;

use toygit_object::{identify, ObjectKind};

use crate::entry::{mode_from_metadata, IndexEntry};
use crate::error::IndexResult;

/// Complete status of the working directory relative to the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Tracked files whose content or mode differs from the index.
    pub modified: Vec<String>,
    /// Tracked files missing from the working directory.
    pub deleted: Vec<String>,
    /// Files present in the working directory but not tracked.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty() && self.untracked.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn total_entries(&self) -> usize {
        self.modified.len() + self.deleted.len() + self.untracked.len()
    }
}

/// How a tracked file compares with the working tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileState {
    Clean,
    Modified,
    Deleted,
}

/// Compare `entry` against the file at `file`.
///
/// A file whose size, mtime and cache stamp still match is clean without
/// being read. Otherwise it is rehashed, so touching a file without
/// changing it does not report a modification.
pub fn check_entry(entry: &IndexEntry, file: &Path) -> IndexResult<FileState> {
    let meta = match fs::symlink_metadata(file) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileState::Deleted),
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        return Ok(FileState::Deleted);
    }
    if entry.matches_metadata(&meta) {
        return Ok(FileState::Clean);
    }
    if mode_from_metadata(&meta) != entry.mode || meta.len() != entry.size {
        return Ok(FileState::Modified);
    }
    let content = fs::read(file)?;
    if identify(ObjectKind::Blob, &content) == entry.object_id {
        Ok(FileState::Clean)
    } else {
        Ok(FileState::Modified)
    }
}
