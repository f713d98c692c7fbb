//! Outcome of a staging batch.

use std::path::PathBuf;

use toygit_types::ObjectId;

use crate::error::RepoError;

/// A file written to the store and recorded in the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the work tree, `/`-separated.
    pub path: String,
    pub object_id: ObjectId,
    /// Index entries replaced because they conflicted with this path.
    pub evicted: Vec<String>,
}

/// A path deliberately not staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// A path that could not be staged.
#[derive(Debug)]
pub struct StageFailure {
    pub path: PathBuf,
    pub error: RepoError,
}

/// Per-path results of [`Repository::stage`](crate::Repository::stage).
#[derive(Debug, Default)]
pub struct StageReport {
    pub staged: Vec<StagedFile>,
    pub skipped: Vec<SkippedPath>,
    pub failed: Vec<StageFailure>,
}

impl StageReport {
    /// No path failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn skip(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.skipped.push(SkippedPath {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub(crate) fn fail(&mut self, path: impl Into<PathBuf>, error: RepoError) {
        self.failed.push(StageFailure {
            path: path.into(),
            error,
        });
    }
}
