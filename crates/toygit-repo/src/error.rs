use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("not a toygit repository (or any parent): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("path is outside the repository: {}", .0.display())]
    PathOutsideRepository(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid reference: {0}")]
    InvalidRef(String),

    #[error("store error: {0}")]
    Store(#[from] toygit_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] toygit_index::IndexError),

    #[error("object error: {0}")]
    Object(#[from] toygit_object::ObjectError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RepoError {
    /// Classify an I/O failure on `path`.
    pub(crate) fn at(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
