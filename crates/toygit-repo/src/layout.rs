//! Paths inside a working tree's metadata directory.
//!
//! ```text
//! <work-tree>/.toygit/
//!   HEAD
//!   config
//!   index
//!   objects/<2>/<62>
//!   refs/heads/<branch>
//!   refs/tags/
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Name of the metadata directory at the top of a working tree.
pub const META_DIR: &str = ".toygit";

/// Resolved locations for one repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    work_tree: PathBuf,
    meta_dir: PathBuf,
}

impl Layout {
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        let work_tree = work_tree.into();
        let meta_dir = work_tree.join(META_DIR);
        Self {
            work_tree,
            meta_dir,
        }
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.meta_dir.join("objects")
    }

    pub fn index_path(&self) -> PathBuf {
        self.meta_dir.join("index")
    }

    pub fn head_path(&self) -> PathBuf {
        self.meta_dir.join("HEAD")
    }

    pub fn config_path(&self) -> PathBuf {
        self.meta_dir.join("config")
    }

    pub fn heads_dir(&self) -> PathBuf {
        self.meta_dir.join("refs").join("heads")
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.meta_dir.join("refs").join("tags")
    }

    /// File holding the ref `name` (e.g. `refs/heads/main`).
    pub fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.meta_dir.clone(), |path, part| path.join(part))
    }
}

/// Replace `path` with `contents` through a synced temp file in the same
/// directory.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
