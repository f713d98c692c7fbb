//! Index entry types for tracking working directory files.

use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use toygit_object::EntryMode;
use toygit_types::ObjectId;

use crate::error::{IndexError, IndexResult};

/// A point in time with nanosecond precision, as recorded by the filesystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileTime {
    /// Seconds relative to the Unix epoch.
    pub secs: i64,
    /// Sub-second part, always below one billion.
    pub nanos: u32,
}

impl FileTime {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self::new(-(d.as_secs() as i64), 0)
                } else {
                    Self::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - d.subsec_nanos())
                }
            }
        }
    }

    /// Modification time of `meta`, or the epoch when the platform has none.
    pub fn modified(meta: &Metadata) -> Self {
        meta.modified()
            .map(Self::from_system_time)
            .unwrap_or_default()
    }
}

/// Filesystem facts that, together with size and mtime, let a clean file be
/// recognized without rehashing. All zeros on platforms that lack them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheStamp {
    pub ctime: FileTime,
    pub dev: u64,
    pub ino: u64,
    pub uid: u32,
    pub gid: u32,
}

impl CacheStamp {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            ctime: FileTime::new(meta.ctime(), meta.ctime_nsec() as u32),
            dev: meta.dev(),
            ino: meta.ino(),
            uid: meta.uid(),
            gid: meta.gid(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &Metadata) -> Self {
        Self::default()
    }
}

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Repository-relative path with `/` separators.
    pub path: String,
    /// Id of the file's blob in the object store.
    pub object_id: ObjectId,
    pub mode: EntryMode,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time (used for quick dirty checks).
    pub mtime: FileTime,
    pub stamp: CacheStamp,
}

impl IndexEntry {
    /// Create an entry with an empty cache stamp. Such an entry never
    /// matches on-disk metadata, so status always rehashes it.
    pub fn new(path: impl Into<String>, object_id: ObjectId, mode: EntryMode, size: u64) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode,
            size,
            mtime: FileTime::default(),
            stamp: CacheStamp::default(),
        }
    }

    /// Create an entry stamped with the metadata of the file it was read from.
    pub fn from_metadata(
        path: impl Into<String>,
        object_id: ObjectId,
        meta: &Metadata,
    ) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode: mode_from_metadata(meta),
            size: meta.len(),
            mtime: FileTime::modified(meta),
            stamp: CacheStamp::from_metadata(meta),
        }
    }

    /// Whether `meta` still describes the file this entry was staged from.
    pub fn matches_metadata(&self, meta: &Metadata) -> bool {
        self.size == meta.len()
            && self.mode == mode_from_metadata(meta)
            && self.mtime == FileTime::modified(meta)
            && self.stamp == CacheStamp::from_metadata(meta)
    }
}

/// Entry mode for a file described by `meta` (from `symlink_metadata`).
pub fn mode_from_metadata(meta: &Metadata) -> EntryMode {
    if meta.file_type().is_symlink() {
        return EntryMode::Symlink;
    }
    if meta.is_dir() {
        return EntryMode::Directory;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 != 0 {
            return EntryMode::Executable;
        }
    }
    EntryMode::Regular
}

/// Check that `path` is a clean repository-relative path: `/` separated,
/// no leading `/`, no empty, `.` or `..` components, no NUL.
pub fn validate_path(path: &str) -> IndexResult<()> {
    let valid = !path.is_empty()
        && !path.contains('\0')
        && path
            .split('/')
            .all(|c| !c.is_empty() && c != "." && c != "..");
    if valid {
        Ok(())
    } else {
        Err(IndexError::InvalidPath(path.to_string()))
    }
}
