//! `HEAD` and the branch pointer it names.
//!
//! `HEAD` is either symbolic (`ref: refs/heads/<branch>\n`) or a detached
//! commit id. A branch file holds a hex commit id followed by a newline.

use std::fmt;
use std::fs;
use std::io;

use toygit_types::ObjectId;
use tracing::debug;

use crate::error::{RepoError, RepoResult};
use crate::layout::{write_atomic, Layout};

const SYMREF_PREFIX: &str = "ref: ";
const HEADS_PREFIX: &str = "refs/heads/";

/// Characters that are forbidden anywhere in a branch name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// What `HEAD` points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadRef {
    /// Full ref name, e.g. `refs/heads/main`. The branch may not exist yet.
    Branch(String),
    Detached(ObjectId),
}

impl HeadRef {
    pub fn branch(name: &str) -> Self {
        Self::Branch(format!("{HEADS_PREFIX}{name}"))
    }

    /// Short branch name, if `HEAD` is symbolic.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Branch(full) => full.strip_prefix(HEADS_PREFIX),
            Self::Detached(_) => None,
        }
    }
}

impl fmt::Display for HeadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(full) => write!(f, "{SYMREF_PREFIX}{full}"),
            Self::Detached(id) => write!(f, "{id}"),
        }
    }
}

/// Check a short branch name against git-style rules.
///
/// Rejects empty names, whitespace and `~^:?*[\`, `..`, `@{`, `//`, a leading
/// or trailing `.` or `/`, a `.lock` suffix, and components starting with `.`.
pub fn validate_branch_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("branch name must not be empty".into());
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("contains forbidden character: {ch:?}"));
    }
    for seq in ["..", "@{", "//"] {
        if name.contains(seq) {
            return Err(format!("must not contain '{seq}'"));
        }
    }
    if name.ends_with('.') || name.starts_with('/') || name.ends_with('/') {
        return Err("must not start or end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return Err("must not end with '.lock'".into());
    }
    if let Some(component) = name.split('/').find(|c| c.is_empty() || c.starts_with('.')) {
        return Err(format!("invalid component {component:?}"));
    }
    Ok(())
}

/// Parse `HEAD`.
pub fn read_head(layout: &Layout) -> RepoResult<HeadRef> {
    let path = layout.head_path();
    let text = fs::read_to_string(&path).map_err(|e| RepoError::at(&path, e))?;
    let line = text.trim_end_matches('\n');

    if let Some(target) = line.strip_prefix(SYMREF_PREFIX) {
        let branch = target
            .strip_prefix(HEADS_PREFIX)
            .ok_or_else(|| RepoError::InvalidRef(format!("HEAD points outside refs/heads: {target}")))?;
        validate_branch_name(branch)
            .map_err(|reason| RepoError::InvalidRef(format!("HEAD: {reason}")))?;
        return Ok(HeadRef::Branch(target.to_string()));
    }
    ObjectId::from_hex(line)
        .map(HeadRef::Detached)
        .map_err(|_| RepoError::InvalidRef(format!("malformed HEAD: {line:?}")))
}

/// Point `HEAD` at `head`.
pub fn write_head(layout: &Layout, head: &HeadRef) -> RepoResult<()> {
    let path = layout.head_path();
    write_atomic(&path, format!("{head}\n").as_bytes()).map_err(|e| RepoError::at(&path, e))
}

/// Commit id stored in ref `name`, or `None` if the ref does not exist yet.
pub fn read_ref(layout: &Layout, name: &str) -> RepoResult<Option<ObjectId>> {
    let path = layout.ref_path(name);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepoError::at(&path, e)),
    };
    let hex = text.trim_end_matches('\n');
    ObjectId::from_hex(hex)
        .map(Some)
        .map_err(|_| RepoError::InvalidRef(format!("{name}: malformed id {hex:?}")))
}

/// Atomically set ref `name` to `id`.
pub fn update_ref(layout: &Layout, name: &str, id: &ObjectId) -> RepoResult<()> {
    let path = layout.ref_path(name);
    write_atomic(&path, format!("{}\n", id.to_hex()).as_bytes())
        .map_err(|e| RepoError::at(&path, e))?;
    debug!(name, id = %id.short_hex(), "updated ref");
    Ok(())
}
