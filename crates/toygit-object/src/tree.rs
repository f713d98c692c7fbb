use std::cmp::Ordering;
use std::collections::HashSet;

use toygit_types::{ObjectId, ObjectKind};

use crate::error::{ObjectError, ObjectResult, ParseError};
use crate::mode::EntryMode;

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name (a single path segment).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// Canonical tree order: byte-wise on the name, with directories compared
    /// as if their name ended in `/`.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        let slash: &u8 = &b'/';
        let lhs = self
            .name
            .as_bytes()
            .iter()
            .chain(self.mode.is_tree().then_some(slash));
        let rhs = other
            .name
            .as_bytes()
            .iter()
            .chain(other.mode.is_tree().then_some(slash));
        lhs.cmp(rhs)
    }
}

/// Check that `name` is usable as a single path segment.
pub fn validate_entry_name(name: &str) -> ObjectResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(ObjectError::InvalidEntryName(name.to_string()));
    }
    Ok(())
}

/// Directory listing object.
///
/// Entries are always held in canonical order with unique names, so the
/// encoded form (and therefore the id) does not depend on insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree from unordered entries.
    ///
    /// Rejects invalid names and duplicate names.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> ObjectResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            validate_entry_name(&entry.name)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(ObjectError::DuplicateEntry(entry.name.clone()));
            }
        }
        entries.sort_by(TreeEntry::canonical_cmp);
        Ok(Self { entries })
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries in canonical order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn encode_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_str().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.object_id.as_bytes());
        }
        out
    }

    pub(crate) fn parse_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let invalid = |reason: String| ParseError::body(ObjectKind::Tree, reason);
        let mut entries: Vec<TreeEntry> = Vec::new();
        let mut seen = HashSet::new();
        let mut pos = 0;

        while pos < payload.len() {
            let rest = &payload[pos..];
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| invalid(format!("entry at offset {pos} has no mode")))?;
            let mode = EntryMode::from_canonical(&rest[..space]).ok_or_else(|| {
                invalid(format!(
                    "unknown mode {:?} at offset {pos}",
                    String::from_utf8_lossy(&rest[..space])
                ))
            })?;

            let after_mode = &rest[space + 1..];
            let nul = after_mode
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| invalid(format!("entry at offset {pos} has no name terminator")))?;
            let name = std::str::from_utf8(&after_mode[..nul])
                .map_err(|_| invalid(format!("entry name at offset {pos} is not UTF-8")))?;
            validate_entry_name(name).map_err(|e| invalid(e.to_string()))?;

            let id_bytes = &after_mode[nul + 1..];
            if id_bytes.len() < ObjectId::LEN {
                return Err(invalid(format!("entry {name:?} has a truncated object id")));
            }
            let object_id = ObjectId::from_slice(&id_bytes[..ObjectId::LEN])
                .map_err(|e| invalid(e.to_string()))?;

            if !seen.insert(name.to_string()) {
                return Err(invalid(format!("duplicate entry {name:?}")));
            }
            let entry = TreeEntry::new(mode, name, object_id);
            if let Some(prev) = entries.last() {
                if prev.canonical_cmp(&entry) != Ordering::Less {
                    return Err(invalid(format!("entry {name:?} is out of order")));
                }
            }
            entries.push(entry);

            pos += space + 1 + nul + 1 + ObjectId::LEN;
        }

        Ok(Self { entries })
    }

    /// One line per entry: `<mode> <kind> <target-id>\t<name>`.
    pub fn pretty_print(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{} {} {}\t{}\n",
                    e.mode,
                    e.mode.object_kind(),
                    e.object_id,
                    e.name
                )
            })
            .collect()
    }
}
