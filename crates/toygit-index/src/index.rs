//! The core Index structure managing staged entries in memory.
//!
//! The [`Index`] manages a `BTreeMap<String, IndexEntry>` as the staging area.
//! All operations are in-memory; reading and writing the index file lives in
//! [`crate::file`], and walking the working tree is the caller's job.

use std::collections::BTreeMap;

use toygit_object::{EntryMode, Object, Tree, TreeEntry};
use toygit_store::ObjectStore;
use toygit_types::ObjectId;
use tracing::debug;

use crate::entry::{validate_path, IndexEntry};
use crate::error::{IndexError, IndexResult};

/// The staging index: which blob each tracked path has in the next commit.
///
/// Paths are unique and iterate in byte-wise order. A path and one of its
/// ancestors are never tracked at the same time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// Current on-disk format version.
    pub const VERSION: u32 = 1;

    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Insert or replace the entry for `entry.path`.
    ///
    /// Evicts a tracked file at any ancestor of the path and every entry
    /// under the path. Returns the evicted paths.
    pub fn upsert(&mut self, entry: IndexEntry) -> IndexResult<Vec<String>> {
        validate_path(&entry.path)?;

        let mut evicted = Vec::new();
        for (i, _) in entry.path.match_indices('/') {
            let ancestor = &entry.path[..i];
            if self.entries.remove(ancestor).is_some() {
                evicted.push(ancestor.to_string());
            }
        }
        evicted.extend(
            self.remove_under(&entry.path)
                .into_iter()
                .map(|removed| removed.path),
        );

        if !evicted.is_empty() {
            debug!(path = %entry.path, evicted = evicted.len(), "replaced conflicting entries");
        }
        self.entries.insert(entry.path.clone(), entry);
        Ok(evicted)
    }

    /// Remove the entry for exactly `path`.
    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        self.entries.remove(path)
    }

    /// Remove every entry strictly under the directory `dir`.
    pub fn remove_under(&mut self, dir: &str) -> Vec<IndexEntry> {
        let prefix = format!("{dir}/");
        let doomed: Vec<String> = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, _)| path.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|path| self.entries.remove(path))
            .collect()
    }

    /// Remove `path` itself or, failing that, everything under it.
    pub fn remove_path(&mut self, path: &str) -> IndexResult<Vec<IndexEntry>> {
        if let Some(entry) = self.remove(path) {
            return Ok(vec![entry]);
        }
        let removed = self.remove_under(path.trim_end_matches('/'));
        if removed.is_empty() {
            return Err(IndexError::PathNotFound(path.to_string()));
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Tree building
    // ---------------------------------------------------------------

    /// Write one tree per directory, bottom-up, and return the root tree id.
    pub fn write_tree(&self, store: &dyn ObjectStore) -> IndexResult<ObjectId> {
        let mut root = Dir::default();
        for entry in self.entries.values() {
            root.insert(entry)?;
        }
        let id = root.write(store)?;
        debug!(entries = self.len(), root = %id.short_hex(), "wrote tree from index");
        Ok(id)
    }
}

/// A directory level while building trees.
#[derive(Default)]
struct Dir<'a> {
    files: Vec<(&'a str, &'a IndexEntry)>,
    dirs: BTreeMap<&'a str, Dir<'a>>,
}

impl<'a> Dir<'a> {
    fn insert(&mut self, entry: &'a IndexEntry) -> IndexResult<()> {
        let mut node = self;
        let mut components = entry.path.split('/').peekable();
        while let Some(name) = components.next() {
            if components.peek().is_none() {
                if node.dirs.contains_key(name) {
                    return Err(IndexError::InvalidPath(entry.path.clone()));
                }
                node.files.push((name, entry));
            } else {
                if node.files.iter().any(|(file, _)| *file == name) {
                    return Err(IndexError::InvalidPath(entry.path.clone()));
                }
                node = node.dirs.entry(name).or_default();
            }
        }
        Ok(())
    }

    fn write(&self, store: &dyn ObjectStore) -> IndexResult<ObjectId> {
        let mut entries = Vec::with_capacity(self.files.len() + self.dirs.len());
        for (name, entry) in &self.files {
            entries.push(TreeEntry::new(entry.mode, *name, entry.object_id));
        }
        for (name, dir) in &self.dirs {
            entries.push(TreeEntry::new(EntryMode::Directory, *name, dir.write(store)?));
        }
        let tree = Tree::from_entries(entries)?;
        Ok(store.write(&Object::Tree(tree))?)
    }
}
