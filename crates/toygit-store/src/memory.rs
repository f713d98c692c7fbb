use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use toygit_crypto::ContentHasher;
use toygit_object::Object;
use toygit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ObjectStore, DEFAULT_MIN_PREFIX_LEN};

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Canonical encodings are held behind a
/// `RwLock` for safe concurrent access.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
    min_prefix_len: usize,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            min_prefix_len: DEFAULT_MIN_PREFIX_LEN,
        }
    }

    /// Override the shortest prefix accepted by `resolve`.
    pub fn with_min_prefix_len(mut self, min: usize) -> Self {
        self.min_prefix_len = min;
        self
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a sorted list of all object ids in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn write(&self, object: &Object) -> StoreResult<ObjectId> {
        let bytes = object.encode();
        let id = ContentHasher::hash_canonical(&bytes);
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(id).or_insert(bytes);
        Ok(id)
    }

    fn read_raw(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(id))
    }

    fn ids_with_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map
            .keys()
            .filter(|id| id.to_hex().starts_with(prefix))
            .copied()
            .collect())
    }

    fn min_prefix_len(&self) -> usize {
        self.min_prefix_len
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
