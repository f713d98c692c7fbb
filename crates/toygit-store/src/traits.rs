use toygit_object::{decode, Object};
use toygit_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Shortest abbreviated id accepted by [`ObjectStore::resolve`] unless a
/// backend is configured otherwise.
pub const DEFAULT_MIN_PREFIX_LEN: usize = 4;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same object always produces
///   the same id, so writing it again is a no-op.
/// - Reads return exactly the bytes that hash to the requested id, or fail
///   with [`StoreError::CorruptObject`].
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Write an object and return its content-addressed id.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &Object) -> StoreResult<ObjectId>;

    /// Read the canonical encoding of an object, verified against `id`.
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist.
    fn read_raw(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Every stored id whose hex form starts with `prefix`.
    ///
    /// `prefix` is lowercase hex and at most 64 characters long.
    fn ids_with_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>>;

    /// Shortest prefix [`resolve`](Self::resolve) accepts.
    fn min_prefix_len(&self) -> usize {
        DEFAULT_MIN_PREFIX_LEN
    }

    /// Read and decode an object by id.
    fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        let raw = self.read_raw(id)?;
        decode(&raw).map_err(|e| StoreError::corrupt(id, e.to_string()))
    }

    /// Resolve a full or abbreviated hex id (either case) to a stored id.
    fn resolve(&self, prefix: &str) -> StoreResult<ObjectId> {
        let min = self.min_prefix_len();
        if prefix.len() < min {
            return Err(StoreError::PrefixTooShort {
                prefix: prefix.to_string(),
                min,
            });
        }
        if prefix.len() > ObjectId::HEX_LEN || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::NotFound(prefix.to_string()));
        }

        let normalized = prefix.to_ascii_lowercase();
        let mut candidates = self.ids_with_prefix(&normalized)?;
        match candidates.len() {
            0 => Err(StoreError::NotFound(prefix.to_string())),
            1 => Ok(candidates.remove(0)),
            _ => {
                candidates.sort();
                Err(StoreError::AmbiguousPrefix {
                    prefix: prefix.to_string(),
                    candidates: candidates.iter().map(ObjectId::to_hex).collect(),
                })
            }
        }
    }

    /// Write multiple objects and return their ids in order.
    fn write_batch(&self, objects: &[Object]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
