//! One compressed file per object, sharded by the first byte of the id.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toygit_crypto::ContentHasher;
use toygit_object::Object;
use toygit_types::ObjectId;
use tracing::{debug, trace};

use crate::compress::{Compressor, ZstdCompressor};
use crate::error::{StoreError, StoreResult};
use crate::traits::{ObjectStore, DEFAULT_MIN_PREFIX_LEN};

/// Hex characters used for the shard directory name.
const SHARD_LEN: usize = 2;

/// Loose object store rooted at an `objects/` directory.
///
/// Each object lives at `objects/<2 hex>/<62 hex>` and holds the compressed
/// canonical encoding. Files are written to a temp file inside the shard
/// directory, synced, then renamed into place. Only names of exactly 62 hex
/// characters are treated as objects, so an interrupted write never shows
/// up in lookups.
pub struct LooseObjectStore {
    root: PathBuf,
    compressor: Box<dyn Compressor>,
    min_prefix_len: usize,
}

impl LooseObjectStore {
    /// Open a store rooted at `root`. The directory is created lazily on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compressor: Box::new(ZstdCompressor::default()),
            min_prefix_len: DEFAULT_MIN_PREFIX_LEN,
        }
    }

    /// Replace the compressor used for reads and writes.
    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Box::new(compressor);
        self
    }

    /// Override the shortest prefix accepted by `resolve`.
    pub fn with_min_prefix_len(mut self, min: usize) -> Self {
        self.min_prefix_len = min;
        self
    }

    /// The `objects/` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the object with `id` is (or would be) stored.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (shard, rest) = hex.split_at(SHARD_LEN);
        self.root.join(shard).join(rest)
    }

    fn write_atomic(&self, shard: &Path, dest: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(shard)?;
        let mut tmp = NamedTempFile::new_in(shard)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|err| err.error)?;
        Ok(())
    }

    /// Object file names inside `shard` whose hex starts with `rest`.
    fn scan_shard(&self, shard: &str, rest: &str, out: &mut Vec<ObjectId>) -> StoreResult<()> {
        let entries = match fs::read_dir(self.root.join(shard)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_object_file_name(name) || !name.starts_with(rest) {
                continue;
            }
            if let Ok(id) = ObjectId::from_hex(&format!("{shard}{name}")) {
                out.push(id);
            }
        }
        Ok(())
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_object_file_name(name: &str) -> bool {
    name.len() == ObjectId::HEX_LEN - SHARD_LEN && is_lower_hex(name)
}

impl ObjectStore for LooseObjectStore {
    fn write(&self, object: &Object) -> StoreResult<ObjectId> {
        let bytes = object.encode();
        let id = ContentHasher::hash_canonical(&bytes);
        let path = self.object_path(&id);
        if path.is_file() {
            trace!(id = %id.short_hex(), "object already stored");
            return Ok(id);
        }

        let compressed = self.compressor.compress(&bytes)?;
        let shard = self.root.join(&id.to_hex()[..SHARD_LEN]);
        self.write_atomic(&shard, &path, &compressed)?;
        debug!(
            id = %id.short_hex(),
            kind = %object.kind(),
            size = bytes.len(),
            stored = compressed.len(),
            "wrote loose object"
        );
        Ok(id)
    }

    fn read_raw(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_hex()))
            }
            Err(e) => return Err(e.into()),
        };
        let bytes = self
            .compressor
            .decompress(&compressed)
            .map_err(|e| StoreError::corrupt(id, e.to_string()))?;
        let actual = ContentHasher::hash_canonical(&bytes);
        if actual != *id {
            return Err(StoreError::corrupt(id, format!("content hashes to {actual}")));
        }
        Ok(bytes)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn ids_with_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        let mut found = Vec::new();
        if prefix.len() >= SHARD_LEN {
            let (shard, rest) = prefix.split_at(SHARD_LEN);
            self.scan_shard(shard, rest, &mut found)?;
            return Ok(found);
        }

        let shards = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(e.into()),
        };
        for entry in shards {
            let entry = entry?;
            let name = entry.file_name();
            let Some(shard) = name.to_str() else { continue };
            if shard.len() == SHARD_LEN && is_lower_hex(shard) && shard.starts_with(prefix) {
                self.scan_shard(shard, "", &mut found)?;
            }
        }
        Ok(found)
    }

    fn min_prefix_len(&self) -> usize {
        self.min_prefix_len
    }
}

impl std::fmt::Debug for LooseObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LooseObjectStore")
            .field("root", &self.root)
            .field("min_prefix_len", &self.min_prefix_len)
            .finish()
    }
}
