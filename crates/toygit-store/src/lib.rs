//! Content-addressed object storage for toygit.
//!
//! Objects are stored as their canonical encoding, keyed by the BLAKE3 hash
//! of those bytes. The on-disk backend keeps one compressed file per object
//! under `objects/<2 hex>/<62 hex>`, analogous to git's loose objects.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one zstd-compressed file per object
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes land in a temp file in the destination directory and are renamed
//!    into place, so a reader never sees a partial object.
//! 3. Every read re-hashes the stored bytes; a mismatch is corruption.
//! 4. Concurrent writers of the same object are harmless: they produce
//!    identical files.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod compress;
pub mod error;
pub mod loose;
pub mod memory;
pub mod traits;

pub use compress::{CompressionError, Compressor, ZstdCompressor};
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{ObjectStore, DEFAULT_MIN_PREFIX_LEN};
