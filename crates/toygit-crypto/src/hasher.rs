use toygit_types::{ObjectId, ObjectKind};

/// Width of a [`checksum`] in bytes.
pub const CHECKSUM_LEN: usize = 32;

/// Kind-framed BLAKE3 content hasher.
///
/// Each hasher carries the object kind whose canonical header
/// (`"<kind> <len>\0"`) is fed to BLAKE3 ahead of the payload. Hashing the
/// header and payload in one streaming pass gives the same digest as hashing
/// the concatenated canonical bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    kind: ObjectKind,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self::new(ObjectKind::Blob);
    /// Hasher for tree objects.
    pub const TREE: Self = Self::new(ObjectKind::Tree);
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self::new(ObjectKind::Commit);
    /// Hasher for tag objects.
    pub const TAG: Self = Self::new(ObjectKind::Tag);

    /// Create a hasher for the given kind.
    pub const fn new(kind: ObjectKind) -> Self {
        Self { kind }
    }

    /// The canonical header for a payload of `len` bytes.
    pub fn header(&self, len: usize) -> Vec<u8> {
        format!("{} {}\0", self.kind, len).into_bytes()
    }

    /// Hash a payload under this hasher's kind.
    pub fn hash(&self, payload: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.header(payload.len()));
        hasher.update(payload);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that a payload produces the expected object ID.
    pub fn verify(&self, payload: &[u8], expected: &ObjectId) -> bool {
        self.hash(payload) == *expected
    }

    /// Hash bytes that already carry their canonical header.
    pub fn hash_canonical(canonical: &[u8]) -> ObjectId {
        ObjectId::from_hash(Self::raw_hash(canonical))
    }

    /// Raw BLAKE3 hash without any framing (for low-level use).
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        *blake3::hash(data).as_bytes()
    }

    /// The kind this hasher frames payloads with.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
}

/// Integrity checksum for files that are not objects (the staging index).
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    ContentHasher::raw_hash(data)
}
