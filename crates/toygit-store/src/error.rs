use crate::compress::CompressionError;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object matches the given id or prefix.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An abbreviated id matches more than one object.
    #[error("ambiguous object prefix {prefix}: candidates {}", candidates.join(", "))]
    AmbiguousPrefix {
        prefix: String,
        candidates: Vec<String>,
    },

    /// An abbreviated id is shorter than the configured minimum.
    #[error("object prefix {prefix:?} is too short (minimum {min} characters)")]
    PrefixTooShort { prefix: String, min: usize },

    /// Stored bytes fail to decompress, hash to a different id, or decode.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: String, reason: String },

    /// Compression failed while writing.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn corrupt(id: &toygit_types::ObjectId, reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            id: id.to_hex(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
