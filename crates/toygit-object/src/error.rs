use toygit_types::ObjectKind;

/// Errors from decoding canonical object bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The `<kind> <len>\0` prefix is missing, unrecognized, or disagrees
    /// with the number of payload bytes.
    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    /// The payload cannot be split into the fields its kind requires.
    #[error("invalid {kind} body: {reason}")]
    InvalidBody { kind: ObjectKind, reason: String },
}

impl ParseError {
    pub(crate) fn body(kind: ObjectKind, reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            kind,
            reason: reason.into(),
        }
    }
}

/// Errors from building objects out of fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Two tree entries share a name.
    #[error("duplicate tree entry: {0}")]
    DuplicateEntry(String),

    /// A tree entry name is empty, `.`/`..`, or contains `/` or NUL.
    #[error("invalid tree entry name: {0:?}")]
    InvalidEntryName(String),

    /// A signature field contains characters the text form cannot carry.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A commit was built without a tree.
    #[error("commit requires a non-null tree id")]
    NullTree,

    /// A tag name is empty or contains whitespace.
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),
}

/// Result alias for object construction.
pub type ObjectResult<T> = Result<T, ObjectError>;
