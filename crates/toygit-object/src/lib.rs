//! Object model for toygit.
//!
//! Typed representations of the four object kinds and their canonical
//! encoding. Nothing in this crate touches storage: objects are transient
//! views that the object store reconstructs on demand.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- a tree snapshot with parents, authorship and a message
//! - [`Tag`] -- an annotated name pointing at another object
//!
//! # Canonical Encoding
//!
//! Every object encodes as `"<kind> <len>\0<payload>"`. [`encode`] and
//! [`decode`] are exact inverses: [`decode`] rejects any byte string that
//! [`encode`] would not produce, so a decoded object always re-encodes to the
//! bytes it came from.

pub mod codec;
pub mod commit;
pub mod error;
mod headers;
pub mod mode;
pub mod object;
pub mod signature;
pub mod tag;
pub mod tree;

pub use codec::{decode, decode_payload, encode, identify, parse_header, Header};
pub use commit::Commit;
pub use error::{ObjectError, ObjectResult, ParseError};
pub use mode::EntryMode;
pub use object::{
    blob_from_bytes, commit_from_fields, tag_from_fields, tree_from_entries, Blob, Object,
};
pub use signature::Signature;
pub use tag::Tag;
pub use tree::{Tree, TreeEntry};
pub use toygit_types::{ObjectId, ObjectKind};
