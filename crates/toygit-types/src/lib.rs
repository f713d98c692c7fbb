//! Foundation types for toygit.
//!
//! Every other toygit crate depends on `toygit-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed identifier (32-byte BLAKE3 digest)
//! - [`ObjectKind`]: the closed set of object kinds: blob, tree, commit, tag

pub mod error;
pub mod kind;
pub mod object;

pub use error::TypeError;
pub use kind::ObjectKind;
pub use object::ObjectId;
