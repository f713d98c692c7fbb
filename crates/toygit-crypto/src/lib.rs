//! Hashing primitives for toygit.
//!
//! Object identity is the BLAKE3 hash of the canonical encoding
//! `"<kind> <len>\0<payload>"`. The header doubles as domain separation: a
//! blob and a tree with identical payloads never share an id.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod hasher;

pub use hasher::{checksum, ContentHasher, CHECKSUM_LEN};
