use std::borrow::Cow;

use toygit_types::{ObjectId, ObjectKind};

use crate::codec;
use crate::commit::Commit;
use crate::error::ObjectResult;
use crate::signature::Signature;
use crate::tag::Tag;
use crate::tree::{Tree, TreeEntry};

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The content as UTF-8 text, or lowercase hex when it is not valid UTF-8.
    pub fn pretty_print(&self) -> String {
        match std::str::from_utf8(&self.data) {
            Ok(text) => text.to_string(),
            Err(_) => hex::encode(&self.data),
        }
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any stored object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    /// The kind of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }

    /// The payload bytes (the canonical encoding minus its header).
    pub fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Blob(blob) => Cow::Borrowed(&blob.data),
            Self::Tree(tree) => Cow::Owned(tree.encode_payload()),
            Self::Commit(commit) => Cow::Owned(commit.encode_payload()),
            Self::Tag(tag) => Cow::Owned(tag.encode_payload()),
        }
    }

    /// Payload size in bytes, as declared in the canonical header.
    pub fn size(&self) -> u64 {
        self.payload().len() as u64
    }

    /// Content-addressed identifier of this object.
    pub fn id(&self) -> ObjectId {
        codec::identify(self.kind(), &self.payload())
    }

    /// Canonical encoding, `"<kind> <len>\0<payload>"`.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Human-readable rendering for inspection tooling.
    pub fn pretty_print(&self) -> String {
        match self {
            Self::Blob(blob) => blob.pretty_print(),
            Self::Tree(tree) => tree.pretty_print(),
            Self::Commit(commit) => commit.pretty_print(),
            Self::Tag(tag) => tag.pretty_print(),
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Self::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Self::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}

impl From<Tag> for Object {
    fn from(tag: Tag) -> Self {
        Self::Tag(tag)
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

/// A blob holding `data`.
pub fn blob_from_bytes(data: impl Into<Vec<u8>>) -> Object {
    Object::Blob(Blob::new(data.into()))
}

/// A tree holding `entries` in canonical order. Duplicate or invalid names
/// are rejected.
pub fn tree_from_entries(entries: Vec<TreeEntry>) -> ObjectResult<Object> {
    Tree::from_entries(entries).map(Object::Tree)
}

/// A commit of `tree`. `parents` may be empty for a root commit.
pub fn commit_from_fields(
    tree: ObjectId,
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    message: impl Into<String>,
) -> ObjectResult<Object> {
    Commit::new(tree, parents, author, committer, message).map(Object::Commit)
}

/// A tag named `name` pointing at `target`.
pub fn tag_from_fields(
    target: ObjectId,
    target_kind: ObjectKind,
    name: impl Into<String>,
    tagger: Signature,
    message: impl Into<String>,
) -> ObjectResult<Object> {
    Tag::new(target, target_kind, name, tagger, message).map(Object::Tag)
}
