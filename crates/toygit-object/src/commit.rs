use toygit_types::{ObjectId, ObjectKind};

use crate::error::{ObjectError, ObjectResult, ParseError};
use crate::headers::HeaderBlock;
use crate::signature::Signature;

/// A snapshot of a tree with its history and authorship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Parent commits, in order. Empty for a root commit.
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// Build a commit. The tree id must not be null.
    pub fn new(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> ObjectResult<Self> {
        if tree.is_null() {
            return Err(ObjectError::NullTree);
        }
        Ok(Self {
            tree,
            parents,
            author,
            committer,
            message: message.into(),
        })
    }

    /// Returns `true` if this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub(crate) fn encode_payload(&self) -> Vec<u8> {
        self.render().into_bytes()
    }

    fn render(&self) -> String {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    pub(crate) fn parse_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut block = HeaderBlock::split(ObjectKind::Commit, payload)?;

        let tree = block.expect("tree")?;
        let tree = block.object_id(tree)?;
        if tree.is_null() {
            return Err(ParseError::body(ObjectKind::Commit, "tree id is null"));
        }
        let mut parents = Vec::new();
        while let Some(parent) = block.optional("parent") {
            parents.push(block.object_id(parent)?);
        }
        let author = block.expect("author")?;
        let author = block.signature(author)?;
        let committer = block.expect("committer")?;
        let committer = block.signature(committer)?;
        let message = block.finish()?;

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            message: message.to_string(),
        })
    }

    /// Header lines, a blank line, then the message.
    pub fn pretty_print(&self) -> String {
        self.render()
    }
}
