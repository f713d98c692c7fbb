use toygit_types::{ObjectId, ObjectKind};

use crate::error::{ObjectError, ObjectResult, ParseError};
use crate::headers::HeaderBlock;
use crate::signature::Signature;

/// An annotated name for another object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The tagged object.
    pub target: ObjectId,
    /// Kind of the tagged object.
    pub target_kind: ObjectKind,
    pub name: String,
    pub tagger: Signature,
    pub message: String,
}

impl Tag {
    /// Build a tag. The name must be non-empty and free of whitespace.
    pub fn new(
        target: ObjectId,
        target_kind: ObjectKind,
        name: impl Into<String>,
        tagger: Signature,
        message: impl Into<String>,
    ) -> ObjectResult<Self> {
        let name = name.into();
        if !is_valid_tag_name(&name) {
            return Err(ObjectError::InvalidTagName(name));
        }
        Ok(Self {
            target,
            target_kind,
            name,
            tagger,
            message: message.into(),
        })
    }

    pub(crate) fn encode_payload(&self) -> Vec<u8> {
        self.render().into_bytes()
    }

    fn render(&self) -> String {
        format!(
            "object {}\ntype {}\ntag {}\ntagger {}\n\n{}",
            self.target, self.target_kind, self.name, self.tagger, self.message
        )
    }

    pub(crate) fn parse_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut block = HeaderBlock::split(ObjectKind::Tag, payload)?;

        let target = block.expect("object")?;
        let target = block.object_id(target)?;
        let kind = block.expect("type")?;
        let target_kind = kind
            .parse::<ObjectKind>()
            .map_err(|e| ParseError::body(ObjectKind::Tag, e.to_string()))?;
        let name = block.expect("tag")?;
        if !is_valid_tag_name(name) {
            return Err(ParseError::body(
                ObjectKind::Tag,
                format!("invalid tag name {name:?}"),
            ));
        }
        let tagger = block.expect("tagger")?;
        let tagger = block.signature(tagger)?;
        let message = block.finish()?;

        Ok(Self {
            target,
            target_kind,
            name: name.to_string(),
            tagger,
            message: message.to_string(),
        })
    }

    /// Header lines, a blank line, then the message.
    pub fn pretty_print(&self) -> String {
        self.render()
    }
}

fn is_valid_tag_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}
