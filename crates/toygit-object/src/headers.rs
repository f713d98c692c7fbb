//! Shared parsing for the `key value` header block of commits and tags.

use toygit_types::{ObjectId, ObjectKind};

use crate::error::ParseError;
use crate::signature::Signature;

/// A payload split into its header lines and message.
pub(crate) struct HeaderBlock<'a> {
    kind: ObjectKind,
    lines: std::iter::Peekable<std::str::Split<'a, char>>,
    pub(crate) message: &'a str,
}

impl<'a> HeaderBlock<'a> {
    pub(crate) fn split(kind: ObjectKind, payload: &'a [u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| ParseError::body(kind, "payload is not UTF-8"))?;
        let (head, message) = text
            .split_once("\n\n")
            .ok_or_else(|| ParseError::body(kind, "missing blank line before message"))?;
        Ok(Self {
            kind,
            lines: head.split('\n').peekable(),
            message,
        })
    }

    /// Take the next line, which must be `key value`.
    pub(crate) fn expect(&mut self, key: &str) -> Result<&'a str, ParseError> {
        let line = self
            .lines
            .next()
            .ok_or_else(|| ParseError::body(self.kind, format!("missing {key} line")))?;
        match line.split_once(' ') {
            Some((k, value)) if k == key => Ok(value),
            _ => Err(ParseError::body(
                self.kind,
                format!("expected {key} line, found {line:?}"),
            )),
        }
    }

    /// Take the next line only if it starts with `key `.
    pub(crate) fn optional(&mut self, key: &str) -> Option<&'a str> {
        let line = self.lines.peek()?;
        let value = line.strip_prefix(key)?.strip_prefix(' ')?;
        self.lines.next();
        Some(value)
    }

    pub(crate) fn finish(mut self) -> Result<&'a str, ParseError> {
        match self.lines.next() {
            None => Ok(self.message),
            Some(line) => Err(ParseError::body(
                self.kind,
                format!("unexpected header {line:?}"),
            )),
        }
    }

    pub(crate) fn object_id(&self, raw: &str) -> Result<ObjectId, ParseError> {
        let id = ObjectId::from_hex(raw).map_err(|e| ParseError::body(self.kind, e.to_string()))?;
        if id.to_hex() != raw {
            return Err(ParseError::body(self.kind, format!("id {raw:?} is not lowercase")));
        }
        Ok(id)
    }

    pub(crate) fn signature(&self, raw: &str) -> Result<Signature, ParseError> {
        Signature::parse(raw).map_err(|reason| ParseError::body(self.kind, reason))
    }
}
