//! Views of a stored object for `cat-file` style inspection.

use std::fmt;

use toygit_object::Object;
use toygit_types::ObjectKind;

/// Which view of an object to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InspectMode {
    /// The object kind.
    Type,
    /// Payload length in bytes.
    Size,
    /// Human-readable rendering.
    Pretty,
    /// The payload bytes as stored.
    #[default]
    Raw,
}

/// The result of inspecting an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inspection {
    Type(ObjectKind),
    Size(u64),
    Pretty(String),
    Raw(Vec<u8>),
}

impl Inspection {
    pub fn of(object: &Object, mode: InspectMode) -> Self {
        match mode {
            InspectMode::Type => Self::Type(object.kind()),
            InspectMode::Size => Self::Size(object.size()),
            InspectMode::Pretty => Self::Pretty(object.pretty_print()),
            InspectMode::Raw => Self::Raw(object.payload().into_owned()),
        }
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(kind) => write!(f, "{kind}"),
            Self::Size(size) => write!(f, "{size}"),
            Self::Pretty(text) => f.write_str(text),
            Self::Raw(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
