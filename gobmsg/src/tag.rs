//! Every encoded value starts with a one-byte tag naming its kind; decoding
//! starts by reading that byte back. The mapping is fixed and versionless,
//! so both ends of a connection can rely on it without negotiation. Booleans
//! carry their value in the tag itself and have no payload bytes at all.

use crate::error::DecodeError;
use std::convert::TryFrom;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    True = 0x01,
    False = 0x02,
    /// Followed by the magnitude as a varint.
    PosInt = 0x03,
    /// Followed by the magnitude as a varint. A zero magnitude decodes to 0,
    /// the same value `PosInt` zero decodes to.
    NegInt = 0x04,
    /// Followed by eight payload bytes, IEEE-754 double, big-endian.
    Float = 0x05,
    /// Followed by a varint byte length and that many raw bytes.
    Bytes = 0x06,
    /// Like `Bytes` but the payload must be valid UTF-8.
    Text = 0x07,
    /// Followed by a varint element count and that many full values.
    List = 0x08,
    /// Followed by a varint pair count; each pair is a `Text`-encoded key
    /// and a full value, in insertion order.
    Dict = 0x09,
    /// Followed by a `Kind` sub-tag, a varint element count and the packed
    /// payloads without per-element tags.
    Array = 0x0a,
}

impl Tag {
    /// Returns the mnemonic of the tag. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Tag::True => "True",
            Tag::False => "False",
            Tag::PosInt => "PosInt",
            Tag::NegInt => "NegInt",
            Tag::Float => "Float",
            Tag::Bytes => "Bytes",
            Tag::Text => "Text",
            Tag::List => "List",
            Tag::Dict => "Dict",
            Tag::Array => "Array",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, DecodeError> {
        match v {
            x if x == Tag::True as u8 => Ok(Tag::True),
            x if x == Tag::False as u8 => Ok(Tag::False),
            x if x == Tag::PosInt as u8 => Ok(Tag::PosInt),
            x if x == Tag::NegInt as u8 => Ok(Tag::NegInt),
            x if x == Tag::Float as u8 => Ok(Tag::Float),
            x if x == Tag::Bytes as u8 => Ok(Tag::Bytes),
            x if x == Tag::Text as u8 => Ok(Tag::Text),
            x if x == Tag::List as u8 => Ok(Tag::List),
            x if x == Tag::Dict as u8 => Ok(Tag::Dict),
            x if x == Tag::Array as u8 => Ok(Tag::Array),
            _ => Err(DecodeError::Tag(v)),
        }
    }
}

/// The element kind of a packed array. Only primitive kinds are admissible;
/// composites always go through `List`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// One byte per element, 0x00 or 0x01.
    Bool = 0x01,
    /// One zigzag varint per element.
    Int = 0x02,
    /// One plain varint per element.
    Uint = 0x03,
    /// Eight big-endian bytes per element.
    Float = 0x04,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match *self {
            Kind::Bool => "Bool",
            Kind::Int => "Int",
            Kind::Uint => "Uint",
            Kind::Float => "Float",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Kind {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, DecodeError> {
        match v {
            x if x == Kind::Bool as u8 => Ok(Kind::Bool),
            x if x == Kind::Int as u8 => Ok(Kind::Int),
            x if x == Kind::Uint as u8 => Ok(Kind::Uint),
            x if x == Kind::Float as u8 => Ok(Kind::Float),
            _ => Err(DecodeError::Kind(v)),
        }
    }
}
