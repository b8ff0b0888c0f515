use crate::tag::Kind;
use std::collections::TryReserveError;
use thiserror::Error;

/// A `DecodeError` together with the input position at which it occurred.
#[derive(Debug, PartialEq, Error)]
#[error("{inner} at input position {at}")]
pub struct DecoderError {
    #[source]
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum DecodeError {
    /// More bytes than currently available were requested. Recoverable: the
    /// caller may retry the decode once the missing bytes have arrived.
    #[error("unexpected end of buffer: needed {needed} bytes, {available} available")]
    Underflow { needed: usize, available: usize },
    #[error("unrecognized tag byte 0x{0:02x}")]
    Tag(u8),
    #[error("unrecognized element kind byte 0x{0:02x}")]
    Kind(u8),
    #[error("expected {expected} tag, found {found}")]
    UnexpectedTag {
        expected: &'static str,
        found: &'static str,
    },
    #[error("varint magnitude exceeds 64 bits")]
    Varint,
    #[error("integer magnitude {0} does not fit into the signed 64 bit range")]
    IntRange(u64),
    #[error("string slice was not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("duplicate key `{0}` in dict")]
    DuplicateKey(String),
    #[error("nesting exceeds maximum depth of {0}")]
    Depth(usize),
    #[error("invalid packed boolean byte 0x{0:02x}")]
    PackedBool(u8),
    #[error("length {0} exceeds addressable memory")]
    Length(u64),
    #[error("element kind mismatch: expected {expected}, encoded {found}")]
    Mismatch { expected: Kind, found: Kind },
    #[error("an allocation failed while decoding")]
    Allocation,
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }
}

impl From<TryReserveError> for DecodeError {
    fn from(_e: TryReserveError) -> DecodeError {
        DecodeError::Allocation
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum EncodeError {
    #[error("length {0} exceeds the wire format maximum")]
    Length(usize),
    #[error("nesting exceeds maximum depth of {0}")]
    Depth(usize),
    #[error("duplicate key `{0}` in dict")]
    DuplicateKey(String),
    #[error("an allocation failed while encoding")]
    Allocation,
}

impl From<TryReserveError> for EncodeError {
    fn from(_e: TryReserveError) -> EncodeError {
        EncodeError::Allocation
    }
}
