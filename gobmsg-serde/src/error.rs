use gobmsg::{DecodeError, EncodeError};
use serde::{de, ser};
use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// An `Error` together with the input position at which it occurred.
#[derive(Debug, Error)]
#[error("{inner} at input position {at}")]
pub struct DeserializationError {
    #[source]
    inner: Error,
    at: usize,
}

impl DeserializationError {
    pub fn into_inner(self) -> Error {
        self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }
}

#[derive(Debug, Error)]
pub enum Error {
    // Decode
    #[error("decoding error: {0}")]
    Decode(#[from] DecodeError),
    #[error("trailing bytes in input")]
    Trailing,
    #[error("unexpected input: expected one of ({}), found {1}", .0.join(", "))]
    Unexpected(&'static [&'static str], &'static str),
    #[error("integer didn't fit into the target type")]
    Int,
    // Encode
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),
    #[error("sequence length must be known up front")]
    Length,
    #[error("map keys must be strings. Maybe use crate `serde_with` to transform the map into a vec of tuples")]
    KeyType,
    #[error("the wire format cannot represent {0}")]
    Unrepresentable(&'static str),
    // Both
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn at(self, at: usize) -> DeserializationError {
        DeserializationError { inner: self, at }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}
