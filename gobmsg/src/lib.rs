//! A compact, self-describing binary message encoding in the spirit of Go's
//! `gob` wire format: every value carries a one-byte tag, integers travel as
//! variable-length magnitudes, and homogeneous numeric data can be packed
//! densely without per-element tags. Encoding appends to a growable
//! [`Buffer`] with independent write and read cursors, so one allocation is
//! reused across messages.
//!
//! # A note on `usize`
//!
//! Length prefixes on the wire are 64 bit unsigned integers. Rust however
//! uses the architecture-dependent `usize` for slice indexing. On
//! architectures where `usize` is smaller than `u64`, some valid messages
//! cannot be decoded since there would be no way to index the containers; a
//! `DecodeError::Length` is raised in these instances.
//!
//! # A note on dicts
//!
//! `Value::Dict` uses a `Vec` of key-value pairs internally: the format
//! guarantees unique keys and preserves insertion order, but does not
//! require sortedness, and a `Vec` keeps re-encoded messages byte-identical
//! to their source. Key uniqueness is enforced on encode and decode alike.
//!
//! # Examples
//!
//! ```
//! use gobmsg::*;
//! use std::borrow::Cow;
//!
//! let mut buf = Buffer::new();
//! let value = Value::Dict(vec![(Cow::Borrowed("key"), Value::Text(Cow::Borrowed("value")))]);
//! buf.encode(&value).unwrap();
//! assert_eq!(buf.as_slice(), [
//!     0x09, // Dict
//!     0x01, // of one pair
//!     0x07, // Text of length 3
//!     0x03,
//!     0x6b, // 'k'
//!     0x65, // 'e'
//!     0x79, // 'y'
//!     0x07, // Text of length 5
//!     0x05,
//!     0x76, // 'v'
//!     0x61, // 'a'
//!     0x6c, // 'l'
//!     0x75, // 'u'
//!     0x65, // 'e'
//! ]);
//! let decoded = buf.decode().unwrap();
//! assert_eq!(value, decoded);
//! ```
//!
//! Bulk numeric data is cheaper as a packed array than as a list of tagged
//! scalars; the element kind is stated once, then payloads follow back to
//! back:
//!
//! ```
//! use gobmsg::*;
//!
//! let mut buf = Buffer::new();
//! buf.encode(&Value::Array(Packed::Int(vec![1, 16, 32, 64, 128]))).unwrap();
//! // the packed payload cannot be told apart from another same-width kind,
//! // so decoding states the expected element kind explicitly
//! let decoded = buf.decode_array(Kind::Int).unwrap();
//! assert_eq!(Value::Array(Packed::Int(vec![1, 16, 32, 64, 128])), decoded);
//! ```

mod buf;
mod error;
mod tag;
pub mod varint;
mod value;

pub use buf::*;
pub use error::*;
pub use tag::*;
pub use value::*;
