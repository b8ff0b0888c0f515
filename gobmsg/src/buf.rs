//! The `Buffer` owns the bytes of an encoded message. It keeps a write
//! cursor (the logical length, writes always append) and an independent read
//! cursor, so one allocation serves repeated encode/decode cycles: encode a
//! message, decode it, `reset` and start over without reallocating.
//!
//! Growth is explicit: `reserve` at least doubles the current capacity, or
//! grows to the exact size needed when a single request is larger than that.
//! Storage never shrinks. Allocation failures surface as errors instead of
//! aborting, which matters when length prefixes come from untrusted input.
//!
//! A `Buffer` is deliberately not synchronized; the expected pattern is one
//! buffer per logical message stream, owned by one thread at a time, with
//! handoff only between complete encode or decode calls.

use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::tag::Kind;
use crate::value::{Decoder, Encoder, Value};

#[derive(Debug, Default)]
pub struct Buffer {
    data: Vec<u8>,
    rpos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self { data: Vec::new(), rpos: 0 }
    }

    /// Creates a buffer with an initial capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), rpos: 0 }
    }

    /// Wraps already-encoded bytes for decoding, read cursor at the start.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, rpos: 0 }
    }

    /// Ensures at least `additional` more bytes are writable. Grows by at
    /// least doubling the current capacity, or to the exact size needed if
    /// that is larger. Never shrinks.
    pub fn reserve(&mut self, additional: usize) -> Result<(), EncodeError> {
        let free = self.data.capacity() - self.data.len();
        if free >= additional {
            return Ok(());
        }
        let needed = self
            .data
            .len()
            .checked_add(additional)
            .ok_or(EncodeError::Length(additional))?;
        let target = needed.max(self.data.capacity().saturating_mul(2));
        self.data.try_reserve_exact(target - self.data.len())?;
        Ok(())
    }

    /// Appends `bytes` at the write cursor. Space must have been reserved.
    pub fn write(&mut self, bytes: &[u8]) {
        debug_assert!(self.data.capacity() - self.data.len() >= bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Returns a view of the next `n` bytes at the read cursor and advances
    /// past them. Fails with underflow when fewer than `n` bytes remain.
    pub fn read(&mut self, n: usize) -> Result<&[u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Underflow { needed: n, available: self.remaining() });
        }
        self.rpos += n;
        Ok(&self.data[self.rpos - n..self.rpos])
    }

    /// Forgets the contents. Capacity is retained for reuse.
    pub fn reset(&mut self) {
        self.data.clear();
        self.rpos = 0;
    }

    /// Bytes left between the read cursor and the end of the content.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.rpos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The current read cursor.
    pub fn position(&self) -> usize {
        self.rpos
    }

    /// Moves the read cursor, clamped to the content length. Useful to
    /// re-read a message or to skip past a region the caller knows how to
    /// resynchronize over.
    pub fn seek(&mut self, pos: usize) {
        self.rpos = pos.min(self.data.len());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Appends one encoded value. Returns the number of written bytes.
    pub fn encode(&mut self, value: &Value) -> Result<usize, EncodeError> {
        Encoder::encode(value, self)
    }

    /// Decodes one value at the read cursor. The cursor advances past the
    /// consumed bytes even when the decode fails, so the reported error
    /// position is where the cursor comes to rest.
    pub fn decode(&mut self) -> Result<Value<'_>, DecoderError> {
        let Self { data, rpos } = self;
        let start = *rpos;
        match Decoder::decode(&data[start..]) {
            Ok((value, consumed)) => {
                *rpos = start + consumed;
                Ok(value)
            }
            Err(e) => {
                *rpos = start + e.position();
                let at = start + e.position();
                Err(e.into_inner().at(at))
            }
        }
    }

    /// Decodes one packed array, checking the encoded element kind against
    /// the caller's expectation. The packed payload alone cannot be told
    /// apart from another kind of the same width, so the hint is mandatory.
    pub fn decode_array(&mut self, expected: Kind) -> Result<Value<'_>, DecoderError> {
        let Self { data, rpos } = self;
        let start = *rpos;
        match Decoder::decode_array(&data[start..], expected) {
            Ok((value, consumed)) => {
                *rpos = start + consumed;
                Ok(value)
            }
            Err(e) => {
                *rpos = start + e.position();
                let at = start + e.position();
                Err(e.into_inner().at(at))
            }
        }
    }
}
