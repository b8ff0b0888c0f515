//! Variable-length unsigned integers carry every magnitude and length prefix
//! in the format. Each byte holds seven payload bits plus a continuation bit,
//! least-significant group first; the final byte has the continuation bit
//! clear. Small magnitudes, the common case, take a single byte.
//!
//! The encoder never emits a trailing zero group, so its output is minimal.
//! The decoder accepts non-minimal encodings (a purposefully padded zero
//! group still decodes), but rejects anything that would carry more than 64
//! bits of magnitude.
//!
//! Signed elements inside packed arrays use the zigzag mapping: bit 0 says
//! whether the remaining bits should be complemented upon receipt, so small
//! negative numbers stay small on the wire.

use crate::buf::Buffer;
use crate::error::{DecodeError, EncodeError};

/// The longest possible encoding of a 64 bit magnitude: nine full groups
/// plus one final bit.
pub const MAX_LEN: usize = 10;

/// Appends `v` to the buffer. Returns the number of written bytes.
pub fn put_u64(buf: &mut Buffer, mut v: u64) -> Result<usize, EncodeError> {
    let mut tmp = [0u8; MAX_LEN];
    let mut n = 0;
    loop {
        let group = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            tmp[n] = group;
            n += 1;
            break;
        }
        tmp[n] = group | 0x80;
        n += 1;
    }
    buf.reserve(n)?;
    buf.write(&tmp[..n]);
    Ok(n)
}

/// Decodes one varint from the start of `buf`. Returns the value and the
/// number of consumed bytes.
pub fn get_u64(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value = 0u64;
    for i in 0..MAX_LEN {
        let byte = match buf.get(i) {
            Some(b) => *b,
            None => {
                return Err(DecodeError::Underflow {
                    needed: i + 1,
                    available: buf.len(),
                })
            }
        };
        let group = (byte & 0x7f) as u64;
        // the tenth group may only contribute the single remaining bit
        if i == MAX_LEN - 1 && group > 1 {
            return Err(DecodeError::Varint);
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DecodeError::Varint)
}

pub fn put_i64(buf: &mut Buffer, v: i64) -> Result<usize, EncodeError> {
    put_u64(buf, zigzag(v))
}

pub fn get_i64(buf: &[u8]) -> Result<(i64, usize), DecodeError> {
    get_u64(buf).map(|(u, c)| (unzigzag(u), c))
}

#[inline]
pub fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
pub fn unzigzag(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}
