//! The atom of a message is the `Value`. Values are encoded on wire as a
//! one-byte tag followed by the payload the tag calls for; composites nest
//! recursively, so any tree of lists and dicts round-trips without a schema.
//! Homogeneous bulk data goes through `Packed` arrays instead, which drop
//! the per-element tags and pack the payloads densely.

use crate::buf::Buffer;
use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::tag::{Kind, Tag};
use crate::varint;
use std::borrow::Cow;
use std::collections::HashSet;
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::str::from_utf8;

/// Default bound on the nesting depth of lists and dicts. Each nested value
/// consumes at least one input byte, so the buffer length already bounds
/// recursion implicitly; this limit bounds stack usage against adversarial
/// input long before that.
pub const MAX_DEPTH: usize = 64;

/// The possible values according to the wire format's data model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
    List(Vec<Value<'a>>),
    /// Key/value pairs in insertion order. Keys are unique; this is a wire
    /// format guarantee, enforced on encode and decode alike.
    Dict(Vec<(Cow<'a, str>, Value<'a>)>),
    Array(Packed),
}

/// A homogeneous array of one primitive kind. Holding the elements in a
/// dedicated enum makes mixed-kind arrays unrepresentable rather than
/// merely invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum Packed {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Uint(Vec<u64>),
    Float(Vec<f64>),
}

impl Packed {
    pub fn kind(&self) -> Kind {
        match *self {
            Packed::Bool(_) => Kind::Bool,
            Packed::Int(_) => Kind::Int,
            Packed::Uint(_) => Kind::Uint,
            Packed::Float(_) => Kind::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Packed::Bool(v) => v.len(),
            Packed::Int(v) => v.len(),
            Packed::Uint(v) => v.len(),
            Packed::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> Value<'a> {
    /// Returns the name of the value's kind. This is useful for error
    /// messages.
    pub fn typename(&self) -> &'static str {
        match *self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Array(_) => "array",
        }
    }

    /// Copies any borrowed data so the value no longer references the
    /// buffer it was decoded from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Bool(v) => Value::Bool(v),
            Value::Int(v) => Value::Int(v),
            Value::Float(v) => Value::Float(v),
            Value::Bytes(v) => Value::Bytes(Cow::Owned(v.into_owned())),
            Value::Text(v) => Value::Text(Cow::Owned(v.into_owned())),
            Value::List(v) => Value::List(v.into_iter().map(Value::into_owned).collect()),
            Value::Dict(v) => Value::Dict(
                v.into_iter()
                    .map(|(k, val)| (Cow::Owned(k.into_owned()), val.into_owned()))
                    .collect(),
            ),
            Value::Array(p) => Value::Array(p),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn escaped(v: &str) -> String {
            v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
        }
        match self {
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "${}", v),
            Value::Bytes(v) => {
                f.write_str("x\"")?;
                for b in v.iter() {
                    write!(f, "{:02x}", b)?;
                }
                f.write_str("\"")
            }
            Value::Text(v) => write!(f, "\"{}\"", escaped(v)),
            Value::List(v) => {
                f.write_str("[")?;
                for (i, e) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                f.write_str("]")
            }
            Value::Dict(v) => {
                f.write_str("{")?;
                for (i, (k, e)) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{}\": {}", escaped(k), e)?;
                }
                f.write_str("}")
            }
            Value::Array(p) => {
                write!(f, "{}<", p.kind().name().to_lowercase())?;
                match p {
                    Packed::Bool(v) => {
                        for (i, e) in v.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", e)?;
                        }
                    }
                    Packed::Int(v) => {
                        for (i, e) in v.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", e)?;
                        }
                    }
                    Packed::Uint(v) => {
                        for (i, e) in v.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", e)?;
                        }
                    }
                    Packed::Float(v) => {
                        for (i, e) in v.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", e)?;
                        }
                    }
                }
                f.write_str(">")
            }
        }
    }
}

/// Encodes values into a `Buffer`. All growth goes through the buffer's
/// `reserve`; the encoder never touches the backing storage directly.
pub struct Encoder;

impl Encoder {
    /// Encode a value into the given buffer. The resulting `usize` is the
    /// amount of bytes that got written.
    pub fn encode(value: &Value, buf: &mut Buffer) -> Result<usize, EncodeError> {
        Self::encode_value(value, buf, 0)
    }

    fn encode_value(value: &Value, buf: &mut Buffer, depth: usize) -> Result<usize, EncodeError> {
        if depth == MAX_DEPTH {
            return Err(EncodeError::Depth(MAX_DEPTH));
        }
        match value {
            Value::Bool(true) => Self::put_tag(buf, Tag::True),
            Value::Bool(false) => Self::put_tag(buf, Tag::False),
            Value::Int(v) => {
                let tag = if *v < 0 { Tag::NegInt } else { Tag::PosInt };
                let c = Self::put_tag(buf, tag)?;
                Ok(c + varint::put_u64(buf, v.unsigned_abs())?)
            }
            Value::Float(v) => {
                let c = Self::put_tag(buf, Tag::Float)?;
                buf.reserve(8)?;
                buf.write(&v.to_be_bytes());
                Ok(c + 8)
            }
            Value::Bytes(v) => {
                let mut c = Self::put_tag(buf, Tag::Bytes)?;
                c += Self::put_len(buf, v.len())?;
                buf.reserve(v.len())?;
                buf.write(v);
                Ok(c + v.len())
            }
            Value::Text(v) => Self::encode_text(v, buf),
            Value::List(inner) => {
                let mut c = Self::put_tag(buf, Tag::List)?;
                c += Self::put_len(buf, inner.len())?;
                for field in inner.iter() {
                    c += Self::encode_value(field, buf, depth + 1)?;
                }
                Ok(c)
            }
            Value::Dict(inner) => {
                let mut c = Self::put_tag(buf, Tag::Dict)?;
                c += Self::put_len(buf, inner.len())?;
                let mut seen = HashSet::with_capacity(inner.len());
                for (key, val) in inner.iter() {
                    if !seen.insert(key.as_ref()) {
                        return Err(EncodeError::DuplicateKey(key.to_string()));
                    }
                    c += Self::encode_text(key, buf)?;
                    c += Self::encode_value(val, buf, depth + 1)?;
                }
                Ok(c)
            }
            Value::Array(packed) => Self::encode_packed(packed, buf),
        }
    }

    fn encode_packed(packed: &Packed, buf: &mut Buffer) -> Result<usize, EncodeError> {
        let mut c = Self::put_tag(buf, Tag::Array)?;
        buf.reserve(1)?;
        buf.write(&[packed.kind() as u8]);
        c += 1;
        c += Self::put_len(buf, packed.len())?;
        match packed {
            Packed::Bool(v) => {
                buf.reserve(v.len())?;
                for e in v.iter() {
                    buf.write(&[*e as u8]);
                }
                c += v.len();
            }
            Packed::Int(v) => {
                for e in v.iter() {
                    c += varint::put_i64(buf, *e)?;
                }
            }
            Packed::Uint(v) => {
                for e in v.iter() {
                    c += varint::put_u64(buf, *e)?;
                }
            }
            Packed::Float(v) => {
                let payload = v.len().checked_mul(8).ok_or(EncodeError::Length(v.len()))?;
                buf.reserve(payload)?;
                for e in v.iter() {
                    buf.write(&e.to_be_bytes());
                }
                c += payload;
            }
        }
        Ok(c)
    }

    fn encode_text(v: &str, buf: &mut Buffer) -> Result<usize, EncodeError> {
        let mut c = Self::put_tag(buf, Tag::Text)?;
        c += Self::put_len(buf, v.len())?;
        buf.reserve(v.len())?;
        buf.write(v.as_bytes());
        Ok(c + v.len())
    }

    fn put_tag(buf: &mut Buffer, tag: Tag) -> Result<usize, EncodeError> {
        buf.reserve(1)?;
        buf.write(&[tag as u8]);
        Ok(1)
    }

    fn put_len(buf: &mut Buffer, len: usize) -> Result<usize, EncodeError> {
        let v = u64::try_from(len).map_err(|_| EncodeError::Length(len))?;
        varint::put_u64(buf, v)
    }
}

/// Decodes values from a byte slice. Strings, keys and byte data are
/// borrowed from the input instead of copied, so a decoded value may only
/// live as long as the bytes do; containers still need their own heap space.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    /// Decode a single value from the given buffer. Returns the value and
    /// the number of consumed bytes.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Value<'a>, usize), DecoderError> {
        Self::with_max_depth(buf, MAX_DEPTH)
    }

    /// Like [`Decoder::decode`] with a caller-chosen nesting limit.
    pub fn with_max_depth<B: ?Sized + AsRef<[u8]>>(
        buf: &'a B,
        max_depth: usize,
    ) -> Result<(Value<'a>, usize), DecoderError> {
        let mut decoder = Self { buf: buf.as_ref(), pos: 0, max_depth };
        let value = decoder.decode_value(0).map_err(|e| e.at(decoder.pos))?;
        Ok((value, decoder.pos))
    }

    /// Decode a single packed array, checking the encoded element kind
    /// against `expected`. A same-width payload of another kind cannot be
    /// told apart by inspection, which is why the caller must state what it
    /// expects.
    pub fn decode_array<B: ?Sized + AsRef<[u8]>>(
        buf: &'a B,
        expected: Kind,
    ) -> Result<(Value<'a>, usize), DecoderError> {
        let mut decoder = Self { buf: buf.as_ref(), pos: 0, max_depth: MAX_DEPTH };
        let value = decoder.decode_array_inner(expected).map_err(|e| e.at(decoder.pos))?;
        Ok((value, decoder.pos))
    }

    fn decode_array_inner(&mut self, expected: Kind) -> Result<Value<'a>, DecodeError> {
        match self.decode_tag()? {
            Tag::Array => self.decode_packed(Some(expected)),
            other => Err(DecodeError::UnexpectedTag {
                expected: Tag::Array.name(),
                found: other.name(),
            }),
        }
    }

    fn decode_value(&mut self, depth: usize) -> Result<Value<'a>, DecodeError> {
        if depth == self.max_depth {
            return Err(DecodeError::Depth(self.max_depth));
        }
        match self.decode_tag()? {
            Tag::True => Ok(Value::Bool(true)),
            Tag::False => Ok(Value::Bool(false)),
            Tag::PosInt => {
                let magnitude = self.decode_u64()?;
                let v = i64::try_from(magnitude).map_err(|_| DecodeError::IntRange(magnitude))?;
                Ok(Value::Int(v))
            }
            Tag::NegInt => {
                let magnitude = self.decode_u64()?;
                if magnitude > i64::MAX as u64 + 1 {
                    return Err(DecodeError::IntRange(magnitude));
                }
                // negative zero on wire decodes to plain zero
                Ok(Value::Int((magnitude as i64).wrapping_neg()))
            }
            Tag::Float => Ok(Value::Float(f64::from_be_bytes(
                self.decode_slice(8)?.try_into().unwrap(),
            ))),
            Tag::Bytes => {
                let len = self.decode_len()?;
                Ok(Value::Bytes(Cow::Borrowed(self.decode_slice(len)?)))
            }
            Tag::Text => {
                let len = self.decode_len()?;
                Ok(Value::Text(Cow::Borrowed(from_utf8(self.decode_slice(len)?)?)))
            }
            Tag::List => {
                let count = self.decode_len()?;
                self.guard_count(count, 1)?;
                let mut elements = Vec::new();
                elements.try_reserve(count)?;
                for _ in 0..count {
                    elements.push(self.decode_value(depth + 1)?);
                }
                Ok(Value::List(elements))
            }
            Tag::Dict => {
                let count = self.decode_len()?;
                self.guard_count(count, 1)?;
                let mut entries: Vec<(Cow<'a, str>, Value<'a>)> = Vec::new();
                entries.try_reserve(count)?;
                for _ in 0..count {
                    let key = self.decode_key()?;
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(DecodeError::DuplicateKey(key.into_owned()));
                    }
                    let val = self.decode_value(depth + 1)?;
                    entries.push((key, val));
                }
                Ok(Value::Dict(entries))
            }
            Tag::Array => self.decode_packed(None),
        }
    }

    fn decode_packed(&mut self, expected: Option<Kind>) -> Result<Value<'a>, DecodeError> {
        let kind = Kind::try_from(self.decode_slice(1)?[0])?;
        if let Some(expected) = expected {
            if kind != expected {
                return Err(DecodeError::Mismatch { expected, found: kind });
            }
        }
        let count = self.decode_len()?;
        match kind {
            Kind::Bool => {
                self.guard_count(count, 1)?;
                let mut elements = Vec::new();
                elements.try_reserve(count)?;
                for _ in 0..count {
                    match self.decode_slice(1)?[0] {
                        0x00 => elements.push(false),
                        0x01 => elements.push(true),
                        b => return Err(DecodeError::PackedBool(b)),
                    }
                }
                Ok(Value::Array(Packed::Bool(elements)))
            }
            Kind::Int => {
                self.guard_count(count, 1)?;
                let mut elements = Vec::new();
                elements.try_reserve(count)?;
                for _ in 0..count {
                    elements.push(varint::unzigzag(self.decode_u64()?));
                }
                Ok(Value::Array(Packed::Int(elements)))
            }
            Kind::Uint => {
                self.guard_count(count, 1)?;
                let mut elements = Vec::new();
                elements.try_reserve(count)?;
                for _ in 0..count {
                    elements.push(self.decode_u64()?);
                }
                Ok(Value::Array(Packed::Uint(elements)))
            }
            Kind::Float => {
                self.guard_count(count, 8)?;
                let mut elements = Vec::new();
                elements.try_reserve(count)?;
                for _ in 0..count {
                    elements.push(f64::from_be_bytes(self.decode_slice(8)?.try_into().unwrap()));
                }
                Ok(Value::Array(Packed::Float(elements)))
            }
        }
    }

    fn decode_tag(&mut self) -> Result<Tag, DecodeError> {
        Tag::try_from(self.decode_slice(1)?[0])
    }

    fn decode_key(&mut self) -> Result<Cow<'a, str>, DecodeError> {
        match self.decode_tag()? {
            Tag::Text => {
                let len = self.decode_len()?;
                Ok(Cow::Borrowed(from_utf8(self.decode_slice(len)?)?))
            }
            other => Err(DecodeError::UnexpectedTag {
                expected: Tag::Text.name(),
                found: other.name(),
            }),
        }
    }

    fn decode_u64(&mut self) -> Result<u64, DecodeError> {
        let (v, c) = varint::get_u64(&self.buf[self.pos..])?;
        self.pos += c;
        Ok(v)
    }

    fn decode_len(&mut self) -> Result<usize, DecodeError> {
        let v = self.decode_u64()?;
        usize::try_from(v).map_err(|_| DecodeError::Length(v))
    }

    fn decode_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf[self.pos..].len() < len {
            return Err(DecodeError::Underflow {
                needed: len,
                available: self.buf.len() - self.pos,
            });
        }
        self.pos += len;
        Ok(&self.buf[self.pos - len..self.pos])
    }

    /// Every element occupies at least `elem_size` bytes, so a count prefix
    /// promising more than the remaining input can never be satisfied. This
    /// catches absurd counts before `try_reserve` commits real memory.
    fn guard_count(&self, count: usize, elem_size: usize) -> Result<(), DecodeError> {
        let needed = count
            .checked_mul(elem_size)
            .ok_or(DecodeError::Length(count as u64))?;
        let available = self.buf.len() - self.pos;
        if needed > available {
            return Err(DecodeError::Underflow { needed, available });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Packed, Value, MAX_DEPTH};
    use crate::buf::Buffer;
    use crate::error::{DecodeError, EncodeError};
    use crate::tag::Kind;
    use crate::value::Decoder;
    use std::borrow::Cow;

    #[test]
    fn simple_values() {
        let mut buf = Buffer::new();
        assert_roundtrip(Value::Bool(true), &mut buf);
        assert_roundtrip(Value::Bool(false), &mut buf);
        assert_roundtrip(Value::Int(0), &mut buf);
        for i in (0..i64::MAX).step_by(3_203_431_780_337) {
            assert_roundtrip(Value::Int(i), &mut buf);
            assert_roundtrip(Value::Int(-i), &mut buf);
        }
        assert_roundtrip(Value::Int(i64::MAX), &mut buf);
        assert_roundtrip(Value::Int(i64::MIN), &mut buf);
    }

    #[test]
    fn zero_is_posint() {
        let mut buf = Buffer::new();
        buf.encode(&Value::Int(0)).unwrap();
        assert_eq!(&[0x03, 0x00], buf.as_slice());
    }

    #[test]
    fn negative_zero_int_normalizes() {
        let mut buf = Buffer::from_vec(vec![0x04, 0x00]);
        assert_eq!(Value::Int(0), buf.decode().unwrap());
    }

    #[test]
    fn floats() {
        let mut buf = Buffer::new();
        assert_roundtrip(Value::Float(f64::MAX), &mut buf);
        assert_roundtrip(Value::Float(f64::MIN), &mut buf);
        assert_roundtrip(Value::Float(std::f64::consts::PI), &mut buf);
        assert_roundtrip(Value::Float(f64::INFINITY), &mut buf);
        assert_roundtrip(Value::Float(f64::NEG_INFINITY), &mut buf);
    }

    #[test]
    fn float_bit_exact() {
        let mut buf = Buffer::new();
        for v in [-0.0f64, f64::NAN] {
            buf.reset();
            buf.encode(&Value::Float(v)).unwrap();
            match buf.decode().unwrap() {
                Value::Float(decoded) => assert_eq!(v.to_bits(), decoded.to_bits()),
                other => panic!("expected float, got {}", other),
            }
        }
    }

    #[test]
    fn strings() {
        let mut buf = Buffer::new();
        assert_roundtrip(
            Value::Text(Cow::Borrowed("Üben von Xylophon und Querflöte ist ja zweckmäßig.")),
            &mut buf,
        );
        assert_roundtrip(Value::Text(Cow::Borrowed("")), &mut buf);
    }

    #[test]
    fn bytes() {
        let mut buf = Buffer::new();
        assert_roundtrip(Value::Bytes(Cow::Borrowed(&[1, 2, 3, 4, 255])), &mut buf);
        assert_roundtrip(Value::Bytes(Cow::Borrowed(&[])), &mut buf);
    }

    #[test]
    fn list_mixed() {
        let mut buf = Buffer::new();
        assert_roundtrip(
            Value::List(vec![
                Value::Text(Cow::Borrowed("hello")),
                Value::Text(Cow::Borrowed("world")),
                Value::Int(10),
                Value::Float(-1.5),
            ]),
            &mut buf,
        );
    }

    #[test]
    fn list_long() {
        let mut buf = Buffer::new();
        for i in 0..1 << 10 {
            assert_roundtrip(Value::List(vec![Value::Int(1); i as usize]), &mut buf);
        }
    }

    #[test]
    fn dict() {
        let mut buf = Buffer::new();
        assert_roundtrip(
            Value::Dict(vec![
                (Cow::Borrowed("a"), Value::Int(10)),
                (Cow::Borrowed("b"), Value::Float(-3.14)),
            ]),
            &mut buf,
        );
        assert_roundtrip(Value::Dict(vec![]), &mut buf);
    }

    #[test]
    fn dict_preserves_insertion_order() {
        let mut buf = Buffer::new();
        let value = Value::Dict(vec![
            (Cow::Borrowed("zebra"), Value::Int(1)),
            (Cow::Borrowed("aardvark"), Value::Int(2)),
            (Cow::Borrowed("mongoose"), Value::Int(3)),
        ]);
        buf.encode(&value).unwrap();
        match buf.decode().unwrap() {
            Value::Dict(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_ref()).collect();
                assert_eq!(vec!["zebra", "aardvark", "mongoose"], keys);
            }
            other => panic!("expected dict, got {}", other),
        }
    }

    #[test]
    fn duplicate_key_rejected_on_encode() {
        let mut buf = Buffer::new();
        let value = Value::Dict(vec![
            (Cow::Borrowed("a"), Value::Int(1)),
            (Cow::Borrowed("a"), Value::Int(2)),
        ]);
        assert_eq!(
            Err(EncodeError::DuplicateKey("a".to_string())),
            buf.encode(&value)
        );
    }

    #[test]
    fn duplicate_key_rejected_on_decode() {
        // Dict of 2 pairs, both keyed "a"
        let bytes = [
            0x09, 0x02, // Dict, 2 pairs
            0x07, 0x01, b'a', 0x03, 0x0a, // "a": 10
            0x07, 0x01, b'a', 0x03, 0x0b, // "a": 11
        ];
        let mut buf = Buffer::from_vec(bytes.to_vec());
        assert_eq!(
            DecodeError::DuplicateKey("a".to_string()),
            buf.decode().unwrap_err().into_inner()
        );
    }

    #[test]
    fn typed_arrays() {
        let mut buf = Buffer::new();
        assert_roundtrip(Value::Array(Packed::Int(vec![1, 16, 32, 64, 128])), &mut buf);
        assert_roundtrip(Value::Array(Packed::Int(vec![-1, -128, i64::MIN])), &mut buf);
        assert_roundtrip(Value::Array(Packed::Uint(vec![0, 127, 128, u64::MAX])), &mut buf);
        assert_roundtrip(Value::Array(Packed::Bool(vec![true, false, true])), &mut buf);
        assert_roundtrip(Value::Array(Packed::Float(vec![1.5, -0.25, 6.02e23])), &mut buf);
        assert_roundtrip(Value::Array(Packed::Int(vec![])), &mut buf);
    }

    #[test]
    fn typed_array_with_hint() {
        let mut buf = Buffer::new();
        let value = Value::Array(Packed::Int(vec![1, 16, 32, 64, 128]));
        buf.encode(&value).unwrap();
        assert_eq!(value, buf.decode_array(Kind::Int).unwrap());
    }

    #[test]
    fn typed_array_hint_mismatch() {
        let mut buf = Buffer::new();
        buf.encode(&Value::Array(Packed::Int(vec![1, 16, 32, 64, 128]))).unwrap();
        let err = buf.decode_array(Kind::Float).unwrap_err();
        // cursor rests just past the offending sub-tag byte
        assert_eq!(2, err.position());
        assert_eq!(
            DecodeError::Mismatch { expected: Kind::Float, found: Kind::Int },
            err.into_inner()
        );
    }

    #[test]
    fn typed_array_is_denser_than_list() {
        let mut packed = Buffer::new();
        let mut tagged = Buffer::new();
        packed.encode(&Value::Array(Packed::Int((0..100).collect()))).unwrap();
        tagged.encode(&Value::List((0..100).map(Value::Int).collect())).unwrap();
        assert!(packed.len() < tagged.len());
    }

    #[test]
    fn packed_bool_invalid_byte() {
        let bytes = [0x0a, 0x01, 0x02, 0x01, 0x02]; // Array, Bool kind, 2 elements
        assert_eq!(
            DecodeError::PackedBool(0x02),
            Decoder::decode(&bytes).unwrap_err().into_inner()
        );
    }

    #[test]
    fn nested_composites() {
        let mut buf = Buffer::new();
        let value = Value::List(vec![Value::Dict(vec![(
            Cow::Borrowed("inner"),
            Value::List(vec![Value::Dict(vec![(
                Cow::Borrowed("deeper"),
                Value::List(vec![Value::Int(42)]),
            )])]),
        )])]);
        assert_roundtrip(value, &mut buf);
    }

    #[test]
    fn depth_limit_on_decode() {
        // one List header of count 1 per nesting level
        let mut bytes = Vec::new();
        for _ in 0..MAX_DEPTH + 1 {
            bytes.extend_from_slice(&[0x08, 0x01]);
        }
        bytes.push(0x01); // True
        assert_eq!(
            DecodeError::Depth(MAX_DEPTH),
            Decoder::decode(&bytes).unwrap_err().into_inner()
        );
    }

    #[test]
    fn configurable_depth_limit() {
        let mut buf = Buffer::new();
        let mut value = Value::Int(1);
        for _ in 0..5 {
            value = Value::List(vec![value]);
        }
        buf.encode(&value).unwrap();
        assert!(Decoder::with_max_depth(buf.as_slice(), 6).is_ok());
        assert_eq!(
            DecodeError::Depth(5),
            Decoder::with_max_depth(buf.as_slice(), 5).unwrap_err().into_inner()
        );
    }

    #[test]
    fn depth_limit_on_encode() {
        let mut buf = Buffer::new();
        let mut value = Value::Int(1);
        for _ in 0..MAX_DEPTH + 1 {
            value = Value::List(vec![value]);
        }
        assert_eq!(Err(EncodeError::Depth(MAX_DEPTH)), buf.encode(&value));
    }

    #[test]
    fn underflow_on_empty_buffer() {
        let mut buf = Buffer::new();
        let err = buf.decode().unwrap_err();
        assert_eq!(0, err.position());
        assert!(matches!(err.into_inner(), DecodeError::Underflow { .. }));
    }

    #[test]
    fn unknown_tag() {
        let mut buf = Buffer::from_vec(vec![0x00]);
        assert_eq!(DecodeError::Tag(0x00), buf.decode().unwrap_err().into_inner());
    }

    #[test]
    fn int_magnitude_overflow() {
        // PosInt with magnitude u64::MAX does not fit an i64
        let mut bytes = vec![0x03];
        bytes.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert_eq!(
            DecodeError::IntRange(u64::MAX),
            Decoder::decode(&bytes).unwrap_err().into_inner()
        );
        // NegInt with magnitude 2^63 is exactly i64::MIN
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(Value::Int(i64::MIN), Decoder::decode(&bytes).unwrap().0);
        // one past that is out of range
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(&[0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            DecodeError::IntRange((i64::MAX as u64) + 2),
            Decoder::decode(&bytes).unwrap_err().into_inner()
        );
    }

    #[test]
    fn truncated_composite_reports_underflow() {
        let mut buf = Buffer::new();
        buf.encode(&Value::Text(Cow::Borrowed("hello"))).unwrap();
        let bytes = buf.as_slice()[..buf.len() - 2].to_vec();
        let mut short = Buffer::from_vec(bytes);
        assert!(matches!(
            short.decode().unwrap_err().into_inner(),
            DecodeError::Underflow { needed: 5, available: 3 }
        ));
    }

    #[test]
    fn absurd_count_prefix_fails_fast() {
        // List claiming u32::MAX elements in a 7 byte input
        let bytes = [0x08, 0xff, 0xff, 0xff, 0xff, 0x0f, 0x01];
        assert!(matches!(
            Decoder::decode(&bytes).unwrap_err().into_inner(),
            DecodeError::Underflow { .. }
        ));
    }

    #[test]
    fn sequential_decodes() {
        let mut buf = Buffer::new();
        buf.encode(&Value::Int(7)).unwrap();
        buf.encode(&Value::Text(Cow::Borrowed("two"))).unwrap();
        assert_eq!(Value::Int(7), buf.decode().unwrap());
        assert_eq!(Value::Text(Cow::Borrowed("two")), buf.decode().unwrap());
        assert_eq!(0, buf.remaining());
    }

    #[test]
    fn seek_allows_rereading() {
        let mut buf = Buffer::new();
        buf.encode(&Value::Int(7)).unwrap();
        assert_eq!(Value::Int(7), buf.decode().unwrap());
        buf.seek(0);
        assert_eq!(Value::Int(7), buf.decode().unwrap());
    }

    #[test]
    fn failed_decode_leaves_cursor_at_error() {
        // List of 2: first element fine, second has an unknown tag
        let bytes = vec![0x08, 0x02, 0x03, 0x01, 0x7f];
        let mut buf = Buffer::from_vec(bytes);
        let err = buf.decode().unwrap_err();
        assert_eq!(DecodeError::Tag(0x7f), err.into_inner());
        assert_eq!(5, buf.position());
    }

    #[test]
    fn into_owned_detaches_from_buffer() {
        let mut buf = Buffer::new();
        buf.encode(&Value::List(vec![Value::Text(Cow::Borrowed("hi"))])).unwrap();
        let owned = buf.decode().unwrap().into_owned();
        buf.reset();
        assert_eq!(Value::List(vec![Value::Text(Cow::Borrowed("hi"))]), owned);
    }

    #[test]
    fn display() {
        let value = Value::Dict(vec![
            (Cow::Borrowed("xs"), Value::Array(Packed::Int(vec![1, 2]))),
            (Cow::Borrowed("raw"), Value::Bytes(Cow::Borrowed(&[0xde, 0xad]))),
        ]);
        assert_eq!("{\"xs\": int<1, 2>, \"raw\": x\"dead\"}", format!("{}", value));
    }

    fn assert_roundtrip(val: Value, buf: &mut Buffer) {
        buf.reset();
        let written = buf.encode(&val).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(val, buf.decode().unwrap());
        assert_eq!(0, buf.remaining());
    }
}
