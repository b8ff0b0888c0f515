use crate::error::{DeserializationError, Error, Result};
use gobmsg::{varint, DecodeError, Kind, Tag};
use serde::de::{
    self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use serde::Deserialize;
use std::convert::{TryFrom, TryInto};

pub struct Deserializer<'de> {
    input: &'de [u8],
    pos: usize,
}

/// Deserialize a value from a byte slice. The entire input must be consumed,
/// otherwise a `Trailing` error is raised.
pub fn from_bytes<'de, T: Deserialize<'de>>(
    input: &'de [u8],
) -> std::result::Result<T, DeserializationError> {
    let mut deserializer = Deserializer { input, pos: 0 };
    match T::deserialize(&mut deserializer) {
        Ok(value) => {
            if deserializer.pos == deserializer.input.len() {
                Ok(value)
            } else {
                Err(Error::Trailing.at(deserializer.pos))
            }
        }
        Err(e) => Err(e.at(deserializer.pos)),
    }
}

/// One step of the decoded input: a scalar with its payload, or the opening
/// of a container with its announced length. Containers leave their contents
/// in the input for the access structs to pull out one by one.
enum Atom<'de> {
    Bool(bool),
    Pos(u64),
    Neg(u64),
    Float(f64),
    Bytes(&'de [u8]),
    Str(&'de str),
    List(usize),
    Dict(usize),
    Array(Kind, usize),
}

impl<'de> Atom<'de> {
    fn name(&self) -> &'static str {
        match self {
            Atom::Bool(_) => "Bool",
            Atom::Pos(_) => "PosInt",
            Atom::Neg(_) => "NegInt",
            Atom::Float(_) => "Float",
            Atom::Bytes(_) => "Bytes",
            Atom::Str(_) => "Text",
            Atom::List(_) => "List",
            Atom::Dict(_) => "Dict",
            Atom::Array(_, _) => "Array",
        }
    }
}

impl<'de> Deserializer<'de> {
    fn take_byte(&mut self) -> Result<u8> {
        match self.input.get(self.pos) {
            Some(b) => {
                self.pos += 1;
                Ok(*b)
            }
            None => Err(Error::Decode(DecodeError::Underflow {
                needed: 1,
                available: 0,
            })),
        }
    }

    fn take_slice(&mut self, len: usize) -> Result<&'de [u8]> {
        let available = self.input.len() - self.pos;
        if len > available {
            return Err(Error::Decode(DecodeError::Underflow {
                needed: len,
                available,
            }));
        }
        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_uint(&mut self) -> Result<u64> {
        let (value, consumed) = varint::get_u64(&self.input[self.pos..]).map_err(Error::Decode)?;
        self.pos += consumed;
        Ok(value)
    }

    fn take_len(&mut self) -> Result<usize> {
        let value = self.take_uint()?;
        usize::try_from(value).map_err(|_| Error::Decode(DecodeError::Length(value)))
    }

    fn decode_atom(&mut self) -> Result<Atom<'de>> {
        let tag = Tag::try_from(self.take_byte()?).map_err(Error::Decode)?;
        match tag {
            Tag::True => Ok(Atom::Bool(true)),
            Tag::False => Ok(Atom::Bool(false)),
            Tag::PosInt => Ok(Atom::Pos(self.take_uint()?)),
            Tag::NegInt => Ok(Atom::Neg(self.take_uint()?)),
            Tag::Float => {
                let bytes = self.take_slice(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                Ok(Atom::Float(f64::from_be_bytes(raw)))
            }
            Tag::Bytes => {
                let len = self.take_len()?;
                Ok(Atom::Bytes(self.take_slice(len)?))
            }
            Tag::Text => {
                let len = self.take_len()?;
                let bytes = self.take_slice(len)?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| Error::Decode(DecodeError::from(e)))?;
                Ok(Atom::Str(text))
            }
            Tag::List => Ok(Atom::List(self.take_len()?)),
            Tag::Dict => Ok(Atom::Dict(self.take_len()?)),
            Tag::Array => {
                let kind = Kind::try_from(self.take_byte()?).map_err(Error::Decode)?;
                Ok(Atom::Array(kind, self.take_len()?))
            }
        }
    }

    /// Decodes a tagged integer into the widest type that holds both signs.
    fn decode_int(&mut self) -> Result<i128> {
        match self.decode_atom()? {
            Atom::Pos(v) => Ok(i128::from(v)),
            Atom::Neg(v) => Ok(-i128::from(v)),
            atom => Err(Error::Unexpected(&["PosInt", "NegInt"], atom.name())),
        }
    }
}

impl<'a, 'de> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Bool(v) => visitor.visit_bool(v),
            Atom::Pos(v) => visitor.visit_u64(v),
            Atom::Neg(v) => {
                let v = i64::try_from(-i128::from(v))
                    .map_err(|_| Error::Decode(DecodeError::IntRange(v)))?;
                visitor.visit_i64(v)
            }
            Atom::Float(v) => visitor.visit_f64(v),
            Atom::Bytes(v) => visitor.visit_borrowed_bytes(v),
            Atom::Str(v) => visitor.visit_borrowed_str(v),
            Atom::List(len) => visitor.visit_seq(ListAccess {
                de: self,
                remaining: len,
            }),
            Atom::Dict(len) => visitor.visit_map(DictAccess {
                de: self,
                remaining: len,
            }),
            Atom::Array(kind, len) => visitor.visit_seq(PackedAccess {
                de: self,
                kind,
                remaining: len,
            }),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Bool(v) => visitor.visit_bool(v),
            atom => Err(Error::Unexpected(&["True", "False"], atom.name())),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.decode_int()?.try_into()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.decode_int()?.try_into()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.decode_int()?.try_into()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.decode_int()?.try_into()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.decode_int()?.try_into()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.decode_int()?.try_into()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.decode_int()?.try_into()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.decode_int()?.try_into()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Float(v) => visitor.visit_f32(v as f32),
            atom => Err(Error::Unexpected(&["Float"], atom.name())),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Float(v) => visitor.visit_f64(v),
            atom => Err(Error::Unexpected(&["Float"], atom.name())),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Str(v) => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(Error::Unexpected(&["single character Text"], "Text")),
                }
            }
            atom => Err(Error::Unexpected(&["Text"], atom.name())),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Str(v) => visitor.visit_borrowed_str(v),
            atom => Err(Error::Unexpected(&["Text"], atom.name())),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Bytes(v) => visitor.visit_borrowed_bytes(v),
            Atom::Str(v) => visitor.visit_borrowed_bytes(v.as_bytes()),
            atom => Err(Error::Unexpected(&["Bytes", "Text"], atom.name())),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // absence is not encodable, so anything present is a Some
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unrepresentable("unit"))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value> {
        Err(Error::Unrepresentable("unit struct"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::List(len) => visitor.visit_seq(ListAccess {
                de: self,
                remaining: len,
            }),
            Atom::Array(kind, len) => visitor.visit_seq(PackedAccess {
                de: self,
                kind,
                remaining: len,
            }),
            atom => Err(Error::Unexpected(&["List", "Array"], atom.name())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Dict(len) => visitor.visit_map(DictAccess {
                de: self,
                remaining: len,
            }),
            atom => Err(Error::Unexpected(&["Dict"], atom.name())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.decode_atom()? {
            Atom::Str(v) => visitor.visit_enum(v.into_deserializer()),
            Atom::Dict(1) => visitor.visit_enum(EnumAccess { de: self }),
            atom => Err(Error::Unexpected(&["Text", "Dict of one pair"], atom.name())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }
}

struct ListAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> SeqAccess<'de> for ListAccess<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining > 0 {
            self.remaining -= 1;
            seed.deserialize(&mut *self.de).map(Some)
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct DictAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> MapAccess<'de> for DictAccess<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.remaining > 0 {
            self.remaining -= 1;
            seed.deserialize(&mut *self.de).map(Some)
        } else {
            Ok(None)
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Walks the untagged payloads of a packed array; the element kind decides
/// how many bytes each step consumes.
struct PackedAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    kind: Kind,
    remaining: usize,
}

impl<'a, 'de> SeqAccess<'de> for PackedAccess<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining > 0 {
            self.remaining -= 1;
            seed.deserialize(PackedElement {
                de: &mut *self.de,
                kind: self.kind,
            })
            .map(Some)
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct PackedElement<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    kind: Kind,
}

impl<'a, 'de> de::Deserializer<'de> for PackedElement<'a, 'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.kind {
            Kind::Bool => match self.de.take_byte()? {
                0x00 => visitor.visit_bool(false),
                0x01 => visitor.visit_bool(true),
                b => Err(Error::Decode(DecodeError::PackedBool(b))),
            },
            Kind::Int => {
                let (v, consumed) =
                    varint::get_i64(&self.de.input[self.de.pos..]).map_err(Error::Decode)?;
                self.de.pos += consumed;
                visitor.visit_i64(v)
            }
            Kind::Uint => visitor.visit_u64(self.de.take_uint()?),
            Kind::Float => {
                let bytes = self.de.take_slice(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                visitor.visit_f64(f64::from_be_bytes(raw))
            }
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple tuple_struct
        map struct enum identifier ignored_any
    }
}

struct EnumAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> de::EnumAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = match self.de.decode_atom()? {
            Atom::Str(v) => v,
            atom => return Err(Error::Unexpected(&["Text"], atom.name())),
        };
        Ok((
            seed.deserialize(de::value::StrDeserializer::<Error>::new(variant))?,
            self,
        ))
    }
}

impl<'a, 'de> VariantAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        // unit variants come as bare Text, never as a dict pair
        Err(Error::Unexpected(&["Text"], "Dict"))
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(&mut *self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(&mut *self.de, visitor)
    }
}
