use gobmsg::{varint, Buffer, EncodeError, Tag};
use serde::{ser, Serialize};

use crate::error::{Error, Result};

pub struct Serializer<'b> {
    buf: &'b mut Buffer,
}

/// Serialize `value` into a fresh byte vector.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Buffer::new();
    to_buffer(value, &mut buf)?;
    Ok(buf.into_vec())
}

/// Serialize `value` into an existing buffer, appending at its write
/// cursor. Lets callers reuse one allocation across messages.
pub fn to_buffer<T: Serialize>(value: &T, buf: &mut Buffer) -> Result<()> {
    let mut serializer = Serializer { buf };
    value.serialize(&mut serializer)?;
    Ok(())
}

impl<'b> Serializer<'b> {
    fn put_tag(&mut self, tag: Tag) -> Result<()> {
        self.buf.reserve(1).map_err(Error::Encode)?;
        self.buf.write(&[tag as u8]);
        Ok(())
    }

    fn put_len(&mut self, len: usize) -> Result<()> {
        let v = u64::try_from(len).map_err(|_| Error::Encode(EncodeError::Length(len)))?;
        varint::put_u64(self.buf, v).map_err(Error::Encode)?;
        Ok(())
    }

    fn put_text(&mut self, v: &str) -> Result<()> {
        self.put_tag(Tag::Text)?;
        self.put_len(v.len())?;
        self.buf.reserve(v.len()).map_err(Error::Encode)?;
        self.buf.write(v.as_bytes());
        Ok(())
    }

    /// Variants with a payload encode as a single-entry dict keyed by the
    /// variant name.
    fn put_variant_dict(&mut self, variant: &'static str) -> Result<()> {
        self.put_tag(Tag::Dict)?;
        self.put_len(1)?;
        self.put_text(variant)
    }
}

impl<'a, 'b> ser::Serializer for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.put_tag(match v {
            true => Tag::True,
            false => Tag::False,
        })
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.put_tag(if v < 0 { Tag::NegInt } else { Tag::PosInt })?;
        varint::put_u64(self.buf, v.unsigned_abs()).map_err(Error::Encode)?;
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.put_tag(Tag::PosInt)?;
        varint::put_u64(self.buf, v).map_err(Error::Encode)?;
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.put_tag(Tag::Float)?;
        self.buf.reserve(8).map_err(Error::Encode)?;
        self.buf.write(&v.to_be_bytes());
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(&v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.put_text(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.put_tag(Tag::Bytes)?;
        self.put_len(v.len())?;
        self.buf.reserve(v.len()).map_err(Error::Encode)?;
        self.buf.write(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::Unrepresentable("None"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::Unrepresentable("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<()> {
        let _ = name;
        Err(Error::Unrepresentable("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.put_text(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.put_variant_dict(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match len {
            Some(l) => {
                self.put_tag(Tag::List)?;
                self.put_len(l)?;
                Ok(self)
            }
            None => Err(Error::Length),
        }
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.put_variant_dict(variant)?;
        self.put_tag(Tag::List)?;
        self.put_len(len)?;
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        match len {
            Some(l) => {
                self.put_tag(Tag::Dict)?;
                self.put_len(l)?;
                Ok(self)
            }
            None => Err(Error::Length),
        }
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.put_tag(Tag::Dict)?;
        self.put_len(len)?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.put_variant_dict(variant)?;
        self.put_tag(Tag::Dict)?;
        self.put_len(len)?;
        Ok(self)
    }
}

impl<'a, 'b> ser::SerializeSeq for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTuple for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTupleStruct for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTupleVariant for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeMap for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(MapKeySerializer { ser: &mut **self })
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeStruct for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.put_text(key)?;
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeStructVariant for &'a mut Serializer<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.put_text(key)?;
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Dict keys must be `Text` on the wire, so only stringly things are
/// accepted in key position.
struct MapKeySerializer<'a, 'b> {
    ser: &'a mut Serializer<'b>,
}

impl<'a, 'b> ser::Serializer for MapKeySerializer<'a, 'b> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = ser::Impossible<(), Error>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn serialize_str(self, v: &str) -> Result<()> {
        self.ser.put_text(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.ser.put_text(&v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.ser.put_text(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(Error::KeyType)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::KeyType)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::KeyType)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::KeyType)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::KeyType)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::KeyType)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::KeyType)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::KeyType)
    }
}
