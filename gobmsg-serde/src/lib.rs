//! Serde bindings for the gobmsg wire format.
//!
//! Values serialize straight into a [`gobmsg::Buffer`], so repeated messages
//! can share one allocation; deserialization borrows text and byte strings
//! from the input where the types allow it.
//!
//! The format has no notion of absence: `None`, `()` and unit structs cannot
//! be serialized and raise [`Error::Unrepresentable`]. Unit enum variants
//! encode as their name in a `Text`; variants with a payload become a
//! single-entry dict keyed by the variant name. Map keys must be strings,
//! since dict keys are `Text` on the wire.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use gobmsg_serde::{from_bytes, to_bytes};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     id: u32,
//!     body: String,
//! }
//!
//! let msg = Message { id: 7, body: "hello".to_string() };
//! let bytes = to_bytes(&msg).unwrap();
//! let back: Message = from_bytes(&bytes).unwrap();
//! assert_eq!(msg, back);
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, Deserializer};
pub use error::{DeserializationError, Error, Result};
pub use ser::{to_buffer, to_bytes, Serializer};

#[cfg(test)]
mod tests {
    use crate::{from_bytes, to_bytes, Error};
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::fmt::Debug;

    fn assert_roundtrip<T: Serialize + DeserializeOwned + PartialEq + Debug>(value: T) {
        let bytes = to_bytes(&value).unwrap();
        let back: T = from_bytes(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn scalars() {
        assert_roundtrip(true);
        assert_roundtrip(false);
        assert_roundtrip(0u8);
        assert_roundtrip(-1i8);
        assert_roundtrip(48151623i32);
        assert_roundtrip(i64::MIN);
        assert_roundtrip(i64::MAX);
        assert_roundtrip(u64::MAX);
        assert_roundtrip(0.0f32);
        assert_roundtrip(-2.5f64);
        assert_roundtrip('ß');
        assert_roundtrip("owned".to_string());
    }

    #[test]
    fn bytes() {
        assert_roundtrip(serde_bytes::ByteBuf::from(vec![0u8, 1, 2, 255]));
    }

    #[test]
    fn options() {
        assert_roundtrip(Some(42i64));
        assert_roundtrip(Some("present".to_string()));
    }

    #[test]
    fn containers() {
        assert_roundtrip(Vec::<i64>::new());
        assert_roundtrip(vec![1i64, -1, 63, -64]);
        assert_roundtrip((17u8, "tuple".to_string(), false));
        let mut map = HashMap::new();
        map.insert("one".to_string(), 1u32);
        map.insert("two".to_string(), 2u32);
        assert_roundtrip(map);
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Inner {
        flag: bool,
        score: f64,
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Outer {
        id: u64,
        name: String,
        inner: Inner,
        tags: Vec<String>,
    }

    #[test]
    fn nested_struct() {
        assert_roundtrip(Outer {
            id: 99,
            name: "nested".to_string(),
            inner: Inner {
                flag: true,
                score: 0.25,
            },
            tags: vec!["a".to_string(), "b".to_string()],
        });
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    enum Shape {
        Point,
        Circle(f64),
        Segment(f64, f64),
        Rect { w: f64, h: f64 },
    }

    #[test]
    fn enum_variants() {
        assert_roundtrip(Shape::Point);
        assert_roundtrip(Shape::Circle(1.0));
        assert_roundtrip(Shape::Segment(0.0, 2.0));
        assert_roundtrip(Shape::Rect { w: 3.0, h: 4.0 });
        assert_roundtrip(vec![Shape::Point, Shape::Circle(0.5)]);
    }

    #[test]
    fn unit_variant_is_bare_text() {
        let bytes = to_bytes(&Shape::Point).unwrap();
        assert_eq!(
            &[0x07, 0x05, b'P', b'o', b'i', b'n', b't'],
            bytes.as_slice()
        );
    }

    #[test]
    fn none_is_unrepresentable() {
        let err = to_bytes(&Option::<i64>::None).unwrap_err();
        assert!(matches!(err, Error::Unrepresentable(_)));
        let err = to_bytes(&()).unwrap_err();
        assert!(matches!(err, Error::Unrepresentable(_)));
    }

    #[test]
    fn non_string_keys_are_rejected() {
        let mut map = HashMap::new();
        map.insert(1u32, "one".to_string());
        let err = to_bytes(&map).unwrap_err();
        assert!(matches!(err, Error::KeyType));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let mut bytes = to_bytes(&true).unwrap();
        bytes.push(0x00);
        let err = from_bytes::<bool>(&bytes).unwrap_err();
        assert_eq!(1, err.position());
        assert!(matches!(err.into_inner(), Error::Trailing));
    }

    #[test]
    fn packed_arrays_deserialize_as_sequences() {
        // Array of three zigzag ints: 1, -1, 63
        let bytes = [0x0a, 0x02, 0x03, 0x02, 0x01, 0x7e];
        let values: Vec<i64> = from_bytes(&bytes).unwrap();
        assert_eq!(vec![1, -1, 63], values);
        // Array of two floats
        let mut bytes = vec![0x0a, 0x04, 0x02];
        bytes.extend_from_slice(&1.5f64.to_be_bytes());
        bytes.extend_from_slice(&(-0.5f64).to_be_bytes());
        let values: Vec<f64> = from_bytes(&bytes).unwrap();
        assert_eq!(vec![1.5, -0.5], values);
    }

    #[test]
    fn borrowed_text() {
        let bytes = to_bytes(&"zero copy").unwrap();
        let text: &str = from_bytes(&bytes).unwrap();
        assert_eq!("zero copy", text);
    }

    #[test]
    fn error_positions() {
        // Text whose length prefix overruns the input
        let bytes = [0x07, 0x10, b'x'];
        let err = from_bytes::<String>(&bytes).unwrap_err();
        assert_eq!(2, err.position());
    }
}
