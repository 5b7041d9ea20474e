//! Serialization.
//!
//! Rust types map onto the format by their shape:
//! - `()`, unit structs and `None` - Nil
//! - Integers of any width - an unsigned tag when non-negative, a signed tag otherwise
//! - `char` and strings - Text
//! - Byte buffers (through `serde_bytes`) - Bytes
//! - Sequences, tuples and tuple structs - Array
//! - Maps and structs - Map, in the order the entries are produced. Keys must be strings.
//! - `f32` and `f64` - rejected with [`Error::Unsupported`]
//!
//! Enum variants, when mapped, are:
//! - Unit - Just the variant name as a string
//! - Newtype - Map with one pair. Key is variant name, content is the value
//! - Tuple - Map with one pair. Key is variant name, content is the tuple as an array
//! - Struct - Map with one pair. Key is variant name, content is the struct

use serde::ser::*;
use std::mem;

use crate::depth_tracking::DepthTracker;
use crate::element::*;
use crate::error::{Error, Result};
use crate::ext::{ExtKind, EXT_TYPE_ENUM};
use crate::fixed::{Address, Hash32};
use crate::integer::Integer;
use crate::MAX_DEPTH;

/// Serialize a value into a new byte vector.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut se = ChainSerializer::new();
    value.serialize(&mut se)?;
    Ok(se.buf)
}

struct ChainSerializer {
    depth_tracking: DepthTracker,
    buf: Vec<u8>,
}

impl ChainSerializer {
    fn new() -> Self {
        ChainSerializer {
            depth_tracking: DepthTracker::new(MAX_DEPTH),
            buf: Vec::new(),
        }
    }

    fn encode_element(&mut self, elem: Element) -> Result<()> {
        self.depth_tracking.update_elem(&elem, self.buf.len())?;
        serialize_elem(&mut self.buf, &elem)
    }

    /// Write an array header for `count` items, then the items. Fails if the iterator yields a
    /// different number of items than it promised.
    fn encode_counted<T, I>(&mut self, count: usize, items: I) -> Result<()>
    where
        T: Serialize,
        I: Iterator<Item = T>,
    {
        self.encode_element(Element::Array(count))?;
        let mut written = 0;
        for item in items {
            if written == count {
                return Err(Error::SerdeFail(format!(
                    "sequence yielded more than its stated {} items",
                    count
                )));
            }
            item.serialize(&mut *self)?;
            written += 1;
        }
        if written != count {
            return Err(Error::SerdeFail(format!(
                "sequence yielded {} items, but stated {}",
                written, count
            )));
        }
        Ok(())
    }

    fn encode_integer(&mut self, v: Integer) -> Result<()> {
        match v.as_u256() {
            Some(n) => self.encode_element(Element::Unsigned(n)),
            None => self.encode_element(Element::Signed(v)),
        }
    }
}

impl<'a> Serializer for &'a mut ChainSerializer {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = TupleSerializer<'a>;
    type SerializeTupleStruct = TupleSerializer<'a>;
    type SerializeTupleVariant = TupleSerializer<'a>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = StructSerializer<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.encode_element(Element::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.encode_integer(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.encode_integer(v.into())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.encode_integer(v.into())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.encode_integer(v.into())
    }

    fn serialize_f32(self, _: f32) -> Result<()> {
        Err(Error::Unsupported("floating-point values"))
    }

    fn serialize_f64(self, _: f64) -> Result<()> {
        Err(Error::Unsupported("floating-point values"))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.encode_element(Element::Str(v.encode_utf8(&mut buf)))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.encode_element(Element::Str(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.encode_element(Element::Bin(v))
    }

    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, v: &T) -> Result<()> {
        v.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.encode_element(Element::Nil)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        if name == EXT_TYPE_ENUM {
            let kind = ExtKind::from_index(variant_index)
                .ok_or_else(|| Error::SerdeFail("unrecognized chainpack variant".to_string()))?;
            let mut ext_se = ExtSerializer::new(kind, self);
            value.serialize(&mut ext_se)?;
            ext_se.finish()
        } else {
            self.encode_element(Element::Map(1))?;
            self.encode_element(Element::Str(variant))?;
            value.serialize(self)
        }
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        SeqSerializer::new(self, len)
    }

    fn serialize_tuple(self, len: usize) -> Result<TupleSerializer<'a>> {
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<TupleSerializer<'a>> {
        // Tuple structs usually just discard the name
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.encode_element(Element::Map(1))?;
        self.encode_element(Element::Str(variant))?;
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        MapSerializer::new(self, len)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.encode_element(Element::Map(len))?;
        Ok(StructSerializer::new(self))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.encode_element(Element::Map(1))?;
        self.encode_element(Element::Str(variant))?;
        self.encode_element(Element::Map(len))?;
        Ok(StructSerializer::new(self))
    }

    fn collect_seq<I>(self, iter: I) -> Result<()>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: Serialize,
    {
        let iter = iter.into_iter();
        if let (lo, Some(hi)) = iter.size_hint() {
            if lo == hi {
                return self.encode_counted(lo, iter);
            }
        }
        // The header holds the count, so inexact iterators are buffered first
        let items: Vec<I::Item> = iter.collect();
        self.encode_counted(items.len(), items.iter())
    }

    fn collect_map<K, V, I>(self, iter: I) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
        I: IntoIterator<Item = (K, V)>,
    {
        let iter = iter.into_iter();
        match iter.size_hint() {
            (lo, Some(hi)) if lo == hi => {
                self.encode_element(Element::Map(lo))?;
                let mut key = String::new();
                for (k, v) in iter {
                    k.serialize(KeySerializer::new(&mut key))?;
                    self.encode_element(Element::Str(&key))?;
                    v.serialize(&mut *self)?;
                }
            }
            (lo, _) => {
                // Keys are stringified up front so a bad key fails before anything is written
                let mut map = Vec::with_capacity(lo);
                for (k, v) in iter {
                    let mut key = String::new();
                    k.serialize(KeySerializer::new(&mut key))?;
                    map.push((key, v));
                }
                self.encode_element(Element::Map(map.len()))?;
                for (k, v) in map.iter() {
                    self.encode_element(Element::Str(k))?;
                    v.serialize(&mut *self)?;
                }
            }
        }
        Ok(())
    }
}

/// Array serializer for `serialize_seq`.
///
/// With a known length the header goes out immediately. Without one, the count isn't known until
/// `end`, so the elements are written into a fresh buffer while the parent's bytes are set aside.
/// The depth tracker sees an array of `usize::MAX` elements in the meantime, which `end` retires
/// with `early_end` once the real header and the element bytes are appended to the parent.
/// [`MapSerializer`] handles maps of unknown length the same way.
struct SeqSerializer<'a> {
    se: &'a mut ChainSerializer,
    unknown_len: Option<(usize, Vec<u8>)>,
}

impl<'a> SeqSerializer<'a> {
    fn new(se: &'a mut ChainSerializer, len: Option<usize>) -> Result<Self> {
        if let Some(len) = len {
            se.encode_element(Element::Array(len))?;
            Ok(Self {
                se,
                unknown_len: None,
            })
        } else {
            se.depth_tracking
                .update_elem(&Element::Array(usize::MAX), se.buf.len())?;
            let enc = mem::take(&mut se.buf);
            Ok(Self {
                se,
                unknown_len: Some((0, enc)),
            })
        }
    }
}

impl<'a> SerializeSeq for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some((ref mut len, _)) = self.unknown_len {
            *len += 1;
        }
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        if let Some((len, enc)) = self.unknown_len {
            let enc = mem::replace(&mut self.se.buf, enc);
            serialize_elem(&mut self.se.buf, &Element::Array(len))?;
            self.se.buf.extend_from_slice(&enc);
            self.se.depth_tracking.early_end();
        }
        Ok(())
    }
}

struct TupleSerializer<'a> {
    se: &'a mut ChainSerializer,
}

impl<'a> TupleSerializer<'a> {
    fn new(se: &'a mut ChainSerializer) -> Self {
        Self { se }
    }
}

impl<'a> SerializeTuple for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleStruct for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleVariant for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Encode a map, keeping entries in the order they arrive. Unknown lengths are handled the same
/// way [`SeqSerializer`] handles them.
struct MapSerializer<'a> {
    se: &'a mut ChainSerializer,
    key: String,
    unknown_len: Option<(usize, Vec<u8>)>,
}

impl<'a> MapSerializer<'a> {
    fn new(se: &'a mut ChainSerializer, len: Option<usize>) -> Result<Self> {
        let unknown_len = if let Some(len) = len {
            se.encode_element(Element::Map(len))?;
            None
        } else {
            se.depth_tracking
                .update_elem(&Element::Map(usize::MAX), se.buf.len())?;
            Some((0, mem::take(&mut se.buf)))
        };
        Ok(Self {
            se,
            key: String::new(),
            unknown_len,
        })
    }
}

impl<'a> SerializeMap for MapSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some((ref mut len, _)) = self.unknown_len {
            *len += 1;
        }
        // Turn the key into a String or fail (this clears out the string before serializing)
        value.serialize(KeySerializer::new(&mut self.key))?;
        self.se.encode_element(Element::Str(&self.key))
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        if let Some((len, enc)) = self.unknown_len {
            // The serializer has our temporary buffer. Swap back, put in the real Map marker,
            // and extend
            let enc = mem::replace(&mut self.se.buf, enc);
            serialize_elem(&mut self.se.buf, &Element::Map(len))?;
            self.se.buf.extend_from_slice(&enc);
            self.se.depth_tracking.early_end();
        }
        Ok(())
    }
}

struct StructSerializer<'a> {
    se: &'a mut ChainSerializer,
}

impl<'a> StructSerializer<'a> {
    fn new(se: &'a mut ChainSerializer) -> Self {
        Self { se }
    }

    fn serialize_field_inner<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.se.encode_element(Element::Str(field))?;
        value.serialize(&mut *self.se)
    }
}

impl<'a> SerializeStruct for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.serialize_field_inner(field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeStructVariant for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.serialize_field_inner(field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Generates `Serializer` methods that refuse their input.
macro_rules! reject {
    ($($method:ident($($arg:ty),*) -> $ret:ty => $what:expr;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ret> {
                Err(self.ser_fail($what))
            }
        )*
    };
}

/// Receives the payload of an address, hash, or wide integer and writes it with its dedicated
/// tag. Anything other than a single byte sequence is an error.
struct ExtSerializer<'a> {
    kind: ExtKind,
    received: bool,
    se: &'a mut ChainSerializer,
}

impl<'a> ExtSerializer<'a> {
    fn new(kind: ExtKind, se: &'a mut ChainSerializer) -> Self {
        Self {
            kind,
            received: false,
            se,
        }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        let s = format!("expected bytes, received {}", received);
        Error::SerdeFail(s)
    }

    fn finish(self) -> Result<()> {
        if self.received {
            Ok(())
        } else {
            Err(self.ser_fail("nothing"))
        }
    }
}

impl<'a, 'b> Serializer for &'b mut ExtSerializer<'a> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        if self.received {
            return Err(self.ser_fail("a second byte sequence"));
        }
        self.received = true;
        match self.kind {
            ExtKind::Address => self
                .se
                .encode_element(Element::Address(Address::from_slice(v)?)),
            ExtKind::Hash32 => self
                .se
                .encode_element(Element::Hash32(Hash32::from_slice(v)?)),
            ExtKind::Integer => {
                let v = Integer::from_ext_bytes(v).ok_or_else(|| {
                    Error::SerdeFail("Integer bytes weren't valid on encode".to_string())
                })?;
                self.se.encode_integer(v)
            }
        }
    }

    reject! {
        serialize_bool(bool) -> () => "bool";
        serialize_i8(i8) -> () => "i8";
        serialize_i16(i16) -> () => "i16";
        serialize_i32(i32) -> () => "i32";
        serialize_i64(i64) -> () => "i64";
        serialize_u8(u8) -> () => "u8";
        serialize_u16(u16) -> () => "u16";
        serialize_u32(u32) -> () => "u32";
        serialize_u64(u64) -> () => "u64";
        serialize_f32(f32) -> () => "f32";
        serialize_f64(f64) -> () => "f64";
        serialize_char(char) -> () => "char";
        serialize_str(&str) -> () => "str";
        serialize_none() -> () => "None";
        serialize_unit() -> () => "unit";
        serialize_unit_struct(&'static str) -> () => "unit_struct";
        serialize_unit_variant(&'static str, u32, &'static str) -> () => "unit_variant";
        serialize_seq(Option<usize>) -> Self::SerializeSeq => "seq";
        serialize_tuple(usize) -> Self::SerializeTuple => "tuple";
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct => "tuple_struct";
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant => "tuple_variant";
        serialize_map(Option<usize>) -> Self::SerializeMap => "map";
        serialize_struct(&'static str, usize) -> Self::SerializeStruct => "struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant => "struct_variant";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _v: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_struct"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }
}

struct KeySerializer<'a> {
    s: &'a mut String,
}

impl<'a> KeySerializer<'a> {
    fn new(s: &'a mut String) -> Self {
        s.clear();
        Self { s }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        let s = format!("map keys must be strings, received {}", received);
        Error::SerdeFail(s)
    }
}

impl<'a> Serializer for KeySerializer<'a> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.s.push(v);
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.s.push_str(v);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.s.push_str(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    reject! {
        serialize_bool(bool) -> () => "bool";
        serialize_i8(i8) -> () => "i8";
        serialize_i16(i16) -> () => "i16";
        serialize_i32(i32) -> () => "i32";
        serialize_i64(i64) -> () => "i64";
        serialize_u8(u8) -> () => "u8";
        serialize_u16(u16) -> () => "u16";
        serialize_u32(u32) -> () => "u32";
        serialize_u64(u64) -> () => "u64";
        serialize_f32(f32) -> () => "f32";
        serialize_f64(f64) -> () => "f64";
        serialize_bytes(&[u8]) -> () => "bytes";
        serialize_none() -> () => "None";
        serialize_unit() -> () => "unit";
        serialize_unit_struct(&'static str) -> () => "unit_struct";
        serialize_seq(Option<usize>) -> Self::SerializeSeq => "seq";
        serialize_tuple(usize) -> Self::SerializeTuple => "tuple";
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct => "tuple_struct";
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant => "tuple_variant";
        serialize_map(Option<usize>) -> Self::SerializeMap => "map";
        serialize_struct(&'static str, usize) -> Self::SerializeStruct => "struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant => "struct_variant";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use ruint::aliases::U256;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Transfer {
        to: Address,
        amount: Integer,
        memo: Option<String>,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    }

    #[derive(Serialize)]
    enum Op {
        Noop,
        Burn(u64),
        Swap(u8, u8),
        Mint { amount: u32 },
    }

    #[test]
    fn integers() {
        assert_eq!(to_vec(&42u64).unwrap(), vec![0x2a]);
        assert_eq!(to_vec(&42i64).unwrap(), vec![0x2a]);
        assert_eq!(to_vec(&256i32).unwrap(), vec![0xcd, 0x01, 0x00]);
        assert_eq!(to_vec(&-1i64).unwrap(), vec![0xff]);
        assert_eq!(to_vec(&-33i8).unwrap(), vec![0xd0, 0xdf]);

        let enc = to_vec(&u128::MAX).unwrap();
        assert_eq!(enc[0], 0xd4);
        assert_eq!(enc.len(), 17);

        let enc = to_vec(&i128::MIN).unwrap();
        assert_eq!(enc[0], 0xd6);
        assert_eq!(enc.len(), 33);

        let mut expected = vec![0xd5];
        expected.extend_from_slice(&[0xff; 32]);
        assert_eq!(to_vec(&Integer::max_value()).unwrap(), expected);
        assert_eq!(to_vec(&Integer::from(U256::MAX)).unwrap(), expected);
    }

    #[test]
    fn floats_rejected() {
        assert_eq!(
            to_vec(&1.5f64),
            Err(Error::Unsupported("floating-point values"))
        );
        assert!(to_vec(&vec![1.0f32]).is_err());
    }

    #[test]
    fn struct_fields_in_order() {
        let transfer = Transfer {
            to: Address::new([0xaa; 20]),
            amount: Integer::from(1000u32),
            memo: None,
            data: vec![1, 2],
        };
        let enc = to_vec(&transfer).unwrap();
        let mut expected = vec![0x84, 0xa2, b't', b'o', 0xd7];
        expected.extend_from_slice(&[0xaa; 20]);
        expected.extend_from_slice(&[0xa6, b'a', b'm', b'o', b'u', b'n', b't', 0xcd, 0x03, 0xe8]);
        expected.extend_from_slice(&[0xa4, b'm', b'e', b'm', b'o', 0xc0]);
        expected.extend_from_slice(&[0xa4, b'd', b'a', b't', b'a', 0xc4, 0x02, 0x01, 0x02]);
        assert_eq!(enc, expected);
    }

    #[test]
    fn enums() {
        assert_eq!(to_vec(&Op::Noop).unwrap(), vec![0xa4, b'N', b'o', b'o', b'p']);
        assert_eq!(
            to_vec(&Op::Burn(7)).unwrap(),
            vec![0x81, 0xa4, b'B', b'u', b'r', b'n', 0x07]
        );
        assert_eq!(
            to_vec(&Op::Swap(1, 2)).unwrap(),
            vec![0x81, 0xa4, b'S', b'w', b'a', b'p', 0x92, 0x01, 0x02]
        );
        assert_eq!(
            to_vec(&Op::Mint { amount: 3 }).unwrap(),
            vec![
                0x81, 0xa4, b'M', b'i', b'n', b't', 0x81, 0xa6, b'a', b'm', b'o', b'u', b'n',
                b't', 0x03
            ]
        );
    }

    #[test]
    fn map_keys() {
        let mut map = BTreeMap::new();
        map.insert(1u8, true);
        assert!(matches!(to_vec(&map), Err(Error::SerdeFail(_))));

        let mut map = BTreeMap::new();
        map.insert('k', true);
        assert_eq!(to_vec(&map).unwrap(), vec![0x81, 0xa1, b'k', 0xc3]);
    }

    struct Unsized<'a>(&'a [Value]);

    impl<'a> Serialize for Unsized<'a> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(None)?;
            for item in self.0 {
                seq.serialize_element(item)?;
            }
            seq.end()
        }
    }

    struct UnsizedMap<'a>(&'a [(&'a str, Value)]);

    impl<'a> Serialize for UnsizedMap<'a> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(None)?;
            for (k, v) in self.0 {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }

    #[test]
    fn unknown_lengths() {
        let items = vec![
            Value::from(1u8),
            Value::from("two"),
            Value::Array(vec![Value::Nil; 20]),
        ];
        let sized = to_vec(&items).unwrap();
        assert_eq!(to_vec(&Unsized(&items)).unwrap(), sized);
        // Nested inside a sized container
        assert_eq!(
            to_vec(&(Unsized(&items), 5u8)).unwrap(),
            to_vec(&(&items, 5u8)).unwrap()
        );

        let pairs = vec![("z", Value::from(1u8)), ("a", Value::Bool(false))];
        let enc = to_vec(&UnsizedMap(&pairs)).unwrap();
        assert_eq!(enc, vec![0x82, 0xa1, b'z', 0x01, 0xa1, b'a', 0xc2]);
    }

    struct Filtered<'a>(&'a [Value]);

    impl<'a> Serialize for Filtered<'a> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(self.0.iter().filter(|_| true))
        }
    }

    /// Claims an exact length of `claimed`, then yields `actual` items.
    struct Miscounted {
        claimed: usize,
        actual: usize,
    }

    impl Iterator for Miscounted {
        type Item = u8;
        fn next(&mut self) -> Option<u8> {
            if self.actual == 0 {
                return None;
            }
            self.actual -= 1;
            Some(1)
        }
        fn size_hint(&self) -> (usize, Option<usize>) {
            (self.claimed, Some(self.claimed))
        }
    }

    struct CollectMiscounted(usize, usize);

    impl Serialize for CollectMiscounted {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(Miscounted {
                claimed: self.0,
                actual: self.1,
            })
        }
    }

    #[test]
    fn collected_sequences() {
        let items = vec![Value::from(7u8), Value::Nil, Value::from("x")];
        assert_eq!(to_vec(&Filtered(&items)).unwrap(), to_vec(&items).unwrap());
        assert_eq!(to_vec(&Filtered(&[])).unwrap(), vec![0x90]);

        assert_eq!(to_vec(&CollectMiscounted(2, 2)).unwrap(), vec![0x92, 0x01, 0x01]);
        assert!(matches!(
            to_vec(&CollectMiscounted(2, 3)),
            Err(Error::SerdeFail(_))
        ));
        assert!(matches!(
            to_vec(&CollectMiscounted(2, 1)),
            Err(Error::SerdeFail(_))
        ));
    }

    #[test]
    fn depth_limit() {
        let mut v = Value::Nil;
        for _ in 0..MAX_DEPTH {
            v = Value::Array(vec![v]);
        }
        assert!(to_vec(&v).is_ok());
        let v = Value::Array(vec![v]);
        assert!(matches!(to_vec(&v), Err(Error::NestingTooDeep { .. })));
    }

    #[test]
    fn value_matches_writer() {
        let v = Value::Array(vec![
            Value::from(-200i32),
            Value::Int(Integer::min_value()),
            Value::Address(Address::new([3; 20])),
            Value::Hash32(Hash32::new([4; 32])),
            Value::Bin(vec![9; 300]),
        ]);
        let mut w = crate::writer::Writer::new();
        w.write(&v).unwrap();
        assert_eq!(to_vec(&v).unwrap(), w.finalize());
    }
}
