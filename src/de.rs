//! Deserialization.
//!
//! Decoding is tolerant: any tag tier that holds a value is accepted, map keys may arrive in any
//! order, and enums may be written as a variant name or as a one-entry map.

use serde::de::Error as DeError;
use serde::de::*;

use crate::cursor::Cursor;
use crate::depth_tracking::DepthTracker;
use crate::{
    element::*,
    error::{Error, Result},
    ext::{ExtKind, EXT_TYPE_ENUM},
    integer::Integer,
    marker::{Category, Marker},
    MAX_DEPTH,
};

/// Deserialize the first value in a byte slice. Anything after it is ignored.
pub fn from_slice<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<T> {
    let mut de = ChainDeserializer::new(buf);
    T::deserialize(&mut de)
}

struct ChainDeserializer<'a> {
    depth_tracking: DepthTracker,
    cursor: Cursor<'a>,
}

impl<'a> ChainDeserializer<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            depth_tracking: DepthTracker::new(MAX_DEPTH),
            cursor: Cursor::new(buf),
        }
    }

    fn next_elem(&mut self) -> Result<Element<'a>> {
        let offset = self.cursor.position();
        let elem = self.cursor.read_element()?;
        self.depth_tracking.update_elem(&elem, offset)?;
        Ok(elem)
    }

    fn visit_integer<'de, V: Visitor<'de>>(v: Integer, visitor: V) -> Result<V::Value> {
        if let Some(n) = v.as_u64() {
            visitor.visit_u64(n)
        } else if let Some(n) = v.as_i64() {
            visitor.visit_i64(n)
        } else if let Some(n) = v.as_u128() {
            visitor.visit_u128(n)
        } else if let Some(n) = v.as_i128() {
            visitor.visit_i128(n)
        } else {
            visitor.visit_enum(ExtAccess::new(Element::Signed(v)))
        }
    }
}

impl<'de, 'a> serde::Deserializer<'de> for &'a mut ChainDeserializer<'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let elem = self.next_elem()?;
        match elem {
            Element::Nil => visitor.visit_unit(),
            Element::Bool(v) => visitor.visit_bool(v),
            Element::Unsigned(v) => ChainDeserializer::visit_integer(v.into(), visitor),
            Element::Signed(v) => ChainDeserializer::visit_integer(v, visitor),
            Element::Str(v) => visitor.visit_borrowed_str(v),
            Element::Bin(v) => visitor.visit_borrowed_bytes(v),
            Element::Array(len) => {
                let mut seq = SeqAccess::new(self, len);
                let val = visitor.visit_seq(&mut seq)?;
                if seq.size_left != 0 {
                    return Err(Error::invalid_length(len, &"fewer elements in array"));
                }
                Ok(val)
            }
            Element::Map(len) => {
                let mut map = MapAccess::new(self, len);
                let val = visitor.visit_map(&mut map)?;
                if map.size_left != 0 {
                    return Err(Error::invalid_length(len, &"fewer entries in map"));
                }
                Ok(val)
            }
            Element::Address(v) => visitor.visit_enum(ExtAccess::new(Element::Address(v))),
            Element::Hash32(v) => visitor.visit_enum(ExtAccess::new(Element::Hash32(v))),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.cursor.peek_marker()? == Marker::Nil {
            self.next_elem()?;
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if name == EXT_TYPE_ENUM {
            let offset = self.cursor.position();
            let elem = self.next_elem()?;
            match elem {
                Element::Address(_) | Element::Hash32(_) => {
                    visitor.visit_enum(ExtAccess::new(elem))
                }
                Element::Unsigned(v) => {
                    visitor.visit_enum(ExtAccess::new(Element::Signed(v.into())))
                }
                Element::Signed(_) => visitor.visit_enum(ExtAccess::new(elem)),
                _ => Err(Error::SerdeFail(format!(
                    "expected an address, hash, or integer at offset {}, but found {}",
                    offset,
                    elem.category()
                ))),
            }
        } else {
            visitor.visit_enum(EnumAccess::new(self))
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // Skipping consumes a whole value, which counts as one element to any enclosing container.
        // The skipped value only gets the nesting left over by its parents.
        let offset = self.cursor.position();
        let budget = MAX_DEPTH.saturating_sub(self.depth_tracking.depth());
        self.cursor.skip_within(budget)?;
        self.depth_tracking.update_elem(&Element::Nil, offset)?;
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf unit unit_struct newtype_struct
        seq tuple tuple_struct map struct identifier
    }
}

/// Hands out an address, hash, or wide integer as a newtype variant of the extension enum: first
/// the variant index, then the raw payload bytes.
struct ExtAccess<'de> {
    element: Element<'de>,
    tag_was_read: bool,
}

impl<'de> ExtAccess<'de> {
    fn new(element: Element<'de>) -> Self {
        Self {
            element,
            tag_was_read: false,
        }
    }
}

impl<'de> serde::de::EnumAccess<'de> for ExtAccess<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(mut self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let val = seed.deserialize(&mut self)?;
        Ok((val, self))
    }
}

impl<'de> serde::de::VariantAccess<'de> for ExtAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"unit variant"))
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut self)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"struct variant"))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"tuple variant"))
    }
}

impl<'de> Deserializer<'de> for &mut ExtAccess<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if !self.tag_was_read {
            self.tag_was_read = true;
            let kind = match self.element {
                Element::Address(_) => ExtKind::Address,
                Element::Hash32(_) => ExtKind::Hash32,
                Element::Signed(_) => ExtKind::Integer,
                _ => unreachable!("ExtAccess should never see any other Element type"),
            };
            visitor.visit_u64(kind.index() as u64)
        } else {
            match self.element {
                Element::Address(ref v) => visitor.visit_bytes(v.as_bytes()),
                Element::Hash32(ref v) => visitor.visit_bytes(v.as_bytes()),
                Element::Signed(ref v) => visitor.visit_bytes(&v.to_ext_bytes()),
                _ => unreachable!("ExtAccess should never see any other Element type"),
            }
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct
        seq tuple tuple_struct map struct enum identifier ignored_any
    }
}

struct EnumAccess<'a, 'de> {
    de: &'a mut ChainDeserializer<'de>,
    has_value: bool,
}

impl<'a, 'de> EnumAccess<'a, 'de> {
    fn new(de: &'a mut ChainDeserializer<'de>) -> Self {
        Self {
            de,
            has_value: false,
        }
    }
}

impl<'a, 'de> serde::de::EnumAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(mut self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let offset = self.de.cursor.position();
        let val = match self.de.cursor.peek_category()? {
            Category::Map => {
                if self.de.next_elem()? != Element::Map(1) {
                    self.de.cursor.set_position(offset)?;
                    return Err(Error::SerdeFail(format!(
                        "expected a size-1 map for an enum at offset {}",
                        offset
                    )));
                }
                self.has_value = true;
                seed.deserialize(&mut *self.de)?
            }
            Category::Text => {
                self.has_value = false;
                seed.deserialize(&mut *self.de)?
            }
            actual => {
                return Err(Error::SerdeFail(format!(
                    "expected a size-1 map or a string for an enum at offset {}, but found {}",
                    offset, actual
                )))
            }
        };
        Ok((val, self))
    }
}

impl<'a, 'de> serde::de::VariantAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        if self.has_value {
            Err(Error::SerdeFail(
                "invalid type: non-unit variant, expected unit variant".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        if self.has_value {
            seed.deserialize(&mut *self.de)
        } else {
            Err(Error::SerdeFail(
                "invalid type: unit variant, expected newtype variant".to_string(),
            ))
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.has_value {
            self.de.deserialize_map(visitor)
        } else {
            Err(Error::SerdeFail(
                "invalid type: unit variant, expected struct variant".to_string(),
            ))
        }
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.has_value {
            self.de.deserialize_tuple(len, visitor)
        } else {
            Err(Error::SerdeFail(
                "invalid type: unit variant, expected tuple variant".to_string(),
            ))
        }
    }
}

struct SeqAccess<'a, 'de> {
    de: &'a mut ChainDeserializer<'de>,
    size_left: usize,
}

impl<'a, 'de> SeqAccess<'a, 'de> {
    fn new(de: &'a mut ChainDeserializer<'de>, len: usize) -> Self {
        Self { de, size_left: len }
    }
}

impl<'a, 'de> serde::de::SeqAccess<'de> for SeqAccess<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.size_left > 0 {
            self.size_left -= 1;
            let val = seed.deserialize(&mut *self.de)?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.size_left)
    }
}

/// A map key, handed to the key's `Deserialize` impl as a borrowed string.
#[derive(Clone, Copy)]
struct KeyStr<'de>(&'de str);

impl<'de> Deserializer<'de> for KeyStr<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.0)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct
        seq tuple tuple_struct map struct enum identifier ignored_any
    }
}

struct MapAccess<'a, 'de> {
    de: &'a mut ChainDeserializer<'de>,
    size_left: usize,
}

impl<'a, 'de> MapAccess<'a, 'de> {
    fn new(de: &'a mut ChainDeserializer<'de>, len: usize) -> Self {
        Self { de, size_left: len }
    }
}

impl<'a, 'de> serde::de::MapAccess<'de> for MapAccess<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.size_left == 0 {
            return Ok(None);
        }
        self.size_left -= 1;
        let offset = self.de.cursor.position();
        match self.de.next_elem()? {
            Element::Str(key) => Ok(Some(seed.deserialize(KeyStr(key))?)),
            elem => Err(Error::TypeMismatch {
                offset,
                expected: Category::Text,
                actual: elem.category(),
            }),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.size_left)
    }
}
