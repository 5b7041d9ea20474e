use std::borrow::Cow;
use std::convert::TryFrom;
use std::ops::Index;

use indexmap::IndexMap;
use ruint::aliases::U256;

use crate::ext::ExtKind;
use crate::fixed::{Address, Hash32};
use crate::integer::Integer;

/// Any decoded value. Integers written with signed and unsigned tags both land in
/// [`Value::Int`]; use [`decode_with_category`](crate::decode_with_category) or
/// [`Cursor::peek_category`](crate::Cursor::peek_category) if the wire category matters.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(Integer),
    Bin(Vec<u8>),
    Str(String),
    Array(Vec<Value>),
    /// Keys keep the order they were inserted or decoded in.
    Map(IndexMap<String, Value>),
    Address(Address),
    Hash32(Hash32),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_i64(&self) -> bool {
        if let Value::Int(ref v) = *self {
            v.is_i64()
        } else {
            false
        }
    }

    pub fn is_u64(&self) -> bool {
        if let Value::Int(ref v) = *self {
            v.is_u64()
        } else {
            false
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_bin(&self) -> bool {
        matches!(self, Value::Bin(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_address(&self) -> bool {
        matches!(self, Value::Address(_))
    }

    pub fn is_hash32(&self) -> bool {
        matches!(self, Value::Hash32(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let Value::Int(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(ref n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(ref n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match *self {
            Value::Int(ref n) => n.as_u256(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(ref val) = *self {
            Some(val.as_str())
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        if let Value::Bin(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(ref array) = *self {
            Some(array)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match *self {
            Value::Array(ref mut array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        if let Value::Map(ref map) = *self {
            Some(map)
        } else {
            None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match *self {
            Value::Map(ref mut map) => Some(map),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        if let Value::Address(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_hash32(&self) -> Option<&Hash32> {
        if let Value::Hash32(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }
}

impl std::default::Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

static NIL: Value = Value::Nil;

impl Index<usize> for Value {
    type Output = Value;

    /// Returns [`Value::Nil`] if this isn't an array or the index is out of bounds.
    fn index(&self, index: usize) -> &Self::Output {
        self.as_array().and_then(|v| v.get(index)).unwrap_or(&NIL)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Returns [`Value::Nil`] if this isn't a map or the key is missing.
    fn index(&self, index: &str) -> &Self::Output {
        self.as_map().and_then(|v| v.get(index)).unwrap_or(&NIL)
    }
}

macro_rules! impl_value_from_integer {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(From::from(v))
            }
        }
    };
}

macro_rules! impl_value_from {
    ($t: ty, $p: ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$p(v)
            }
        }
    };
}

impl_value_from!(bool, Bool);
impl_value_from!(Integer, Int);
impl_value_from!(String, Str);
impl_value_from!(Vec<u8>, Bin);
impl_value_from!(Vec<Value>, Array);
impl_value_from!(IndexMap<String, Value>, Map);
impl_value_from!(Address, Address);
impl_value_from!(Hash32, Hash32);
impl_value_from_integer!(u8);
impl_value_from_integer!(u16);
impl_value_from_integer!(u32);
impl_value_from_integer!(u64);
impl_value_from_integer!(u128);
impl_value_from_integer!(usize);
impl_value_from_integer!(i8);
impl_value_from_integer!(i16);
impl_value_from_integer!(i32);
impl_value_from_integer!(i64);
impl_value_from_integer!(i128);
impl_value_from_integer!(isize);
impl_value_from_integer!(U256);

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Nil
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(v: Cow<'a, str>) -> Self {
        Value::Str(v.into_owned())
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bin(v.into())
    }
}

impl<V: Into<Value>> std::iter::FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let v: Vec<Value> = iter.into_iter().map(Into::into).collect();
        Value::Array(v)
    }
}

macro_rules! impl_try_from_value {
    ($t: ty, $p: ident) => {
        impl TryFrom<Value> for $t {
            type Error = Value;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$p(v) => Ok(v),
                    _ => Err(v),
                }
            }
        }
    };
}

impl_try_from_value!(bool, Bool);
impl_try_from_value!(Integer, Int);
impl_try_from_value!(String, Str);
impl_try_from_value!(Vec<u8>, Bin);
impl_try_from_value!(Vec<Value>, Array);
impl_try_from_value!(IndexMap<String, Value>, Map);
impl_try_from_value!(Address, Address);
impl_try_from_value!(Hash32, Hash32);

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => v.serialize(serializer),
            Value::Bin(v) => serializer.serialize_bytes(v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Array(v) => v.serialize(serializer),
            Value::Map(v) => serializer.collect_map(v),
            Value::Address(v) => v.serialize(serializer),
            Value::Hash32(v) => v.serialize(serializer),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::*;
        use std::fmt;

        struct ValueVisitor;
        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("any valid chainpack Value")
            }

            fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::Int(Integer::from(v)))
            }

            fn visit_i128<E: Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(Value::Int(Integer::from(v)))
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::Int(Integer::from(v)))
            }

            fn visit_u128<E: Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(Value::Int(Integer::from(v)))
            }

            fn visit_f64<E: Error>(self, _: f64) -> Result<Self::Value, E> {
                Err(E::custom("floating-point values are not supported"))
            }

            fn visit_char<E: Error>(self, v: char) -> Result<Self::Value, E> {
                Ok(Value::Str(v.to_string()))
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::Str(v.into()))
            }

            fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::Str(v))
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Bin(v.into()))
            }

            fn visit_byte_buf<E: Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Bin(v))
            }

            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                // Allocate with the size hint, but be conservative. 4096 is what serde uses
                // internally for collections, so we'll do likewise.
                let mut seq = match access.size_hint() {
                    Some(size) => Vec::with_capacity(size.min(4096)),
                    None => Vec::new(),
                };
                while let Some(elem) = access.next_element()? {
                    seq.push(elem);
                }
                Ok(Value::Array(seq))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = match access.size_hint() {
                    Some(size) => IndexMap::with_capacity(size.min(4096)),
                    None => IndexMap::new(),
                };
                while let Some((key, val)) = access.next_entry()? {
                    map.insert(key, val);
                }
                Ok(Value::Map(map))
            }

            /// Only reached for addresses, hashes, and integers too wide for serde's data model.
            fn visit_enum<A: EnumAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
                let (kind, access) = access.variant::<ExtKind>()?;
                let bytes: serde_bytes::ByteBuf = access.newtype_variant()?;
                match kind {
                    ExtKind::Address => Address::from_slice(&bytes)
                        .map(Value::Address)
                        .map_err(A::Error::custom),
                    ExtKind::Hash32 => Hash32::from_slice(&bytes)
                        .map(Value::Hash32)
                        .map_err(A::Error::custom),
                    ExtKind::Integer => Integer::from_ext_bytes(&bytes)
                        .map(Value::Int)
                        .ok_or_else(|| A::Error::invalid_length(bytes.len(), &"a 33-byte integer")),
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn index() {
        let v: Value = vec![
            Value::from(1u8),
            map(vec![("a", Value::from("x")), ("b", Value::Nil)]),
        ]
        .into_iter()
        .collect();
        assert_eq!(v[0], Value::from(1u8));
        assert_eq!(v[1]["a"], Value::from("x"));
        assert_eq!(v[1]["missing"], Value::Nil);
        assert_eq!(v[7], Value::Nil);
        assert_eq!(v["not a map"], Value::Nil);
    }

    #[test]
    fn accessors() {
        let v = Value::from(-5i32);
        assert!(v.is_int());
        assert!(v.is_i64());
        assert!(!v.is_u64());
        assert_eq!(v.as_i64(), Some(-5));
        assert_eq!(v.as_u256(), None);
        assert_eq!(Value::from(U256::MAX).as_u256(), Some(U256::MAX));
        assert_eq!(Value::from(Some("a")), Value::from("a"));
        assert_eq!(Value::from(None::<bool>), Value::Nil);
        let addr = Address::new([1; 20]);
        assert_eq!(Value::from(addr).as_address(), Some(&addr));
        assert_eq!(Address::try_from(Value::from(addr)), Ok(addr));
        assert_eq!(Hash32::try_from(Value::Nil), Err(Value::Nil));
    }

    #[test]
    fn map_keeps_order() {
        let v = map(vec![
            ("z", Value::from(1u8)),
            ("a", Value::from(2u8)),
            ("m", Value::from(3u8)),
        ]);
        let keys: Vec<&str> = v.as_map().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
