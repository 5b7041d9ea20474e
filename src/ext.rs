//! Serde plumbing for the types that have dedicated tags but no serde data model equivalent:
//! addresses, 32-byte hashes, and integers wider than 128 bits.
//!
//! Each one serializes as a newtype variant of a marker enum, with the raw payload as bytes. The
//! chainpack serializer recognizes the enum name and writes the dedicated tag; any other
//! serializer just sees an ordinary enum.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};

pub(crate) const EXT_TYPE_ENUM: &str = "$chainpack::ExtType";

pub(crate) const EXT_ADDRESS_INDEX: u32 = 0;
pub(crate) const EXT_HASH32_INDEX: u32 = 1;
pub(crate) const EXT_INTEGER_INDEX: u32 = 2;

pub(crate) const EXT_ADDRESS_NAME: &str = "Address";
pub(crate) const EXT_HASH32_NAME: &str = "Hash32";
pub(crate) const EXT_INTEGER_NAME: &str = "Integer";

pub(crate) const EXT_VARIANTS: &[&str] = &[EXT_ADDRESS_NAME, EXT_HASH32_NAME, EXT_INTEGER_NAME];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExtKind {
    Address,
    Hash32,
    Integer,
}

impl ExtKind {
    pub(crate) fn from_index(index: u32) -> Option<ExtKind> {
        match index {
            EXT_ADDRESS_INDEX => Some(ExtKind::Address),
            EXT_HASH32_INDEX => Some(ExtKind::Hash32),
            EXT_INTEGER_INDEX => Some(ExtKind::Integer),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> u32 {
        match self {
            ExtKind::Address => EXT_ADDRESS_INDEX,
            ExtKind::Hash32 => EXT_HASH32_INDEX,
            ExtKind::Integer => EXT_INTEGER_INDEX,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            ExtKind::Address => EXT_ADDRESS_NAME,
            ExtKind::Hash32 => EXT_HASH32_NAME,
            ExtKind::Integer => EXT_INTEGER_NAME,
        }
    }
}

impl<'de> Deserialize<'de> for ExtKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl<'de> Visitor<'de> for KindVisitor {
            type Value = ExtKind;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "a chainpack extension type")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ExtKind, E> {
                u32::try_from(v)
                    .ok()
                    .and_then(ExtKind::from_index)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ExtKind, E> {
                match v {
                    EXT_ADDRESS_NAME => Ok(ExtKind::Address),
                    EXT_HASH32_NAME => Ok(ExtKind::Hash32),
                    EXT_INTEGER_NAME => Ok(ExtKind::Integer),
                    _ => Err(E::unknown_variant(v, EXT_VARIANTS)),
                }
            }
        }

        deserializer.deserialize_identifier(KindVisitor)
    }
}
