//! Fixed-width payload types: 20-byte addresses and 32-byte hashes.

use std::convert::TryFrom;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, VariantAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::ext::{ExtKind, EXT_TYPE_ENUM, EXT_VARIANTS};

/// Length of an [`Address`] payload.
pub const ADDRESS_LEN: usize = 20;
/// Length of a [`Hash32`] payload.
pub const HASH32_LEN: usize = 32;

macro_rules! fixed_bytes {
    ($name:ident, $len:expr, $kind:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Copy out of a slice, failing unless it is exactly the right length.
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let array = <[u8; $len]>::try_from(bytes).map_err(|_| {
                    Error::InvalidFixedSizePayload {
                        kind: $kind.name(),
                        expected: $len,
                        actual: bytes.len(),
                    }
                })?;
                Ok(Self(array))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn into_bytes(self) -> [u8; $len] {
                self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = Error;

            fn try_from(bytes: &[u8]) -> Result<Self> {
                Self::from_slice(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_newtype_variant(
                    EXT_TYPE_ENUM,
                    $kind.index(),
                    $kind.name(),
                    serde_bytes::Bytes::new(&self.0),
                )
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct FixedVisitor;

                impl<'de> Visitor<'de> for FixedVisitor {
                    type Value = $name;

                    fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(fmt, "{} bytes of {}", $len, $kind.name())
                    }

                    fn visit_enum<A: EnumAccess<'de>>(
                        self,
                        data: A,
                    ) -> Result<Self::Value, A::Error> {
                        let (kind, variant) = data.variant::<ExtKind>()?;
                        if kind != $kind {
                            return Err(de::Error::custom(format!(
                                "expected {}, got {}",
                                $kind.name(),
                                kind.name()
                            )));
                        }
                        let bytes: serde_bytes::ByteBuf = variant.newtype_variant()?;
                        $name::from_slice(&bytes).map_err(de::Error::custom)
                    }
                }

                deserializer.deserialize_enum(EXT_TYPE_ENUM, EXT_VARIANTS, FixedVisitor)
            }
        }
    };
}

fixed_bytes!(
    Address,
    ADDRESS_LEN,
    ExtKind::Address,
    "A 20-byte account address."
);
fixed_bytes!(Hash32, HASH32_LEN, ExtKind::Hash32, "A 32-byte hash digest.");

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrong_length() {
        let err = Address::from_slice(&[0u8; 19]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidFixedSizePayload {
                kind: "Address",
                expected: 20,
                actual: 19
            }
        );
        let err = Hash32::try_from(&[0u8; 33][..]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidFixedSizePayload {
                kind: "Hash32",
                expected: 32,
                actual: 33
            }
        );
    }

    #[test]
    fn display() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xab;
        bytes[19] = 0x01;
        let addr = Address::new(bytes);
        assert_eq!(
            addr.to_string(),
            "0xab00000000000000000000000000000000000001"
        );
        assert_eq!(
            format!("{:?}", addr),
            "Address(0xab00000000000000000000000000000000000001)"
        );
    }
}
