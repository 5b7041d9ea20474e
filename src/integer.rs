use std::cmp;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, LowerHex, UpperHex};

use ruint::aliases::U256;
use serde::de::{self, Deserialize, Deserializer, EnumAccess, VariantAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::ext::{ExtKind, EXT_INTEGER_INDEX, EXT_INTEGER_NAME, EXT_TYPE_ENUM};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum IntPriv {
    /// Always non-less than zero.
    PosInt(U256),
    /// Always less than zero. Holds the 256-bit two's complement bit pattern, so the top bit is
    /// always set.
    NegInt(U256),
}

/// Represents an integer, whether signed or unsigned, from -2^255 up to 2^256 - 1.
///
/// A `Value` that contains integer can be constructed using `From` trait.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Integer {
    n: IntPriv,
}

/// Left-pad big-endian bytes out to 32 bytes with `fill`.
fn extend_be(bytes: &[u8], fill: u8) -> U256 {
    let mut buf = [fill; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    U256::from_be_bytes(buf)
}

/// Take the low `N` bytes of a big-endian 256-bit value.
fn low_bytes<const N: usize>(be: &[u8; 32]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&be[32 - N..]);
    out
}

impl Integer {
    /// Minimum possible integer that can be represented, -2^255.
    pub fn min_value() -> Integer {
        let mut bits = [0u8; 32];
        bits[0] = 0x80;
        Integer {
            n: IntPriv::NegInt(U256::from_be_bytes(bits)),
        }
    }

    /// Maximum possible integer that can be represented, 2^256 - 1.
    pub fn max_value() -> Integer {
        Integer {
            n: IntPriv::PosInt(U256::MAX),
        }
    }

    /// Interpret 256 bits as a two's complement signed value.
    pub fn from_twos_complement(bits: U256) -> Integer {
        if bits.bit(255) {
            Integer {
                n: IntPriv::NegInt(bits),
            }
        } else {
            Integer {
                n: IntPriv::PosInt(bits),
            }
        }
    }

    /// Interpret up to 32 big-endian bytes as a two's complement signed value, sign-extending from
    /// the top bit of the first byte.
    ///
    /// # Panics
    ///
    /// Panics if more than 32 bytes are provided.
    pub fn from_be_signed(bytes: &[u8]) -> Integer {
        assert!(bytes.len() <= 32);
        let negative = bytes.first().map_or(false, |b| b & 0x80 != 0);
        Integer::from_twos_complement(extend_be(bytes, if negative { 0xff } else { 0x00 }))
    }

    /// Interpret up to 32 big-endian bytes as an unsigned magnitude.
    ///
    /// # Panics
    ///
    /// Panics if more than 32 bytes are provided.
    pub fn from_be_unsigned(bytes: &[u8]) -> Integer {
        assert!(bytes.len() <= 32);
        Integer {
            n: IntPriv::PosInt(extend_be(bytes, 0x00)),
        }
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        matches!(self.n, IntPriv::NegInt(_))
    }

    /// Returns `true` if the integer can be represented as `i64`.
    #[inline]
    pub fn is_i64(&self) -> bool {
        self.as_i64().is_some()
    }

    /// Returns `true` if the integer can be represented as `u64`.
    #[inline]
    pub fn is_u64(&self) -> bool {
        self.as_u64().is_some()
    }

    /// Returns `true` if the integer fits in a 256-bit two's complement signed value.
    #[inline]
    pub fn is_i256(&self) -> bool {
        match self.n {
            IntPriv::PosInt(n) => !n.bit(255),
            IntPriv::NegInt(_) => true,
        }
    }

    /// Returns the integer represented as `u64` if possible, or else `None`.
    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            IntPriv::PosInt(n) if n.bit_len() <= 64 => {
                Some(u64::from_be_bytes(low_bytes(&n.to_be_bytes::<32>())))
            }
            _ => None,
        }
    }

    /// Returns the integer represented as `u128` if possible, or else `None`.
    pub fn as_u128(&self) -> Option<u128> {
        match self.n {
            IntPriv::PosInt(n) if n.bit_len() <= 128 => {
                Some(u128::from_be_bytes(low_bytes(&n.to_be_bytes::<32>())))
            }
            _ => None,
        }
    }

    /// Returns the integer represented as `i64` if possible, or else `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            IntPriv::PosInt(n) if n.bit_len() < 64 => {
                Some(i64::from_be_bytes(low_bytes(&n.to_be_bytes::<32>())))
            }
            IntPriv::NegInt(n) => {
                let be = n.to_be_bytes::<32>();
                if be[..24].iter().all(|b| *b == 0xff) && (be[24] & 0x80) != 0 {
                    Some(i64::from_be_bytes(low_bytes(&be)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns the integer represented as `i128` if possible, or else `None`.
    pub fn as_i128(&self) -> Option<i128> {
        match self.n {
            IntPriv::PosInt(n) if n.bit_len() < 128 => {
                Some(i128::from_be_bytes(low_bytes(&n.to_be_bytes::<32>())))
            }
            IntPriv::NegInt(n) => {
                let be = n.to_be_bytes::<32>();
                if be[..16].iter().all(|b| *b == 0xff) && (be[16] & 0x80) != 0 {
                    Some(i128::from_be_bytes(low_bytes(&be)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns the non-negative magnitude, or `None` for negative values.
    #[inline]
    pub fn as_u256(&self) -> Option<U256> {
        match self.n {
            IntPriv::PosInt(n) => Some(n),
            IntPriv::NegInt(_) => None,
        }
    }

    /// Returns the 256-bit two's complement form, or `None` if the value is 2^255 or larger.
    #[inline]
    pub fn as_twos_complement(&self) -> Option<U256> {
        if self.is_i256() {
            Some(self.as_bits())
        } else {
            None
        }
    }

    /// Forcibly casts the value to 256 bits without modification.
    #[inline]
    pub fn as_bits(&self) -> U256 {
        match self.n {
            IntPriv::PosInt(n) => n,
            IntPriv::NegInt(n) => n,
        }
    }

    /// Sign flag followed by the 256-bit pattern. Used to carry integers wider than 128 bits
    /// through serde.
    pub(crate) fn to_ext_bytes(self) -> [u8; 33] {
        let mut out = [0u8; 33];
        let bits = match self.n {
            IntPriv::PosInt(n) => n,
            IntPriv::NegInt(n) => {
                out[0] = 1;
                n
            }
        };
        out[1..].copy_from_slice(&bits.to_be_bytes::<32>());
        out
    }

    pub(crate) fn from_ext_bytes(bytes: &[u8]) -> Option<Integer> {
        if bytes.len() != 33 {
            return None;
        }
        let bits = extend_be(&bytes[1..], 0);
        match bytes[0] {
            0 => Some(Integer {
                n: IntPriv::PosInt(bits),
            }),
            1 if bits.bit(255) => Some(Integer {
                n: IntPriv::NegInt(bits),
            }),
            _ => None,
        }
    }
}

impl std::default::Default for Integer {
    fn default() -> Self {
        Self {
            n: IntPriv::PosInt(U256::ZERO),
        }
    }
}

impl cmp::Ord for Integer {
    fn cmp(&self, other: &Integer) -> Ordering {
        match (self.n, other.n) {
            (IntPriv::NegInt(lhs), IntPriv::NegInt(ref rhs)) => lhs.cmp(rhs),
            (IntPriv::NegInt(_), IntPriv::PosInt(_)) => Ordering::Less,
            (IntPriv::PosInt(_), IntPriv::NegInt(_)) => Ordering::Greater,
            (IntPriv::PosInt(lhs), IntPriv::PosInt(ref rhs)) => lhs.cmp(rhs),
        }
    }
}

impl cmp::PartialOrd for Integer {
    fn partial_cmp(&self, other: &Integer) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(&self.n, fmt)
    }
}

impl Display for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::PosInt(v) => Display::fmt(&v, fmt),
            IntPriv::NegInt(v) => write!(fmt, "-{}", v.wrapping_neg()),
        }
    }
}

impl UpperHex for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        UpperHex::fmt(&self.as_bits(), fmt)
    }
}

impl LowerHex for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        LowerHex::fmt(&self.as_bits(), fmt)
    }
}

macro_rules! impl_from_unsigned {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer::from_be_unsigned(&n.to_be_bytes())
            }
        }
    };
}

macro_rules! impl_from_signed {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer::from_be_signed(&n.to_be_bytes())
            }
        }
    };
}

impl_from_unsigned!(u8);
impl_from_unsigned!(u16);
impl_from_unsigned!(u32);
impl_from_unsigned!(u64);
impl_from_unsigned!(u128);
impl_from_unsigned!(usize);
impl_from_signed!(i8);
impl_from_signed!(i16);
impl_from_signed!(i32);
impl_from_signed!(i64);
impl_from_signed!(i128);
impl_from_signed!(isize);

impl From<U256> for Integer {
    fn from(n: U256) -> Self {
        Integer {
            n: IntPriv::PosInt(n),
        }
    }
}

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(v) = self.as_u64() {
            serializer.serialize_u64(v)
        } else if let Some(v) = self.as_i64() {
            serializer.serialize_i64(v)
        } else if let Some(v) = self.as_u128() {
            serializer.serialize_u128(v)
        } else if let Some(v) = self.as_i128() {
            serializer.serialize_i128(v)
        } else {
            serializer.serialize_newtype_variant(
                EXT_TYPE_ENUM,
                EXT_INTEGER_INDEX,
                EXT_INTEGER_NAME,
                serde_bytes::Bytes::new(&self.to_ext_bytes()),
            )
        }
    }
}

pub(crate) struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = Integer;

    fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "an integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Integer, E> {
        Ok(v.into())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Integer, E> {
        Ok(v.into())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Integer, E> {
        Ok(v.into())
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Integer, E> {
        Ok(v.into())
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Integer, A::Error> {
        let (kind, variant) = data.variant::<ExtKind>()?;
        if kind != ExtKind::Integer {
            return Err(de::Error::custom(format!(
                "expected an integer, got {}",
                kind.name()
            )));
        }
        let bytes: serde_bytes::ByteBuf = variant.newtype_variant()?;
        Integer::from_ext_bytes(&bytes)
            .ok_or_else(|| de::Error::invalid_length(bytes.len(), &"a 33-byte integer"))
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IntegerVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitive_conversions() {
        let cases: Vec<i128> = vec![
            0,
            1,
            -1,
            i64::MAX as i128,
            i64::MIN as i128,
            i64::MIN as i128 - 1,
            u64::MAX as i128,
            i128::MAX,
            i128::MIN,
        ];
        for case in cases {
            let int = Integer::from(case);
            assert_eq!(int.as_i128(), Some(case), "case {}", case);
            assert_eq!(int.is_negative(), case < 0);
            assert_eq!(int.as_i64(), i64::try_from(case).ok(), "case {}", case);
            assert_eq!(int.as_u64(), u64::try_from(case).ok(), "case {}", case);
            assert_eq!(int.to_string(), case.to_string());
        }
        assert_eq!(Integer::from(u128::MAX).as_u128(), Some(u128::MAX));
        assert_eq!(Integer::from(u128::MAX).as_i128(), None);
    }

    #[test]
    fn ordering() {
        let mut ints = vec![
            Integer::max_value(),
            Integer::from(5u8),
            Integer::min_value(),
            Integer::from(-5i8),
            Integer::from(i128::MIN),
            Integer::from(0u8),
        ];
        ints.sort();
        assert_eq!(
            ints,
            vec![
                Integer::min_value(),
                Integer::from(i128::MIN),
                Integer::from(-5i8),
                Integer::from(0u8),
                Integer::from(5u8),
                Integer::max_value(),
            ]
        );
    }

    #[test]
    fn twos_complement() {
        let minus_one = Integer::from_twos_complement(U256::MAX);
        assert_eq!(minus_one, Integer::from(-1i8));
        assert_eq!(Integer::from_be_signed(&[0xff, 0x7f]), Integer::from(-129i16));
        assert_eq!(Integer::from_be_signed(&[0x7f]), Integer::from(127u8));
        assert!(Integer::min_value().is_i256());
        assert!(!Integer::max_value().is_i256());
        assert_eq!(Integer::max_value().as_twos_complement(), None);
        assert_eq!(
            Integer::min_value().to_string(),
            "-57896044618658097711785492504343953926634992332820282019728792003956564819968"
        );
    }

    #[test]
    fn ext_bytes() {
        for int in [
            Integer::max_value(),
            Integer::min_value(),
            Integer::from(-3i8),
            Integer::from(7u8),
        ] {
            assert_eq!(Integer::from_ext_bytes(&int.to_ext_bytes()), Some(int));
        }
        // A "negative" flag on a non-negative bit pattern is malformed
        let mut bad = Integer::from(7u8).to_ext_bytes();
        bad[0] = 1;
        assert_eq!(Integer::from_ext_bytes(&bad), None);
        assert_eq!(Integer::from_ext_bytes(&[0u8; 32]), None);
    }
}
