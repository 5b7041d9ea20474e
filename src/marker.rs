//! The tag registry: every possible leading byte, what it means, and which value category it
//! belongs to.

use std::fmt;

use crate::error::{Error, Result};

/// The category of a encoded value, as seen from its leading tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Nil,
    Bool,
    Unsigned,
    Signed,
    Bytes,
    Text,
    Array,
    Map,
    Address,
    Hash32,
}

impl Category {
    pub fn name(&self) -> &'static str {
        use self::Category::*;
        match self {
            Nil => "Nil",
            Bool => "Bool",
            Unsigned => "Unsigned",
            Signed => "Signed",
            Bytes => "Bytes",
            Text => "Text",
            Array => "Array",
            Map => "Map",
            Address => "Address",
            Hash32 => "Hash32",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format markers. For internal use only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    PosFixInt(u8),
    FixMap(u8),
    FixArray(u8),
    FixStr(u8),
    Nil,
    Reserved(u8),
    False,
    True,
    Bin8,
    Bin16,
    Array8,
    Map8,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt128,
    UInt256,
    Int256,
    Address,
    Hash32,
    Str8,
    Str16,
    Array16,
    Map16,
    NegFixInt(i8),
}

impl Marker {
    /// Construct a marker from a single byte.
    pub const fn from_u8(n: u8) -> Marker {
        match n {
            0x00..=0x7f => Marker::PosFixInt(n),
            0x80..=0x8f => Marker::FixMap(n & 0x0F),
            0x90..=0x9f => Marker::FixArray(n & 0x0F),
            0xa0..=0xbf => Marker::FixStr(n & 0x1F),
            0xc0 => Marker::Nil,
            0xc2 => Marker::False,
            0xc3 => Marker::True,
            0xc4 => Marker::Bin8,
            0xc5 => Marker::Bin16,
            0xc7 => Marker::Array8,
            0xc8 => Marker::Map8,
            0xcc => Marker::UInt8,
            0xcd => Marker::UInt16,
            0xce => Marker::UInt32,
            0xcf => Marker::UInt64,
            0xd0 => Marker::Int8,
            0xd1 => Marker::Int16,
            0xd2 => Marker::Int32,
            0xd3 => Marker::Int64,
            0xd4 => Marker::UInt128,
            0xd5 => Marker::UInt256,
            0xd6 => Marker::Int256,
            0xd7 => Marker::Address,
            0xd8 => Marker::Hash32,
            0xd9 => Marker::Str8,
            0xda => Marker::Str16,
            0xdc => Marker::Array16,
            0xde => Marker::Map16,
            0xe0..=0xff => Marker::NegFixInt(n as i8),
            // 0xc1, plus the msgpack bin32/ext/float/str32/array32/map32 slots
            0xc1 | 0xc6 | 0xc9 | 0xca | 0xcb | 0xdb | 0xdd | 0xdf => Marker::Reserved(n),
        }
    }

    /// Converts a marker object into a single-byte representation.
    /// Assumes the content of the marker is already masked approprately
    pub const fn into_u8(self) -> u8 {
        match self {
            Marker::PosFixInt(val) => val,
            Marker::FixMap(len) => 0x80 | len,
            Marker::FixArray(len) => 0x90 | len,
            Marker::FixStr(len) => 0xa0 | len,
            Marker::Nil => 0xc0,
            Marker::Reserved(val) => val,
            Marker::False => 0xc2,
            Marker::True => 0xc3,
            Marker::Bin8 => 0xc4,
            Marker::Bin16 => 0xc5,
            Marker::Array8 => 0xc7,
            Marker::Map8 => 0xc8,
            Marker::UInt8 => 0xcc,
            Marker::UInt16 => 0xcd,
            Marker::UInt32 => 0xce,
            Marker::UInt64 => 0xcf,
            Marker::Int8 => 0xd0,
            Marker::Int16 => 0xd1,
            Marker::Int32 => 0xd2,
            Marker::Int64 => 0xd3,
            Marker::UInt128 => 0xd4,
            Marker::UInt256 => 0xd5,
            Marker::Int256 => 0xd6,
            Marker::Address => 0xd7,
            Marker::Hash32 => 0xd8,
            Marker::Str8 => 0xd9,
            Marker::Str16 => 0xda,
            Marker::Array16 => 0xdc,
            Marker::Map16 => 0xde,
            Marker::NegFixInt(val) => val as u8,
        }
    }

    /// The category this marker belongs to, or `None` for reserved bytes.
    pub const fn category(self) -> Option<Category> {
        use self::Marker::*;
        Some(match self {
            Reserved(_) => return None,
            Nil => Category::Nil,
            False | True => Category::Bool,
            PosFixInt(_) | UInt8 | UInt16 | UInt32 | UInt64 | UInt128 | UInt256 => {
                Category::Unsigned
            }
            NegFixInt(_) | Int8 | Int16 | Int32 | Int64 | Int256 => Category::Signed,
            Bin8 | Bin16 => Category::Bytes,
            FixStr(_) | Str8 | Str16 => Category::Text,
            FixArray(_) | Array8 | Array16 => Category::Array,
            FixMap(_) | Map8 | Map16 => Category::Map,
            Address => Category::Address,
            Hash32 => Category::Hash32,
        })
    }
}

impl From<u8> for Marker {
    fn from(val: u8) -> Marker {
        Marker::from_u8(val)
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

const fn build_category_table() -> [Option<Category>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = Marker::from_u8(i as u8).category();
        i += 1;
    }
    table
}

static CATEGORY_TABLE: [Option<Category>; 256] = build_category_table();

/// Classify a tag byte. Reserved bytes fail with [`Error::UnknownTag`], reported at `offset`.
#[inline]
pub fn classify(tag: u8, offset: usize) -> Result<Category> {
    CATEGORY_TABLE[tag as usize].ok_or(Error::UnknownTag { offset, tag })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn marker_byte_roundtrip() {
        for n in 0..=255u8 {
            assert_eq!(Marker::from_u8(n).into_u8(), n, "byte 0x{:02x}", n);
        }
    }

    #[test]
    fn reserved_bytes() {
        let reserved = [0xc1, 0xc6, 0xc9, 0xca, 0xcb, 0xdb, 0xdd, 0xdf];
        for n in 0..=255u8 {
            let result = classify(n, 7);
            if reserved.contains(&n) {
                match result {
                    Err(Error::UnknownTag { offset, tag }) => {
                        assert_eq!(offset, 7);
                        assert_eq!(tag, n);
                    }
                    other => panic!("0x{:02x} should be reserved, got {:?}", n, other),
                }
            } else {
                assert!(result.is_ok(), "0x{:02x} should classify", n);
            }
        }
    }

    #[test]
    fn table_matches_markers() {
        assert_eq!(classify(0x00, 0).unwrap(), Category::Unsigned);
        assert_eq!(classify(0x7f, 0).unwrap(), Category::Unsigned);
        assert_eq!(classify(0x80, 0).unwrap(), Category::Map);
        assert_eq!(classify(0x9f, 0).unwrap(), Category::Array);
        assert_eq!(classify(0xbf, 0).unwrap(), Category::Text);
        assert_eq!(classify(0xc0, 0).unwrap(), Category::Nil);
        assert_eq!(classify(0xc3, 0).unwrap(), Category::Bool);
        assert_eq!(classify(0xc5, 0).unwrap(), Category::Bytes);
        assert_eq!(classify(0xd3, 0).unwrap(), Category::Signed);
        assert_eq!(classify(0xd5, 0).unwrap(), Category::Unsigned);
        assert_eq!(classify(0xd6, 0).unwrap(), Category::Signed);
        assert_eq!(classify(0xd7, 0).unwrap(), Category::Address);
        assert_eq!(classify(0xd8, 0).unwrap(), Category::Hash32);
        assert_eq!(classify(0xe0, 0).unwrap(), Category::Signed);
        assert_eq!(classify(0xff, 0).unwrap(), Category::Signed);
    }
}
