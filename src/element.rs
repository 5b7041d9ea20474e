use ruint::aliases::U256;

use crate::error::{Error, Result};
use crate::fixed::{Address, Hash32};
use crate::integer::Integer;
use crate::marker::{Category, Marker};
use crate::MAX_LEN;

/// A single encoded token. Scalars carry their value, containers carry only their declared count;
/// the values inside a container follow as separate elements.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    Nil,
    Bool(bool),
    /// Always written with an unsigned tag.
    Unsigned(U256),
    /// Always written with a signed tag, even when non-negative.
    Signed(Integer),
    Bin(&'a [u8]),
    Str(&'a str),
    Array(usize),
    Map(usize),
    Address(Address),
    Hash32(Hash32),
}

impl<'a> Element<'a> {
    pub fn category(&self) -> Category {
        use self::Element::*;
        match self {
            Nil => Category::Nil,
            Bool(_) => Category::Bool,
            Unsigned(_) => Category::Unsigned,
            Signed(_) => Category::Signed,
            Bin(_) => Category::Bytes,
            Str(_) => Category::Text,
            Array(_) => Category::Array,
            Map(_) => Category::Map,
            Address(_) => Category::Address,
            Hash32(_) => Category::Hash32,
        }
    }

    /// Upper bound on the encoded size of this element alone.
    pub fn max_encoded_len(&self) -> usize {
        use self::Element::*;
        match self {
            Nil | Bool(_) => 1,
            Unsigned(_) | Signed(_) => 33,
            Bin(v) => 3 + v.len(),
            Str(v) => 3 + v.len(),
            Array(_) | Map(_) => 3,
            Address(_) => 21,
            Hash32(_) => 33,
        }
    }
}

/// Append the low `width` bytes of a big-endian 256-bit value.
fn push_be(buf: &mut Vec<u8>, v: &U256, width: usize) {
    let be = v.to_be_bytes::<32>();
    buf.extend_from_slice(&be[32 - width..]);
}

fn out_of_range(what: &str, len: usize) -> Error {
    Error::ValueOutOfRange(format!(
        "{} of {} exceeds the maximum of {}",
        what, len, MAX_LEN
    ))
}

/// Write a length-prefixed header with an inline tier for lengths up to `fix_max`.
fn push_len(
    buf: &mut Vec<u8>,
    len: usize,
    fix: Option<(usize, fn(u8) -> Marker)>,
    tier8: Marker,
    tier16: Marker,
    what: &str,
) -> Result<()> {
    match fix {
        Some((fix_max, fix_marker)) if len <= fix_max => {
            buf.push(fix_marker(len as u8).into());
        }
        _ if len <= u8::MAX as usize => {
            buf.push(tier8.into());
            buf.push(len as u8);
        }
        _ if len <= MAX_LEN => {
            buf.push(tier16.into());
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => return Err(out_of_range(what, len)),
    }
    Ok(())
}

/// Serialize an element onto a byte vector, using the smallest tier that holds it. Doesn't check
/// if Array & Map structures make sense, just writes elements out.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: &Element) -> Result<()> {
    use self::Element::*;
    match elem {
        Nil => buf.push(Marker::Nil.into()),
        Bool(v) => buf.push(if *v { Marker::True } else { Marker::False }.into()),
        Unsigned(v) => {
            let bits = v.bit_len();
            if bits <= 7 {
                buf.push(Marker::PosFixInt(v.to_be_bytes::<32>()[31]).into());
            } else if bits <= 8 {
                buf.push(Marker::UInt8.into());
                push_be(buf, v, 1);
            } else if bits <= 16 {
                buf.push(Marker::UInt16.into());
                push_be(buf, v, 2);
            } else if bits <= 32 {
                buf.push(Marker::UInt32.into());
                push_be(buf, v, 4);
            } else if bits <= 64 {
                buf.push(Marker::UInt64.into());
                push_be(buf, v, 8);
            } else if bits <= 128 {
                buf.push(Marker::UInt128.into());
                push_be(buf, v, 16);
            } else {
                buf.push(Marker::UInt256.into());
                push_be(buf, v, 32);
            }
        }
        Signed(v) => {
            if let Some(v) = v.as_i64() {
                if (-32..0).contains(&v) {
                    buf.push(Marker::NegFixInt(v as i8).into());
                } else if v >= i8::MIN as i64 && v <= i8::MAX as i64 {
                    buf.push(Marker::Int8.into());
                    buf.push(v as i8 as u8);
                } else if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
                    buf.push(Marker::Int16.into());
                    buf.extend_from_slice(&(v as i16).to_be_bytes());
                } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
                    buf.push(Marker::Int32.into());
                    buf.extend_from_slice(&(v as i32).to_be_bytes());
                } else {
                    // No 64-bit signed tier on the write side
                    buf.push(Marker::Int256.into());
                    push_be(buf, &Integer::from(v).as_bits(), 32);
                }
            } else {
                let bits = v.as_twos_complement().ok_or_else(|| {
                    Error::ValueOutOfRange(format!(
                        "{} doesn't fit in a 256-bit signed integer",
                        v
                    ))
                })?;
                buf.push(Marker::Int256.into());
                push_be(buf, &bits, 32);
            }
        }
        Bin(v) => {
            push_len(buf, v.len(), None, Marker::Bin8, Marker::Bin16, "byte length")?;
            buf.extend_from_slice(v);
        }
        Str(v) => {
            push_len(
                buf,
                v.len(),
                Some((31, Marker::FixStr)),
                Marker::Str8,
                Marker::Str16,
                "text length",
            )?;
            buf.extend_from_slice(v.as_bytes());
        }
        Array(len) => push_len(
            buf,
            *len,
            Some((15, Marker::FixArray)),
            Marker::Array8,
            Marker::Array16,
            "array count",
        )?,
        Map(len) => push_len(
            buf,
            *len,
            Some((15, Marker::FixMap)),
            Marker::Map8,
            Marker::Map16,
            "map count",
        )?,
        Address(v) => {
            buf.push(Marker::Address.into());
            buf.extend_from_slice(v.as_bytes());
        }
        Hash32(v) => {
            buf.push(Marker::Hash32.into());
            buf.extend_from_slice(v.as_bytes());
        }
    }
    Ok(())
}
