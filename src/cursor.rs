//! Sequential decoding over an immutable byte sequence.

use byteorder::{BigEndian, ByteOrder};
use indexmap::IndexMap;
use ruint::aliases::U256;

use crate::depth_tracking::DepthTracker;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::fixed::{Address, Hash32, ADDRESS_LEN, HASH32_LEN};
use crate::integer::Integer;
use crate::marker::{classify, Category, Marker};
use crate::value::Value;
use crate::MAX_DEPTH;

/// A read-only position over encoded data.
///
/// Every read either consumes exactly one complete value (or container header) or fails and
/// leaves the position where it was. Non-minimal encodings are accepted as long as they decode
/// to a valid value.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Cursor<'a> {
        Self::with_max_depth(data, MAX_DEPTH)
    }

    /// Create a cursor that fails with [`Error::NestingTooDeep`] once containers are nested
    /// deeper than `max_depth`.
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Cursor<'a> {
        Self {
            data,
            pos: 0,
            max_depth,
        }
    }

    /// Current byte offset into the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to a previously recorded position. Only positions that sit on a value boundary
    /// make sense here; anything else will decode as garbage or fail.
    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEndOfInput {
                offset: self.pos,
                step: "set position",
                needed: pos,
                available: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.data.len()
    }

    pub fn peek_marker(&self) -> Result<Marker> {
        self.data
            .get(self.pos)
            .map(|n| Marker::from_u8(*n))
            .ok_or(Error::UnexpectedEndOfInput {
                offset: self.pos,
                step: "peek tag",
                needed: 1,
                available: 0,
            })
    }

    /// Classify the next value without consuming it.
    pub fn peek_category(&self) -> Result<Category> {
        let tag = *self.data.get(self.pos).ok_or(Error::UnexpectedEndOfInput {
            offset: self.pos,
            step: "peek tag",
            needed: 1,
            available: 0,
        })?;
        classify(tag, self.pos)
    }

    /// True if the next value is of category `c`. False at the end of input or on a reserved tag.
    pub fn is_category(&self, c: Category) -> bool {
        matches!(self.peek_category(), Ok(found) if found == c)
    }

    fn take(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(Error::UnexpectedEndOfInput {
                offset: self.pos,
                step,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_u8(&mut self, step: &'static str) -> Result<u8> {
        Ok(self.take(1, step)?[0])
    }

    fn take_u16(&mut self, step: &'static str) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2, step)?))
    }

    fn take_str(&mut self, len: usize, step: &'static str) -> Result<&'a str> {
        let offset = self.pos;
        let bytes = self.take(len, step)?;
        std::str::from_utf8(bytes).map_err(|e| Error::BadText {
            offset,
            reason: e.to_string(),
        })
    }

    // Decode the element at the current position. On failure the position is left wherever the
    // failure happened; `read_element` is responsible for rewinding.
    fn parse_element(&mut self) -> Result<Element<'a>> {
        let offset = self.pos;
        let marker = Marker::from_u8(self.take_u8("read tag")?);
        let elem = match marker {
            Marker::Reserved(tag) => return Err(Error::UnknownTag { offset, tag }),
            Marker::Nil => Element::Nil,
            Marker::False => Element::Bool(false),
            Marker::True => Element::Bool(true),
            Marker::PosFixInt(v) => Element::Unsigned(U256::from(v)),
            Marker::UInt8 => Element::Unsigned(U256::from(self.take_u8("decode UInt8")?)),
            Marker::UInt16 => Element::Unsigned(U256::from(self.take_u16("decode UInt16")?)),
            Marker::UInt32 => Element::Unsigned(U256::from(BigEndian::read_u32(
                self.take(4, "decode UInt32")?,
            ))),
            Marker::UInt64 => Element::Unsigned(U256::from(BigEndian::read_u64(
                self.take(8, "decode UInt64")?,
            ))),
            Marker::UInt128 => Element::Unsigned(U256::from(BigEndian::read_u128(
                self.take(16, "decode UInt128")?,
            ))),
            Marker::UInt256 => {
                let bytes = self.take(32, "decode UInt256")?;
                Element::Unsigned(Integer::from_be_unsigned(bytes).as_bits())
            }
            Marker::NegFixInt(v) => Element::Signed(v.into()),
            Marker::Int8 => Element::Signed((self.take_u8("decode Int8")? as i8).into()),
            Marker::Int16 => Element::Signed(BigEndian::read_i16(self.take(2, "decode Int16")?).into()),
            Marker::Int32 => Element::Signed(BigEndian::read_i32(self.take(4, "decode Int32")?).into()),
            Marker::Int64 => Element::Signed(BigEndian::read_i64(self.take(8, "decode Int64")?).into()),
            Marker::Int256 => Element::Signed(Integer::from_be_signed(
                self.take(32, "decode Int256")?,
            )),
            Marker::Bin8 => {
                let len = self.take_u8("decode Bin8 length")? as usize;
                Element::Bin(self.take(len, "get Bin8 content")?)
            }
            Marker::Bin16 => {
                let len = self.take_u16("decode Bin16 length")? as usize;
                Element::Bin(self.take(len, "get Bin16 content")?)
            }
            Marker::FixStr(len) => Element::Str(self.take_str(len as usize, "get FixStr content")?),
            Marker::Str8 => {
                let len = self.take_u8("decode Str8 length")? as usize;
                Element::Str(self.take_str(len, "get Str8 content")?)
            }
            Marker::Str16 => {
                let len = self.take_u16("decode Str16 length")? as usize;
                Element::Str(self.take_str(len, "get Str16 content")?)
            }
            Marker::FixArray(len) => Element::Array(len as usize),
            Marker::Array8 => Element::Array(self.take_u8("decode Array8 count")? as usize),
            Marker::Array16 => Element::Array(self.take_u16("decode Array16 count")? as usize),
            Marker::FixMap(len) => Element::Map(len as usize),
            Marker::Map8 => Element::Map(self.take_u8("decode Map8 count")? as usize),
            Marker::Map16 => Element::Map(self.take_u16("decode Map16 count")? as usize),
            Marker::Address => {
                let bytes = self.take(ADDRESS_LEN, "get Address content")?;
                Element::Address(Address::from_slice(bytes)?)
            }
            Marker::Hash32 => {
                let bytes = self.take(HASH32_LEN, "get Hash32 content")?;
                Element::Hash32(Hash32::from_slice(bytes)?)
            }
        };
        Ok(elem)
    }

    /// Read the next single element. Containers yield only their header; their contents follow
    /// as further elements.
    pub fn read_element(&mut self) -> Result<Element<'a>> {
        let start = self.pos;
        let result = self.parse_element();
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Check the next tag is of the expected category, without consuming it.
    fn expect(&self, expected: Category) -> Result<()> {
        let actual = self.peek_category()?;
        if actual != expected {
            return Err(Error::TypeMismatch {
                offset: self.pos,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn read_expected(&mut self, expected: Category) -> Result<Element<'a>> {
        self.expect(expected)?;
        self.read_element()
    }

    pub fn read_nil(&mut self) -> Result<()> {
        self.read_expected(Category::Nil).map(|_| ())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_expected(Category::Bool)? {
            Element::Bool(v) => Ok(v),
            _ => unreachable!("category check guarantees a Bool element"),
        }
    }

    /// Read an unsigned value of any width tier.
    pub fn read_unsigned(&mut self) -> Result<U256> {
        match self.read_expected(Category::Unsigned)? {
            Element::Unsigned(v) => Ok(v),
            _ => unreachable!("category check guarantees an Unsigned element"),
        }
    }

    /// Read a value written with a signed tag. Values written with unsigned tags are a
    /// [`Error::TypeMismatch`], even if they would fit.
    pub fn read_signed(&mut self) -> Result<Integer> {
        match self.read_expected(Category::Signed)? {
            Element::Signed(v) => Ok(v),
            _ => unreachable!("category check guarantees a Signed element"),
        }
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        match self.read_expected(Category::Bytes)? {
            Element::Bin(v) => Ok(v),
            _ => unreachable!("category check guarantees a Bin element"),
        }
    }

    pub fn read_text(&mut self) -> Result<&'a str> {
        match self.read_expected(Category::Text)? {
            Element::Str(v) => Ok(v),
            _ => unreachable!("category check guarantees a Str element"),
        }
    }

    pub fn read_address(&mut self) -> Result<Address> {
        match self.read_expected(Category::Address)? {
            Element::Address(v) => Ok(v),
            _ => unreachable!("category check guarantees an Address element"),
        }
    }

    pub fn read_hash32(&mut self) -> Result<Hash32> {
        match self.read_expected(Category::Hash32)? {
            Element::Hash32(v) => Ok(v),
            _ => unreachable!("category check guarantees a Hash32 element"),
        }
    }

    /// Read an array header, returning the declared element count.
    pub fn read_array_count(&mut self) -> Result<usize> {
        match self.read_expected(Category::Array)? {
            Element::Array(len) => Ok(len),
            _ => unreachable!("category check guarantees an Array element"),
        }
    }

    /// Read a map header, returning the declared pair count.
    pub fn read_map_count(&mut self) -> Result<usize> {
        match self.read_expected(Category::Map)? {
            Element::Map(len) => Ok(len),
            _ => unreachable!("category check guarantees a Map element"),
        }
    }

    /// Decode the next value, whatever it is, including everything nested inside it.
    pub fn read_generic(&mut self) -> Result<Value> {
        let start = self.pos;
        let result = self.read_value(0);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Like [`read_generic`](Self::read_generic), but also report the top-level category.
    pub fn read_with_category(&mut self) -> Result<(Category, Value)> {
        let category = self.peek_category()?;
        Ok((category, self.read_generic()?))
    }

    fn read_value(&mut self, depth: usize) -> Result<Value> {
        let offset = self.pos;
        let elem = self.read_element()?;
        Ok(match elem {
            Element::Nil => Value::Nil,
            Element::Bool(v) => Value::Bool(v),
            Element::Unsigned(v) => Value::Int(v.into()),
            Element::Signed(v) => Value::Int(v),
            Element::Bin(v) => Value::Bin(v.to_vec()),
            Element::Str(v) => Value::Str(v.to_string()),
            Element::Address(v) => Value::Address(v),
            Element::Hash32(v) => Value::Hash32(v),
            Element::Array(len) => {
                self.check_depth(depth, offset)?;
                // Every element takes at least one byte, so don't trust the declared count for
                // the allocation.
                let mut v = Vec::with_capacity(len.min(self.remaining().len()));
                for _ in 0..len {
                    v.push(self.read_value(depth + 1)?);
                }
                Value::Array(v)
            }
            Element::Map(len) => {
                self.check_depth(depth, offset)?;
                let mut map = IndexMap::with_capacity(len.min(self.remaining().len() / 2));
                for _ in 0..len {
                    let key = self.read_text()?.to_string();
                    let val = self.read_value(depth + 1)?;
                    map.insert(key, val);
                }
                Value::Map(map)
            }
        })
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<()> {
        if depth >= self.max_depth {
            Err(Error::NestingTooDeep {
                offset,
                max: self.max_depth,
            })
        } else {
            Ok(())
        }
    }

    /// Consume and discard the next value, along with everything nested inside it, without
    /// decoding it into a [`Value`]. Nesting is followed with an explicit stack, so this uses no
    /// recursion regardless of input depth.
    pub fn skip(&mut self) -> Result<()> {
        self.skip_within(self.max_depth)
    }

    /// Skip the next value, allowing at most `max_depth` levels of nesting inside it.
    pub(crate) fn skip_within(&mut self, max_depth: usize) -> Result<()> {
        let start = self.pos;
        let mut tracker = DepthTracker::new(max_depth);
        loop {
            let offset = self.pos;
            let step = self
                .read_element()
                .and_then(|elem| tracker.update_elem(&elem, offset));
            if let Err(e) = step {
                self.pos = start;
                return Err(e);
            }
            if tracker.is_complete() {
                return Ok(());
            }
        }
    }

    /// Iterate over the remaining top-level values. Iteration stops after the first error.
    pub fn values(self) -> Values<'a> {
        Values {
            cursor: self,
            errored: false,
        }
    }
}

/// Iterator over sequential top-level values. See [`Cursor::values`].
#[derive(Clone, Debug)]
pub struct Values<'a> {
    cursor: Cursor<'a>,
    errored: bool,
}

impl<'a> std::iter::Iterator for Values<'a> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored || !self.cursor.has_more() {
            return None;
        }
        let result = self.cursor.read_generic();
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}
