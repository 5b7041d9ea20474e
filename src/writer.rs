//! Appending encoder over a self-growing buffer.

use serde::Serialize;

use crate::element::{serialize_elem, Element};
use crate::error::{Error, Result};
use crate::fixed::{Address, Hash32};
use crate::integer::Integer;
use crate::marker::Marker;
use crate::value::Value;
use crate::MAX_DEPTH;

const INITIAL_CAPACITY: usize = 64;
/// Past this capacity the buffer grows by an eighth instead of by half.
const GROWTH_THRESHOLD: usize = 1 << 20;
const GROWTH_MARGIN: usize = 16;

/// Builds up an encoded byte sequence one value at a time.
///
/// Values are written in call order, each using the smallest tag tier that holds it. Containers
/// are started with [`begin_array`](Self::begin_array) or [`begin_map`](Self::begin_map), which
/// write only the declared count. The caller must follow up with exactly that many values (or
/// key/value pairs); nothing checks this.
///
/// A failed write leaves the buffer as it was before the call.
#[derive(Clone, Debug)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Current capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.buf.len().saturating_add(additional);
        let cap = self.buf.capacity();
        if needed <= cap {
            return;
        }
        let grown = if cap < GROWTH_THRESHOLD {
            cap + cap / 2 + GROWTH_MARGIN
        } else {
            cap + cap / 8
        };
        self.buf.reserve_exact(grown.max(needed) - self.buf.len());
    }

    fn push_elem(&mut self, elem: &Element) -> Result<()> {
        self.reserve(elem.max_encoded_len());
        serialize_elem(&mut self.buf, elem)
    }

    pub fn write_nil(&mut self) {
        self.reserve(1);
        self.buf.push(Marker::Nil.into());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.reserve(1);
        let marker = if v {
            Marker::True
        } else {
            Marker::False
        };
        self.buf.push(marker.into());
    }

    /// Write a non-negative integer with an unsigned tag. Negative values fail with
    /// [`Error::ValueOutOfRange`].
    pub fn write_unsigned(&mut self, v: impl Into<Integer>) -> Result<()> {
        let v = v.into();
        let v = v.as_u256().ok_or_else(|| {
            Error::ValueOutOfRange(format!("{} can't be written as an unsigned integer", v))
        })?;
        self.push_elem(&Element::Unsigned(v))
    }

    /// Write an integer with a signed tag, even if it is non-negative. Values of 2^255 and up
    /// fail with [`Error::ValueOutOfRange`].
    pub fn write_signed(&mut self, v: impl Into<Integer>) -> Result<()> {
        self.push_elem(&Element::Signed(v.into()))
    }

    /// Write an integer, picking an unsigned tag for non-negative values and a signed one
    /// otherwise.
    pub fn write_integer(&mut self, v: impl Into<Integer>) -> Result<()> {
        let v = v.into();
        match v.as_u256() {
            Some(n) => self.push_elem(&Element::Unsigned(n)),
            None => self.push_elem(&Element::Signed(v)),
        }
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.push_elem(&Element::Bin(v))
    }

    pub fn write_text(&mut self, v: &str) -> Result<()> {
        self.push_elem(&Element::Str(v))
    }

    /// Write a 20-byte address. Any other length fails with
    /// [`Error::InvalidFixedSizePayload`].
    pub fn write_address(&mut self, v: &[u8]) -> Result<()> {
        let v = Address::from_slice(v)?;
        self.push_elem(&Element::Address(v))
    }

    /// Write a 32-byte hash. Any other length fails with [`Error::InvalidFixedSizePayload`].
    pub fn write_hash32(&mut self, v: &[u8]) -> Result<()> {
        let v = Hash32::from_slice(v)?;
        self.push_elem(&Element::Hash32(v))
    }

    /// Start an array of `count` elements.
    pub fn begin_array(&mut self, count: usize) -> Result<()> {
        self.push_elem(&Element::Array(count))
    }

    /// Start a map of `pairs` key/value pairs. Keys must be written as text.
    pub fn begin_map(&mut self, pairs: usize) -> Result<()> {
        self.push_elem(&Element::Map(pairs))
    }

    /// Write a complete [`Value`], including everything nested inside it. Containers nested
    /// more than [`MAX_DEPTH`] deep are rejected, since no default [`Cursor`](crate::Cursor)
    /// would read them back.
    pub fn write(&mut self, v: &Value) -> Result<()> {
        let start = self.buf.len();
        let result = self.write_value(v, 0);
        if result.is_err() {
            self.buf.truncate(start);
        }
        result
    }

    fn write_value(&mut self, v: &Value, depth: usize) -> Result<()> {
        match v {
            Value::Nil => self.write_nil(),
            Value::Bool(v) => self.write_bool(*v),
            Value::Int(v) => self.write_integer(*v)?,
            Value::Bin(v) => self.write_bytes(v)?,
            Value::Str(v) => self.write_text(v)?,
            Value::Address(v) => self.push_elem(&Element::Address(*v))?,
            Value::Hash32(v) => self.push_elem(&Element::Hash32(*v))?,
            Value::Array(v) => {
                self.check_depth(depth)?;
                self.begin_array(v.len())?;
                for item in v {
                    self.write_value(item, depth + 1)?;
                }
            }
            Value::Map(v) => {
                self.check_depth(depth)?;
                self.begin_map(v.len())?;
                for (key, item) in v {
                    self.write_text(key)?;
                    self.write_value(item, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= MAX_DEPTH {
            Err(Error::NestingTooDeep {
                offset: self.buf.len(),
                max: MAX_DEPTH,
            })
        } else {
            Ok(())
        }
    }

    /// Write any serializable value. See [`to_vec`](crate::to_vec) for how Rust types map onto
    /// the format.
    pub fn write_serde<T: Serialize + ?Sized>(&mut self, v: &T) -> Result<()> {
        let enc = crate::ser::to_vec(v)?;
        self.reserve(enc.len());
        self.buf.extend_from_slice(&enc);
        Ok(())
    }

    /// Hand over exactly the bytes written so far.
    pub fn finalize(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn growth() {
        let mut w = Writer::new();
        assert_eq!(w.capacity(), INITIAL_CAPACITY);
        for _ in 0..INITIAL_CAPACITY {
            w.write_nil();
        }
        assert_eq!(w.capacity(), INITIAL_CAPACITY);
        w.write_nil();
        assert_eq!(
            w.capacity(),
            INITIAL_CAPACITY + INITIAL_CAPACITY / 2 + GROWTH_MARGIN
        );

        // A single large write jumps straight to what it needs
        let mut w = Writer::with_capacity(0);
        let big = vec![0u8; 1000];
        w.write_bytes(&big).unwrap();
        assert!(w.capacity() >= 1003);
        assert_eq!(w.len(), 1003);

        // Past the threshold, grow by an eighth
        let mut w = Writer::with_capacity(GROWTH_THRESHOLD);
        let chunk = vec![0u8; 0xffff];
        while w.len() + 0xffff + 3 <= GROWTH_THRESHOLD {
            w.write_bytes(&chunk).unwrap();
        }
        assert_eq!(w.capacity(), GROWTH_THRESHOLD);
        w.write_bytes(&chunk).unwrap();
        assert_eq!(w.capacity(), GROWTH_THRESHOLD + GROWTH_THRESHOLD / 8);
    }

    #[test]
    fn finalize_is_exact() {
        let mut w = Writer::new();
        w.write_unsigned(42u8).unwrap();
        w.write_text("hi").unwrap();
        assert_eq!(w.finalize(), vec![0x2a, 0xa2, b'h', b'i']);
        assert!(Writer::new().finalize().is_empty());
    }

    #[test]
    fn failed_writes_leave_buffer_alone() {
        let mut w = Writer::new();
        w.write_nil();
        assert!(matches!(
            w.write_unsigned(-1i8),
            Err(Error::ValueOutOfRange(_))
        ));
        assert!(matches!(
            w.write_signed(Integer::max_value()),
            Err(Error::ValueOutOfRange(_))
        ));
        assert_eq!(
            w.write_address(&[0u8; 19]),
            Err(Error::InvalidFixedSizePayload {
                kind: "Address",
                expected: 20,
                actual: 19
            })
        );
        assert!(w.write_hash32(&[0u8; 20]).is_err());
        assert!(w.write_bytes(&vec![0u8; crate::MAX_LEN + 1]).is_err());
        assert!(w.begin_map(crate::MAX_LEN + 1).is_err());

        let mut map = IndexMap::new();
        map.insert("ok".to_string(), Value::from(1u8));
        map.insert("bad".to_string(), Value::Str("x".repeat(crate::MAX_LEN + 1)));
        assert!(w.write(&Value::Map(map)).is_err());

        assert_eq!(w.finalize(), vec![0xc0]);
    }

    #[test]
    fn generic_map() {
        let mut map = IndexMap::new();
        map.insert("test".to_string(), Value::from(42u8));
        map.insert("test2".to_string(), Value::Array(Vec::new()));
        let mut w = Writer::new();
        w.write(&Value::Map(map)).unwrap();
        assert_eq!(
            w.finalize(),
            vec![
                0x82, 0xa4, 0x74, 0x65, 0x73, 0x74, 0x2a, 0xa5, 0x74, 0x65, 0x73, 0x74, 0x32,
                0x90
            ]
        );
    }

    #[test]
    fn generic_integers() {
        let mut w = Writer::new();
        w.write(&Value::from(5i32)).unwrap();
        w.write(&Value::from(-5i32)).unwrap();
        w.write(&Value::Int(Integer::max_value())).unwrap();
        let enc = w.finalize();
        assert_eq!(&enc[..2], &[0x05, 0xfb]);
        assert_eq!(enc[2], 0xd5);
        assert_eq!(enc.len(), 2 + 33);
    }

    #[test]
    fn insertion_order_kept() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), Value::Nil);
        map.insert("a".to_string(), Value::Nil);
        let mut w = Writer::new();
        w.write(&Value::Map(map)).unwrap();
        assert_eq!(w.finalize(), vec![0x82, 0xa1, b'z', 0xc0, 0xa1, b'a', 0xc0]);
    }

    #[test]
    fn depth_limit() {
        let mut v = Value::Nil;
        for _ in 0..MAX_DEPTH {
            v = Value::Array(vec![v]);
        }
        let mut w = Writer::new();
        w.write(&v).unwrap();
        assert_eq!(w.len(), MAX_DEPTH + 1);

        let v = Value::Array(vec![v]);
        let mut w = Writer::new();
        assert!(matches!(
            w.write(&v),
            Err(Error::NestingTooDeep { max: MAX_DEPTH, .. })
        ));
        assert!(w.is_empty());
    }

    #[test]
    fn manual_containers() {
        let mut w = Writer::new();
        w.begin_array(4).unwrap();
        w.write_unsigned(42u8).unwrap();
        w.write_text("hello").unwrap();
        w.write_bool(true);
        w.write_nil();
        let expected = Value::Array(vec![
            Value::from(42u8),
            Value::from("hello"),
            Value::Bool(true),
            Value::Nil,
        ]);
        let mut w2 = Writer::new();
        w2.write(&expected).unwrap();
        assert_eq!(w.as_slice(), w2.as_slice());
    }
}
