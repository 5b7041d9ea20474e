//! Whole-value entry points: encode a [`Value`] to bytes or hex, and decode it back.

use crate::{
    cursor::Cursor,
    error::{Error, Result},
    marker::Category,
    value::Value,
    writer::Writer,
};

/// Encode a value into a fresh byte vector.
pub fn encode(v: &Value) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    w.write(v)?;
    Ok(w.finalize())
}

/// Encode a value and render the bytes as `0x`-prefixed lower-case hex.
pub fn encode_hex(v: &Value) -> Result<String> {
    let enc = encode(v)?;
    Ok(format!("0x{}", hex::encode(enc)))
}

/// Decode the first value in `buf`. Anything after it is ignored.
pub fn decode(buf: &[u8]) -> Result<Value> {
    Cursor::new(buf).read_generic()
}

/// Decode the first value from hex text. The `0x` prefix is optional, and digits may be in
/// either case.
pub fn decode_hex(s: &str) -> Result<Value> {
    decode(&hex_to_bytes(s)?)
}

/// Decode every top-level value in `buf`, in order.
pub fn decode_all(buf: &[u8]) -> Result<Vec<Value>> {
    Cursor::new(buf).values().collect()
}

/// Decode the first value in `buf`, along with the category of its leading tag.
pub fn decode_with_category(buf: &[u8]) -> Result<(Category, Value)> {
    Cursor::new(buf).read_with_category()
}

/// Parse hex text, with or without the `0x` prefix, into raw bytes.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(Error::from)
}
