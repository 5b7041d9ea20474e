//! chainpack is a compact, self-describing binary format built on a subset of msgpack, with a
//! few extensions for ledger-style data:
//!
//! - Integers up to 256 bits wide, signed or unsigned
//! - 20-byte addresses as a value type
//! - 32-byte hashes as a value type
//!
//! Everything else is plain msgpack: nil, booleans, byte strings, UTF-8 text, arrays, and maps
//! with text keys. There are no floating-point values, and no length or count may exceed
//! [`MAX_LEN`].
//!
//! Encoding always picks the shortest tag that can hold a value, so a given input always
//! produces the same bytes. Decoding accepts any tag that holds the value, so an integer written
//! by a less careful encoder still reads back.
//!
//! Containers carry their element count up front and have no terminator. A [`Writer`] writes
//! exactly what it is told to: if you begin an array of 2 and then write 3 values, the third is a
//! separate value following the array.
//!
//! # Getting started
//!
//! The quickest way in is through [`Value`] and the codec functions:
//!
//! ```
//! # use chainpack::*;
//! # use indexmap::IndexMap;
//! let mut map = IndexMap::new();
//! map.insert("test".to_string(), Value::from(42u8));
//! map.insert("test2".to_string(), Value::Array(vec![]));
//! let v = Value::Map(map);
//!
//! let enc = encode(&v).unwrap();
//! assert_eq!(encode_hex(&v).unwrap(), "0x82a4746573742aa5746573743290");
//! assert_eq!(decode(&enc).unwrap(), v);
//! ```
//!
//! Any type implementing serde's `Serialize` and `Deserialize` works too, through [`to_vec`] and
//! [`from_slice`]. [`Address`], [`Hash32`], and [`Integer`] all get their dedicated encodings
//! when used as struct fields:
//!
//! ```
//! # use chainpack::*;
//! # use serde::{Serialize, Deserialize};
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Transfer {
//!     to: Address,
//!     amount: Integer,
//! }
//!
//! let t = Transfer {
//!     to: Address::new([0x11; 20]),
//!     amount: Integer::max_value(),
//! };
//! let enc = to_vec(&t).unwrap();
//! let dec: Transfer = from_slice(&enc).unwrap();
//! assert_eq!(dec, t);
//! ```
//!
//! For schema-driven code, a [`Writer`] and a [`Cursor`] give direct control over every value.
//! A cursor can skip values it doesn't care about without decoding them:
//!
//! ```
//! # use chainpack::*;
//! let mut w = Writer::new();
//! w.begin_map(2).unwrap();
//! w.write_text("ignored").unwrap();
//! w.begin_array(2).unwrap();
//! w.write_hash32(&[0u8; 32]).unwrap();
//! w.write_signed(-5i8).unwrap();
//! w.write_text("wanted").unwrap();
//! w.write_unsigned(7u8).unwrap();
//! let enc = w.finalize();
//!
//! let mut cursor = Cursor::new(&enc);
//! assert_eq!(cursor.read_map_count().unwrap(), 2);
//! assert_eq!(cursor.read_text().unwrap(), "ignored");
//! cursor.skip().unwrap();
//! assert_eq!(cursor.read_text().unwrap(), "wanted");
//! assert_eq!(cursor.read_unsigned().unwrap(), U256::from(7u8));
//! assert!(!cursor.has_more());
//! ```

mod codec;
mod cursor;
mod de;
mod depth_tracking;
mod element;
mod error;
mod ext;
mod fixed;
mod integer;
mod marker;
mod ser;
mod value;
mod writer;

pub use self::codec::{
    decode, decode_all, decode_hex, decode_with_category, encode, encode_hex, hex_to_bytes,
};
pub use self::cursor::{Cursor, Values};
pub use self::de::from_slice;
pub use self::element::Element;
pub use self::error::{Error, Result};
pub use self::fixed::{Address, Hash32, ADDRESS_LEN, HASH32_LEN};
pub use self::integer::Integer;
pub use self::marker::{classify, Category, Marker};
pub use self::ser::to_vec;
pub use self::value::Value;
pub use self::writer::Writer;
pub use ruint::aliases::U256;

/// The default limit on container nesting. A value with more than this many arrays and maps
/// nested inside each other is rejected on both write and read.
pub const MAX_DEPTH: usize = 100;

/// The largest byte string, text string, array, or map that can be encoded. Lengths and counts
/// are at most 16 bits on the wire.
pub const MAX_LEN: usize = u16::MAX as usize;
