use std::fmt;

use serde::{de, ser};

use crate::marker::Category;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The input ran out before a complete value could be read.
    UnexpectedEndOfInput {
        offset: usize,
        step: &'static str,
        needed: usize,
        available: usize,
    },
    /// A tag byte that doesn't classify under the registry.
    UnknownTag { offset: usize, tag: u8 },
    /// A typed reader was called against a value of some other category.
    TypeMismatch {
        offset: usize,
        expected: Category,
        actual: Category,
    },
    /// The encoder was asked to write a magnitude, length, or count that doesn't fit the largest
    /// available tier.
    ValueOutOfRange(String),
    /// An address or hash payload wasn't exactly the fixed size.
    InvalidFixedSizePayload {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Containers were nested deeper than the configured limit.
    NestingTooDeep { offset: usize, max: usize },
    /// A text value didn't hold valid UTF-8.
    BadText { offset: usize, reason: String },
    /// Hex text couldn't be turned into bytes.
    BadHex(String),
    /// The value has a shape this format can't represent, like floating point.
    Unsupported(&'static str),
    /// Occurs when serde serialization or deserialization fails
    SerdeFail(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnexpectedEndOfInput {
                offset,
                step,
                needed,
                available,
            } => write!(
                f,
                "Unexpected end of input at offset {} on step [{}]: needed {} bytes, {} left",
                offset, step, needed, available
            ),
            Error::UnknownTag { offset, tag } => {
                write!(f, "Unknown tag 0x{:02x} at offset {}", tag, offset)
            }
            Error::TypeMismatch {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "Expected {} at offset {}, but found {}",
                expected, offset, actual
            ),
            Error::ValueOutOfRange(ref err) => write!(f, "Value out of range: {}", err),
            Error::InvalidFixedSizePayload {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "{} must be exactly {} bytes, got {}",
                kind, expected, actual
            ),
            Error::NestingTooDeep { offset, max } => write!(
                f,
                "Nesting deeper than {} levels at offset {}",
                max, offset
            ),
            Error::BadText { offset, ref reason } => {
                write!(f, "Invalid UTF-8 text at offset {}: {}", offset, reason)
            }
            Error::BadHex(ref err) => write!(f, "Invalid hex text: {}", err),
            Error::Unsupported(what) => write!(f, "Unsupported value: {}", what),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl std::convert::From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Self::BadHex(e.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
