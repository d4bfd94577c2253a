use thiserror::Error;

use crate::types::WireType;

/// A response body (or argument text) that does not match the grammar of the
/// expected wire type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode {raw:?} as {expected}: {reason}")]
pub struct DecodeError {
    /// The trimmed text that failed to decode.
    pub raw: String,
    pub expected: WireType,
    pub reason: DecodeReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeReason {
    #[error("invalid base-{radix} digits")]
    InvalidDigits { radix: u32 },
    #[error("value does not fit in {bits} bits")]
    OutOfRange { bits: u32 },
    #[error("unrecognized boolean literal")]
    BadBool,
    #[error("odd number of hex characters")]
    OddHexLength,
    #[error("invalid hex character")]
    BadHex,
    #[error("invalid floating point literal")]
    BadFloat,
    #[error("body is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid JSON: {0}")]
    BadJson(String),
}

/// A wire type with no rule for the attempted operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported wire type {0} for this operation")]
pub struct UnsupportedType(pub WireType);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedType),
}
