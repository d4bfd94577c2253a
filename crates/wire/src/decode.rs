//! Response decoding: UTF-8 body -> typed value, driven only by the declared
//! return type of the call that produced the body.

use std::num::IntErrorKind;

use crate::error::{DecodeError, DecodeReason, UnsupportedType, WireError};
use crate::types::{WireType, WireValue};

/// Decode a response body as `expected`.
///
/// The body is trimmed first. Integer types switch to base 16 when the
/// trimmed text starts with `0x` or `0X`. Struct types have no decode rule and
/// yield [`UnsupportedType`].
pub fn decode(expected: &WireType, body: &str) -> Result<WireValue, WireError> {
    let text = body.trim();
    let fail = |reason| DecodeError {
        raw: text.to_string(),
        expected: expected.clone(),
        reason,
    };

    let value = match expected {
        WireType::Bool => WireValue::Bool(parse_bool(text).map_err(fail)?),
        WireType::Int8 => WireValue::Int8(parse_signed(text, 8).map_err(fail)? as i8),
        WireType::Int16 => WireValue::Int16(parse_signed(text, 16).map_err(fail)? as i16),
        WireType::Int32 => WireValue::Int32(parse_signed(text, 32).map_err(fail)? as i32),
        WireType::Int64 => WireValue::Int64(parse_signed(text, 64).map_err(fail)?),
        WireType::UInt8 => WireValue::UInt8(parse_unsigned(text, 8).map_err(fail)? as u8),
        WireType::UInt16 => WireValue::UInt16(parse_unsigned(text, 16).map_err(fail)? as u16),
        WireType::UInt32 => WireValue::UInt32(parse_unsigned(text, 32).map_err(fail)? as u32),
        WireType::UInt64 => WireValue::UInt64(parse_unsigned(text, 64).map_err(fail)?),
        WireType::Pointer => WireValue::Pointer(parse_unsigned(text, 64).map_err(fail)?),
        WireType::Float32 => WireValue::Float32(
            text.parse()
                .map_err(|_| fail(DecodeReason::BadFloat))?,
        ),
        WireType::Float64 => WireValue::Float64(
            text.parse()
                .map_err(|_| fail(DecodeReason::BadFloat))?,
        ),
        WireType::Utf8String => WireValue::Utf8String(text.to_string()),
        WireType::WideString => WireValue::WideString(text.to_string()),
        WireType::ByteBuffer => WireValue::ByteBuffer(parse_hex(text).map_err(fail)?),
        WireType::StringArray => WireValue::StringArray(split_tokens(text)),
        WireType::StructByValue(_) | WireType::StructByPointer(_) => {
            return Err(UnsupportedType(expected.clone()).into());
        }
        WireType::Void => WireValue::Void,
    };
    Ok(value)
}

/// Borrow a raw response body as text for decoding as `expected`.
///
/// Bodies that are not valid UTF-8 are rejected rather than repaired. A `Void`
/// body is never inspected.
pub fn body_text<'a>(expected: &WireType, body: &'a [u8]) -> Result<&'a str, DecodeError> {
    if expected.is_void() {
        return Ok("");
    }
    std::str::from_utf8(body).map_err(|_| DecodeError {
        raw: String::from_utf8_lossy(body).trim().to_string(),
        expected: expected.clone(),
        reason: DecodeReason::InvalidUtf8,
    })
}

/// Parse a user-supplied argument (e.g. a CLI `key=value` pair) as `expected`.
///
/// Scalars follow the decode grammar, so `0x`-prefixed addresses are accepted.
/// Strings are taken verbatim and struct arguments are parsed as JSON.
pub fn parse_arg(expected: &WireType, text: &str) -> Result<WireValue, WireError> {
    match expected {
        WireType::Utf8String => Ok(WireValue::Utf8String(text.to_string())),
        WireType::WideString => Ok(WireValue::WideString(text.to_string())),
        WireType::StructByValue(name) | WireType::StructByPointer(name) => {
            let value = serde_json::from_str(text).map_err(|err| DecodeError {
                raw: text.to_string(),
                expected: expected.clone(),
                reason: DecodeReason::BadJson(err.to_string()),
            })?;
            Ok(WireValue::Struct {
                name: name.clone(),
                value,
            })
        }
        WireType::Void => Err(UnsupportedType(WireType::Void).into()),
        _ => decode(expected, text),
    }
}

/// A Rust type that a stub can name as its return type.
pub trait FromWire: Sized {
    /// The wire type this Rust type is decoded from.
    fn wire_type() -> WireType;

    fn from_wire(body: &str) -> Result<Self, DecodeError>;
}

fn typed_error(expected: WireType, body: &str, reason: DecodeReason) -> DecodeError {
    DecodeError {
        raw: body.trim().to_string(),
        expected,
        reason,
    }
}

macro_rules! from_wire_signed {
    ($($ty:ty => $wire:ident, $bits:expr);* $(;)?) => {
        $(
            impl FromWire for $ty {
                fn wire_type() -> WireType {
                    WireType::$wire
                }

                fn from_wire(body: &str) -> Result<Self, DecodeError> {
                    parse_signed(body.trim(), $bits)
                        .map(|v| v as $ty)
                        .map_err(|reason| typed_error(WireType::$wire, body, reason))
                }
            }
        )*
    };
}

macro_rules! from_wire_unsigned {
    ($($ty:ty => $wire:ident, $bits:expr);* $(;)?) => {
        $(
            impl FromWire for $ty {
                fn wire_type() -> WireType {
                    WireType::$wire
                }

                fn from_wire(body: &str) -> Result<Self, DecodeError> {
                    parse_unsigned(body.trim(), $bits)
                        .map(|v| v as $ty)
                        .map_err(|reason| typed_error(WireType::$wire, body, reason))
                }
            }
        )*
    };
}

from_wire_signed! {
    i8 => Int8, 8;
    i16 => Int16, 16;
    i32 => Int32, 32;
    i64 => Int64, 64;
}

from_wire_unsigned! {
    u8 => UInt8, 8;
    u16 => UInt16, 16;
    u32 => UInt32, 32;
    u64 => UInt64, 64;
}

impl FromWire for bool {
    fn wire_type() -> WireType {
        WireType::Bool
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        parse_bool(body.trim()).map_err(|reason| typed_error(WireType::Bool, body, reason))
    }
}

impl FromWire for f32 {
    fn wire_type() -> WireType {
        WireType::Float32
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        body.trim()
            .parse()
            .map_err(|_| typed_error(WireType::Float32, body, DecodeReason::BadFloat))
    }
}

impl FromWire for f64 {
    fn wire_type() -> WireType {
        WireType::Float64
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        body.trim()
            .parse()
            .map_err(|_| typed_error(WireType::Float64, body, DecodeReason::BadFloat))
    }
}

impl FromWire for String {
    fn wire_type() -> WireType {
        WireType::Utf8String
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        Ok(body.trim().to_string())
    }
}

impl FromWire for Vec<u8> {
    fn wire_type() -> WireType {
        WireType::ByteBuffer
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        parse_hex(body.trim()).map_err(|reason| typed_error(WireType::ByteBuffer, body, reason))
    }
}

impl FromWire for Vec<String> {
    fn wire_type() -> WireType {
        WireType::StringArray
    }

    fn from_wire(body: &str) -> Result<Self, DecodeError> {
        Ok(split_tokens(body.trim()))
    }
}

impl FromWire for () {
    fn wire_type() -> WireType {
        WireType::Void
    }

    fn from_wire(_body: &str) -> Result<Self, DecodeError> {
        Ok(())
    }
}

// =============================================================================
// Grammar
// =============================================================================

/// Split off a `0x`/`0X` prefix, returning the digits and the radix to use.
fn split_radix(text: &str) -> (&str, u32) {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .map_or((text, 10), |digits| (digits, 16))
}

fn int_reason(err: &std::num::ParseIntError, radix: u32, bits: u32) -> DecodeReason {
    match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => DecodeReason::OutOfRange { bits },
        _ => DecodeReason::InvalidDigits { radix },
    }
}

fn parse_unsigned(text: &str, bits: u32) -> Result<u64, DecodeReason> {
    let (digits, radix) = split_radix(text);
    if digits.starts_with(['+', '-']) {
        return Err(DecodeReason::InvalidDigits { radix });
    }
    let value = u64::from_str_radix(digits, radix).map_err(|err| int_reason(&err, radix, bits))?;
    if bits < 64 && value >> bits != 0 {
        return Err(DecodeReason::OutOfRange { bits });
    }
    Ok(value)
}

/// Decimal text is read as a signed number. Hex text is read as the raw bit
/// pattern of a `bits`-wide two's complement value, so `0xFFFFFFFF` is `-1`
/// for a 32-bit type.
fn parse_signed(text: &str, bits: u32) -> Result<i64, DecodeReason> {
    let (digits, radix) = split_radix(text);
    if radix == 16 {
        let raw = parse_unsigned(text, bits)?;
        let shift = 64 - bits;
        return Ok(((raw << shift) as i64) >> shift);
    }
    let value = digits
        .parse::<i64>()
        .map_err(|err| int_reason(&err, radix, bits))?;
    let shift = 64 - bits;
    if value < (i64::MIN >> shift) || value > (i64::MAX >> shift) {
        return Err(DecodeReason::OutOfRange { bits });
    }
    Ok(value)
}

fn parse_bool(text: &str) -> Result<bool, DecodeReason> {
    let (literal, _) = split_radix(text);
    if literal.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if literal.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(DecodeReason::BadBool)
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, DecodeReason> {
    let (digits, _) = split_radix(text);
    hex::decode(digits).map_err(|err| match err {
        hex::FromHexError::OddLength => DecodeReason::OddHexLength,
        _ => DecodeReason::BadHex,
    })
}

fn split_tokens(text: &str) -> Vec<String> {
    text.split_ascii_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::encode::ToWire;

    fn reason(ty: &WireType, body: &str) -> DecodeReason {
        match decode(ty, body) {
            Err(WireError::Decode(err)) => err.reason,
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_hex_prefix_either_case() {
        assert_eq!(decode(&WireType::UInt64, "0x1000").unwrap(), WireValue::UInt64(4096));
        assert_eq!(decode(&WireType::UInt64, "0X1000").unwrap(), WireValue::UInt64(4096));
        assert_eq!(u64::from_wire(" 0x1000\n").unwrap(), 4096);
        assert_eq!(
            decode(&WireType::Pointer, "0xfffff80000000000").unwrap(),
            WireValue::Pointer(0xFFFF_F800_0000_0000)
        );
    }

    #[test]
    fn test_decimal_default() {
        assert_eq!(decode(&WireType::UInt32, "4096").unwrap(), WireValue::UInt32(4096));
        assert_eq!(decode(&WireType::Int32, "-12").unwrap(), WireValue::Int32(-12));
        assert_eq!(i64::from_wire("1000").unwrap(), 1000);
    }

    #[test]
    fn test_integer_round_trip_at_range_edges() {
        fn check<T>(values: &[T])
        where
            T: ToWire + FromWire + PartialEq + std::fmt::Debug + Copy + std::fmt::LowerHex,
        {
            for &v in values {
                assert_eq!(T::from_wire(&v.to_wire()).unwrap(), v);
                assert_eq!(T::from_wire(&format!("{v:#x}")).unwrap(), v);
            }
        }
        check(&[u8::MIN, 1, 0x7f, u8::MAX]);
        check(&[u16::MIN, 0x1234, u16::MAX]);
        check(&[u32::MIN, 0xdead_beef, u32::MAX]);
        check(&[u64::MIN, 0x7FF6_A240_0000, u64::MAX]);
        check(&[i8::MIN, -1, 0, i8::MAX]);
        check(&[i16::MIN, -2, 0, i16::MAX]);
        check(&[i32::MIN, -1, 0, i32::MAX]);
        check(&[i64::MIN, -1, 0, i64::MAX]);
    }

    #[test]
    fn test_signed_hex_is_twos_complement() {
        assert_eq!(decode(&WireType::Int32, "0xFFFFFFFF").unwrap(), WireValue::Int32(-1));
        assert_eq!(decode(&WireType::Int8, "0x80").unwrap(), WireValue::Int8(i8::MIN));
        assert_eq!(
            reason(&WireType::Int8, "0x100"),
            DecodeReason::OutOfRange { bits: 8 }
        );
    }

    #[test]
    fn test_integer_rejections() {
        assert_eq!(
            reason(&WireType::UInt8, "256"),
            DecodeReason::OutOfRange { bits: 8 }
        );
        assert_eq!(
            reason(&WireType::UInt32, "-1"),
            DecodeReason::InvalidDigits { radix: 10 }
        );
        assert_eq!(
            reason(&WireType::UInt64, "0xZZ"),
            DecodeReason::InvalidDigits { radix: 16 }
        );
        assert_eq!(
            reason(&WireType::Int16, "40000"),
            DecodeReason::OutOfRange { bits: 16 }
        );
        assert!(decode(&WireType::UInt64, "").is_err());
    }

    #[test]
    fn test_bool_case_insensitive() {
        for body in ["true", "TRUE", "True", "  true\r\n"] {
            assert_eq!(decode(&WireType::Bool, body).unwrap(), WireValue::Bool(true));
        }
        assert_eq!(decode(&WireType::Bool, "  false  ").unwrap(), WireValue::Bool(false));
        for body in ["1", "yes", "", "truee"] {
            assert_eq!(reason(&WireType::Bool, body), DecodeReason::BadBool);
        }
    }

    #[test]
    fn test_byte_buffer_round_trip() {
        for bytes in [vec![], vec![0u8], vec![0xde, 0xad, 0xbe, 0xef], (0..=255).collect()] {
            let encoded = bytes.to_wire();
            assert_eq!(
                decode(&WireType::ByteBuffer, &encoded).unwrap(),
                WireValue::ByteBuffer(bytes.clone())
            );
        }
        assert_eq!(Vec::<u8>::from_wire("0xDEAD").unwrap(), vec![0xde, 0xad]);
    }

    #[test]
    fn test_byte_buffer_rejections() {
        assert_eq!(reason(&WireType::ByteBuffer, "abc"), DecodeReason::OddHexLength);
        assert_eq!(reason(&WireType::ByteBuffer, "zz"), DecodeReason::BadHex);
    }

    #[test]
    fn test_strings_are_verbatim() {
        assert_eq!(
            decode(&WireType::Utf8String, "  0x10 GenuineIntel \n").unwrap(),
            WireValue::Utf8String("0x10 GenuineIntel".into())
        );
        assert_eq!(
            decode(&WireType::StringArray, "a  b\tc").unwrap(),
            WireValue::StringArray(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_void_discards_body() {
        assert_eq!(decode(&WireType::Void, "anything").unwrap(), WireValue::Void);
    }

    #[test]
    fn test_struct_return_is_unsupported() {
        let ty = WireType::StructByPointer("GUEST_REGS".into());
        assert_eq!(
            decode(&ty, "{}").unwrap_err(),
            WireError::Unsupported(UnsupportedType(ty))
        );
    }

    #[test]
    fn test_body_text_rejects_invalid_utf8() {
        let err = body_text(&WireType::Utf8String, b"Genuine\xffIntel").unwrap_err();
        assert_eq!(err.reason, DecodeReason::InvalidUtf8);
        assert_eq!(err.raw, "Genuine\u{fffd}Intel");
        assert_eq!(body_text(&WireType::UInt64, b" 0x10 ").unwrap(), " 0x10 ");
        assert_eq!(body_text(&WireType::Void, b"\xff\xfe").unwrap(), "");
    }

    #[test]
    fn test_floats() {
        assert_eq!(decode(&WireType::Float64, "2.5").unwrap(), WireValue::Float64(2.5));
        assert_eq!(reason(&WireType::Float32, "0x10"), DecodeReason::BadFloat);
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            parse_arg(&WireType::UInt64, "0x7FF6A2400000").unwrap(),
            WireValue::UInt64(140_699_712_380_928)
        );
        assert_eq!(
            parse_arg(&WireType::Utf8String, " keep spaces ").unwrap(),
            WireValue::Utf8String(" keep spaces ".into())
        );
        let value = parse_arg(&WireType::StructByValue("OPTS".into()), r#"{"Address":1}"#).unwrap();
        assert!(matches!(value, WireValue::Struct { ref name, .. } if name == "OPTS"));
        assert!(parse_arg(&WireType::StructByValue("OPTS".into()), "{").is_err());
        assert!(parse_arg(&WireType::Void, "").is_err());
    }
}
