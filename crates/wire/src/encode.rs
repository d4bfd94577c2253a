//! Argument encoding: typed value -> one UTF-8 query-string value.

use serde::Serialize;

use crate::types::WireValue;

/// Encode a value for the query string. Returns `None` for `Void`, which is
/// omitted from the parameter list entirely.
pub fn encode(value: &WireValue) -> Option<String> {
    let encoded = match value {
        WireValue::Bool(v) => v.to_wire(),
        WireValue::Int8(v) => v.to_wire(),
        WireValue::Int16(v) => v.to_wire(),
        WireValue::Int32(v) => v.to_wire(),
        WireValue::Int64(v) => v.to_wire(),
        WireValue::UInt8(v) => v.to_wire(),
        WireValue::UInt16(v) => v.to_wire(),
        WireValue::UInt32(v) => v.to_wire(),
        WireValue::UInt64(v) | WireValue::Pointer(v) => v.to_wire(),
        WireValue::Float32(v) => v.to_wire(),
        WireValue::Float64(v) => v.to_wire(),
        WireValue::Utf8String(v) | WireValue::WideString(v) => v.clone(),
        WireValue::ByteBuffer(v) => v.to_wire(),
        WireValue::StringArray(v) => v.to_wire(),
        WireValue::Struct { value, .. } => value.to_string(),
        WireValue::Void => return None,
    };
    Some(encoded)
}

/// Serialize a struct argument as a compact JSON object.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Conversion of a Rust argument into its encoded query value.
///
/// Integers are always written in base 10, regardless of how the caller
/// spelled the literal.
pub trait ToWire {
    fn to_wire(&self) -> String;
}

macro_rules! to_wire_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToWire for $ty {
                fn to_wire(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

to_wire_display!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ToWire for str {
    fn to_wire(&self) -> String {
        self.to_owned()
    }
}

impl ToWire for String {
    fn to_wire(&self) -> String {
        self.clone()
    }
}

impl ToWire for [u8] {
    fn to_wire(&self) -> String {
        hex::encode(self)
    }
}

impl ToWire for Vec<u8> {
    fn to_wire(&self) -> String {
        self.as_slice().to_wire()
    }
}

impl ToWire for [String] {
    fn to_wire(&self) -> String {
        self.join(" ")
    }
}

impl ToWire for Vec<String> {
    fn to_wire(&self) -> String {
        self.as_slice().to_wire()
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> String {
        (**self).to_wire()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::decode::FromWire;
    use std::fmt::Debug;

    /// Only types that can also be decoded get a `ToWire` impl.
    fn assert_echoes<T: ToWire + FromWire + PartialEq + Debug>(value: T) {
        assert_eq!(T::from_wire(&value.to_wire()).unwrap(), value);
    }

    #[test]
    fn test_every_scalar_encoding_decodes_back() {
        assert_echoes(true);
        assert_echoes(i8::MIN);
        assert_echoes(i16::MIN);
        assert_echoes(i32::MIN);
        assert_echoes(i64::MIN);
        assert_echoes(u8::MAX);
        assert_echoes(u16::MAX);
        assert_echoes(u32::MAX);
        assert_echoes(u64::MAX);
        assert_echoes(2.5_f32);
        assert_echoes(0.1_f64);
        assert_echoes("lm km".to_string());
        assert_echoes(vec![0xde_u8, 0xad]);
        assert_echoes(vec!["bp".to_string(), "nt!KiSystemCall64".to_string()]);
    }

    #[test]
    fn test_integers_are_decimal() {
        assert_eq!(0x7FF6_A240_0000_u64.to_wire(), "140699712380928");
        assert_eq!((-1_i32).to_wire(), "-1");
        assert_eq!(
            encode(&WireValue::Pointer(0xFFFF_F800_0000_0000)).as_deref(),
            Some("18446735277616529408")
        );
    }

    #[test]
    fn test_bool_and_bytes() {
        assert_eq!(true.to_wire(), "true");
        assert_eq!(false.to_wire(), "false");
        assert_eq!(vec![0x0f_u8, 0xa0, 0x00].to_wire(), "0fa000");
        assert_eq!(Vec::<u8>::new().to_wire(), "");
    }

    #[test]
    fn test_string_array_joined_with_space() {
        let tokens = vec!["bp".to_string(), "nt!ExAllocatePoolWithTag".to_string()];
        assert_eq!(tokens.to_wire(), "bp nt!ExAllocatePoolWithTag");
    }

    #[test]
    fn test_void_is_omitted() {
        assert_eq!(encode(&WireValue::Void), None);
    }

    #[test]
    fn test_struct_is_json() {
        let value = WireValue::Struct {
            name: "GUEST_EXTRA_REGISTERS".into(),
            value: serde_json::json!({ "CS": 16, "RIP": 4096 }),
        };
        assert_eq!(encode(&value).unwrap(), r#"{"CS":16,"RIP":4096}"#);
    }

    #[test]
    fn test_float_shortest_round_trip() {
        assert_eq!(0.1_f64.to_wire(), "0.1");
        assert_eq!(2.5_f32.to_wire(), "2.5");
    }
}
