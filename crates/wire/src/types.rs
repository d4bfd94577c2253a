//! The closed set of wire types and the values they carry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A member of the fixed wire type catalogue.
///
/// Struct variants name a struct definition from the schema; the struct itself
/// travels as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WireType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    /// Pointer-sized unsigned integer of the debuggee (always 64-bit on the wire).
    Pointer,
    Float32,
    Float64,
    Utf8String,
    /// UTF-16 on the engine side, transcoded to UTF-8 for transport.
    WideString,
    ByteBuffer,
    StringArray,
    StructByValue(String),
    StructByPointer(String),
    Void,
}

/// Payload-free discriminant of [`WireType`], used as an ontology table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Pointer,
    Float32,
    Float64,
    Utf8String,
    WideString,
    ByteBuffer,
    StringArray,
    StructByValue,
    StructByPointer,
    Void,
}

impl WireKind {
    /// Every kind, in declaration order.
    pub const ALL: [WireKind; 19] = [
        WireKind::Bool,
        WireKind::Int8,
        WireKind::Int16,
        WireKind::Int32,
        WireKind::Int64,
        WireKind::UInt8,
        WireKind::UInt16,
        WireKind::UInt32,
        WireKind::UInt64,
        WireKind::Pointer,
        WireKind::Float32,
        WireKind::Float64,
        WireKind::Utf8String,
        WireKind::WideString,
        WireKind::ByteBuffer,
        WireKind::StringArray,
        WireKind::StructByValue,
        WireKind::StructByPointer,
        WireKind::Void,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WireKind::Bool => "Bool",
            WireKind::Int8 => "Int8",
            WireKind::Int16 => "Int16",
            WireKind::Int32 => "Int32",
            WireKind::Int64 => "Int64",
            WireKind::UInt8 => "UInt8",
            WireKind::UInt16 => "UInt16",
            WireKind::UInt32 => "UInt32",
            WireKind::UInt64 => "UInt64",
            WireKind::Pointer => "Pointer",
            WireKind::Float32 => "Float32",
            WireKind::Float64 => "Float64",
            WireKind::Utf8String => "Utf8String",
            WireKind::WideString => "WideString",
            WireKind::ByteBuffer => "ByteBuffer",
            WireKind::StringArray => "StringArray",
            WireKind::StructByValue => "StructByValue",
            WireKind::StructByPointer => "StructByPointer",
            WireKind::Void => "Void",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WireType {
    pub fn kind(&self) -> WireKind {
        match self {
            WireType::Bool => WireKind::Bool,
            WireType::Int8 => WireKind::Int8,
            WireType::Int16 => WireKind::Int16,
            WireType::Int32 => WireKind::Int32,
            WireType::Int64 => WireKind::Int64,
            WireType::UInt8 => WireKind::UInt8,
            WireType::UInt16 => WireKind::UInt16,
            WireType::UInt32 => WireKind::UInt32,
            WireType::UInt64 => WireKind::UInt64,
            WireType::Pointer => WireKind::Pointer,
            WireType::Float32 => WireKind::Float32,
            WireType::Float64 => WireKind::Float64,
            WireType::Utf8String => WireKind::Utf8String,
            WireType::WideString => WireKind::WideString,
            WireType::ByteBuffer => WireKind::ByteBuffer,
            WireType::StringArray => WireKind::StringArray,
            WireType::StructByValue(_) => WireKind::StructByValue,
            WireType::StructByPointer(_) => WireKind::StructByPointer,
            WireType::Void => WireKind::Void,
        }
    }

    /// Name of the referenced struct definition, for struct variants.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            WireType::StructByValue(name) | WireType::StructByPointer(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        self.struct_name().is_some()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, WireType::Void)
    }

    /// Whether the `0x` base-detection rule applies to bodies of this type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            WireType::Int8
                | WireType::Int16
                | WireType::Int32
                | WireType::Int64
                | WireType::UInt8
                | WireType::UInt16
                | WireType::UInt32
                | WireType::UInt64
                | WireType::Pointer
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::StructByValue(name) => write!(f, "StructByValue({name})"),
            WireType::StructByPointer(name) => write!(f, "StructByPointer({name})"),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

/// A decoded (or to-be-encoded) value tagged with its wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Pointer(u64),
    Float32(f32),
    Float64(f64),
    Utf8String(String),
    WideString(String),
    ByteBuffer(Vec<u8>),
    StringArray(Vec<String>),
    /// Struct payload; only ever produced for arguments, never by [`crate::decode`].
    Struct {
        name: String,
        value: serde_json::Value,
    },
    Void,
}

impl WireValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            WireValue::Bool(_) => WireType::Bool,
            WireValue::Int8(_) => WireType::Int8,
            WireValue::Int16(_) => WireType::Int16,
            WireValue::Int32(_) => WireType::Int32,
            WireValue::Int64(_) => WireType::Int64,
            WireValue::UInt8(_) => WireType::UInt8,
            WireValue::UInt16(_) => WireType::UInt16,
            WireValue::UInt32(_) => WireType::UInt32,
            WireValue::UInt64(_) => WireType::UInt64,
            WireValue::Pointer(_) => WireType::Pointer,
            WireValue::Float32(_) => WireType::Float32,
            WireValue::Float64(_) => WireType::Float64,
            WireValue::Utf8String(_) => WireType::Utf8String,
            WireValue::WideString(_) => WireType::WideString,
            WireValue::ByteBuffer(_) => WireType::ByteBuffer,
            WireValue::StringArray(_) => WireType::StringArray,
            WireValue::Struct { name, .. } => WireType::StructByValue(name.clone()),
            WireValue::Void => WireType::Void,
        }
    }
}

/// Human-facing rendering: pointers and buffers in hex, everything else natural.
impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Bool(v) => write!(f, "{v}"),
            WireValue::Int8(v) => write!(f, "{v}"),
            WireValue::Int16(v) => write!(f, "{v}"),
            WireValue::Int32(v) => write!(f, "{v}"),
            WireValue::Int64(v) => write!(f, "{v}"),
            WireValue::UInt8(v) => write!(f, "{v}"),
            WireValue::UInt16(v) => write!(f, "{v}"),
            WireValue::UInt32(v) => write!(f, "{v}"),
            WireValue::UInt64(v) => write!(f, "{v}"),
            WireValue::Pointer(v) => write!(f, "{v:#x}"),
            WireValue::Float32(v) => write!(f, "{v}"),
            WireValue::Float64(v) => write!(f, "{v}"),
            WireValue::Utf8String(v) | WireValue::WideString(v) => f.write_str(v),
            WireValue::ByteBuffer(v) => f.write_str(&hex::encode(v)),
            WireValue::StringArray(v) => f.write_str(&v.join(" ")),
            WireValue::Struct { value, .. } => write!(f, "{value}"),
            WireValue::Void => Ok(()),
        }
    }
}
