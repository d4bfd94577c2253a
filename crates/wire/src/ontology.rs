//! Per-language rendering of every wire type.
//!
//! A [`Mapping`] tells the binding emitter three things about one wire type in
//! one language: the type to write in a parameter list, the type to write as a
//! return type, and the expression that encodes a parameter value. The
//! optional decode tag is what the language's dispatch primitive receives to
//! select its decode rule; a missing tag means the type cannot be returned.
//!
//! Templates use two placeholders: `{v}` for the value expression and `{T}`
//! for the struct name of struct variants.

use std::collections::{BTreeMap, BTreeSet};

use crate::language::Language;
use crate::types::{WireKind, WireType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub param_type: &'static str,
    pub return_type: &'static str,
    pub encode: &'static str,
    pub decode: Option<&'static str>,
}

impl Mapping {
    pub fn render_param_type(&self, ty: &WireType) -> String {
        substitute_struct(self.param_type, ty)
    }

    pub fn render_return_type(&self, ty: &WireType) -> String {
        substitute_struct(self.return_type, ty)
    }

    /// The encode expression applied to `value_expr`.
    pub fn render_encode(&self, ty: &WireType, value_expr: &str) -> String {
        substitute_struct(self.encode, ty).replace("{v}", value_expr)
    }
}

fn substitute_struct(template: &str, ty: &WireType) -> String {
    match ty.struct_name() {
        Some(name) => template.replace("{T}", name),
        None => template.to_string(),
    }
}

/// Lookup table `(language, wire kind) -> mapping`.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    mappings: BTreeMap<(Language, WireKind), Mapping>,
}

impl Ontology {
    /// An empty ontology.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table covering every wire kind for every [`Language`].
    pub fn standard() -> Self {
        let mut ontology = Self::new();
        for (lang, table) in [
            (Language::Go, &GO),
            (Language::Python, &PYTHON),
            (Language::Rust, &RUST),
            (Language::TypeScript, &TYPESCRIPT),
            (Language::CSharp, &CSHARP),
        ] {
            for (kind, mapping) in table {
                ontology.insert(lang, *kind, *mapping);
            }
        }
        ontology
    }

    pub fn insert(&mut self, lang: Language, kind: WireKind, mapping: Mapping) {
        self.mappings.insert((lang, kind), mapping);
    }

    /// Remove one mapping.
    pub fn without(mut self, lang: Language, kind: WireKind) -> Self {
        self.mappings.remove(&(lang, kind));
        self
    }

    pub fn get(&self, lang: Language, kind: WireKind) -> Option<&Mapping> {
        self.mappings.get(&(lang, kind))
    }

    pub fn lookup(&self, lang: Language, ty: &WireType) -> Option<&Mapping> {
        self.get(lang, ty.kind())
    }

    /// Languages with at least one mapping.
    pub fn languages(&self) -> BTreeSet<Language> {
        self.mappings.keys().map(|(lang, _)| *lang).collect()
    }

    /// Kinds with no mapping for `lang`.
    pub fn missing(&self, lang: Language) -> Vec<WireKind> {
        WireKind::ALL
            .into_iter()
            .filter(|kind| self.get(lang, *kind).is_none())
            .collect()
    }
}

// =============================================================================
// Built-in tables
// =============================================================================

/// `Kind => (param type, return type, encode template, decode tag)`; a `None`
/// decode tag marks an argument-only type.
macro_rules! mapping_table {
    ($($kind:ident => ($param:expr, $ret:expr, $encode:expr, $decode:expr)),* $(,)?) => {
        [$((
            WireKind::$kind,
            Mapping {
                param_type: $param,
                return_type: $ret,
                encode: $encode,
                decode: $decode,
            },
        )),*]
    };
}

const GO_INT: &str = "strconv.FormatInt(int64({v}), 10)";
const GO_UINT: &str = "strconv.FormatUint(uint64({v}), 10)";

const GO: [(WireKind, Mapping); 19] = mapping_table! {
    Bool => ("bool", "bool", "strconv.FormatBool({v})", Some("bool")),
    Int8 => ("int8", "int8", GO_INT, Some("int8")),
    Int16 => ("int16", "int16", GO_INT, Some("int16")),
    Int32 => ("int32", "int32", GO_INT, Some("int32")),
    Int64 => ("int64", "int64", "strconv.FormatInt({v}, 10)", Some("int64")),
    UInt8 => ("uint8", "uint8", GO_UINT, Some("uint8")),
    UInt16 => ("uint16", "uint16", GO_UINT, Some("uint16")),
    UInt32 => ("uint32", "uint32", GO_UINT, Some("uint32")),
    UInt64 => ("uint64", "uint64", "strconv.FormatUint({v}, 10)", Some("uint64")),
    Pointer => ("uintptr", "uintptr", GO_UINT, Some("uintptr")),
    Float32 => (
        "float32",
        "float32",
        "strconv.FormatFloat(float64({v}), 'g', -1, 32)",
        Some("float32")
    ),
    Float64 => ("float64", "float64", "strconv.FormatFloat({v}, 'g', -1, 64)", Some("float64")),
    Utf8String => ("string", "string", "{v}", Some("string")),
    WideString => ("string", "string", "{v}", Some("string")),
    ByteBuffer => ("[]byte", "[]byte", "hex.EncodeToString({v})", Some("[]byte")),
    StringArray => ("[]string", "[]string", "strings.Join({v}, \" \")", Some("[]string")),
    // Marshalled ahead of the request so the error can be returned.
    StructByValue => ("{T}", "{T}", "jsonArg({v})", None),
    StructByPointer => ("*{T}", "*{T}", "jsonArg({v})", None),
    Void => ("", "", "", Some("void")),
};

const PYTHON: [(WireKind, Mapping); 19] = mapping_table! {
    Bool => ("bool", "bool", "_bool({v})", Some("bool")),
    Int8 => ("int", "int", "str({v})", Some("i8")),
    Int16 => ("int", "int", "str({v})", Some("i16")),
    Int32 => ("int", "int", "str({v})", Some("i32")),
    Int64 => ("int", "int", "str({v})", Some("i64")),
    UInt8 => ("int", "int", "str({v})", Some("u8")),
    UInt16 => ("int", "int", "str({v})", Some("u16")),
    UInt32 => ("int", "int", "str({v})", Some("u32")),
    UInt64 => ("int", "int", "str({v})", Some("u64")),
    Pointer => ("int", "int", "str({v})", Some("ptr")),
    Float32 => ("float", "float", "repr({v})", Some("f32")),
    Float64 => ("float", "float", "repr({v})", Some("f64")),
    Utf8String => ("str", "str", "{v}", Some("str")),
    WideString => ("str", "str", "{v}", Some("wstr")),
    ByteBuffer => ("bytes", "bytes", "{v}.hex()", Some("bytes")),
    StringArray => ("list[str]", "list[str]", "\" \".join({v})", Some("strs")),
    StructByValue => ("{T}", "{T}", "_json({v})", None),
    StructByPointer => ("{T}", "{T}", "_json({v})", None),
    Void => ("None", "None", "", Some("void")),
};

const RUST_ENCODE: &str = "{v}.to_wire()";

const RUST: [(WireKind, Mapping); 19] = mapping_table! {
    Bool => ("bool", "bool", RUST_ENCODE, Some("bool")),
    Int8 => ("i8", "i8", RUST_ENCODE, Some("i8")),
    Int16 => ("i16", "i16", RUST_ENCODE, Some("i16")),
    Int32 => ("i32", "i32", RUST_ENCODE, Some("i32")),
    Int64 => ("i64", "i64", RUST_ENCODE, Some("i64")),
    UInt8 => ("u8", "u8", RUST_ENCODE, Some("u8")),
    UInt16 => ("u16", "u16", RUST_ENCODE, Some("u16")),
    UInt32 => ("u32", "u32", RUST_ENCODE, Some("u32")),
    UInt64 => ("u64", "u64", RUST_ENCODE, Some("u64")),
    Pointer => ("u64", "u64", RUST_ENCODE, Some("u64")),
    Float32 => ("f32", "f32", RUST_ENCODE, Some("f32")),
    Float64 => ("f64", "f64", RUST_ENCODE, Some("f64")),
    Utf8String => ("&str", "String", RUST_ENCODE, Some("String")),
    WideString => ("&str", "String", RUST_ENCODE, Some("String")),
    ByteBuffer => ("&[u8]", "Vec<u8>", RUST_ENCODE, Some("Vec<u8>")),
    StringArray => ("&[String]", "Vec<String>", RUST_ENCODE, Some("Vec<String>")),
    StructByValue => ("&{T}", "{T}", "encode_json({v})?", None),
    StructByPointer => ("&{T}", "{T}", "encode_json({v})?", None),
    Void => ("()", "()", "", Some("()")),
};

const TYPESCRIPT: [(WireKind, Mapping); 19] = mapping_table! {
    Bool => ("boolean", "boolean", "String({v})", Some("bool")),
    Int8 => ("number", "number", "String({v})", Some("i8")),
    Int16 => ("number", "number", "String({v})", Some("i16")),
    Int32 => ("number", "number", "String({v})", Some("i32")),
    Int64 => ("bigint", "bigint", "{v}.toString()", Some("i64")),
    UInt8 => ("number", "number", "String({v})", Some("u8")),
    UInt16 => ("number", "number", "String({v})", Some("u16")),
    UInt32 => ("number", "number", "String({v})", Some("u32")),
    UInt64 => ("bigint", "bigint", "{v}.toString()", Some("u64")),
    Pointer => ("bigint", "bigint", "{v}.toString()", Some("ptr")),
    Float32 => ("number", "number", "String({v})", Some("f32")),
    Float64 => ("number", "number", "String({v})", Some("f64")),
    Utf8String => ("string", "string", "{v}", Some("str")),
    WideString => ("string", "string", "{v}", Some("wstr")),
    ByteBuffer => ("Uint8Array", "Uint8Array", "toHex({v})", Some("bytes")),
    StringArray => ("string[]", "string[]", "{v}.join(\" \")", Some("strs")),
    StructByValue => ("{T}", "{T}", "jsonArg({v})", None),
    StructByPointer => ("{T}", "{T}", "jsonArg({v})", None),
    Void => ("void", "void", "", Some("void")),
};

const CS_INVARIANT: &str = "{v}.ToString(CultureInfo.InvariantCulture)";
const CS_ROUND_TRIP: &str = "{v}.ToString(\"R\", CultureInfo.InvariantCulture)";
const CS_JSON: &str = "JsonSerializer.Serialize({v})";

const CSHARP: [(WireKind, Mapping); 19] = mapping_table! {
    Bool => ("bool", "bool", "({v} ? \"true\" : \"false\")", Some("Bool")),
    Int8 => ("sbyte", "sbyte", CS_INVARIANT, Some("Int8")),
    Int16 => ("short", "short", CS_INVARIANT, Some("Int16")),
    Int32 => ("int", "int", CS_INVARIANT, Some("Int32")),
    Int64 => ("long", "long", CS_INVARIANT, Some("Int64")),
    UInt8 => ("byte", "byte", CS_INVARIANT, Some("UInt8")),
    UInt16 => ("ushort", "ushort", CS_INVARIANT, Some("UInt16")),
    UInt32 => ("uint", "uint", CS_INVARIANT, Some("UInt32")),
    UInt64 => ("ulong", "ulong", CS_INVARIANT, Some("UInt64")),
    Pointer => ("ulong", "ulong", CS_INVARIANT, Some("Pointer")),
    Float32 => ("float", "float", CS_ROUND_TRIP, Some("Float32")),
    Float64 => ("double", "double", CS_ROUND_TRIP, Some("Float64")),
    Utf8String => ("string", "string", "{v}", Some("Utf8String")),
    WideString => ("string", "string", "{v}", Some("WideString")),
    ByteBuffer => (
        "byte[]",
        "byte[]",
        "Convert.ToHexString({v}).ToLowerInvariant()",
        Some("ByteBuffer")
    ),
    StringArray => ("string[]", "string[]", "string.Join(\" \", {v})", Some("StringArray")),
    StructByValue => ("{T}", "{T}", CS_JSON, None),
    StructByPointer => ("{T}", "{T}", CS_JSON, None),
    Void => ("void", "void", "", Some("Void")),
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_complete() {
        let ontology = Ontology::standard();
        assert_eq!(ontology.languages().len(), Language::ALL.len());
        for lang in Language::ALL {
            assert!(ontology.missing(lang).is_empty(), "{lang} has gaps");
        }
    }

    #[test]
    fn test_struct_kinds_have_no_decode_rule() {
        let ontology = Ontology::standard();
        for lang in Language::ALL {
            assert!(ontology.get(lang, WireKind::StructByValue).unwrap().decode.is_none());
            assert!(ontology.get(lang, WireKind::StructByPointer).unwrap().decode.is_none());
            assert!(ontology.get(lang, WireKind::UInt64).unwrap().decode.is_some());
        }
    }

    #[test]
    fn test_without_removes_exactly_one() {
        let ontology = Ontology::standard().without(Language::Python, WireKind::ByteBuffer);
        assert_eq!(ontology.missing(Language::Python), vec![WireKind::ByteBuffer]);
        assert!(ontology.missing(Language::Go).is_empty());
    }

    #[test]
    fn test_render_templates() {
        let ontology = Ontology::standard();
        let ty = WireType::StructByPointer("GUEST_REGS".into());
        let go = ontology.lookup(Language::Go, &ty).unwrap();
        assert_eq!(go.render_param_type(&ty), "*GUEST_REGS");
        assert_eq!(go.render_encode(&ty, "guest_registers"), "jsonArg(guest_registers)");

        let u64_go = ontology.lookup(Language::Go, &WireType::UInt64).unwrap();
        assert_eq!(
            u64_go.render_encode(&WireType::UInt64, "address"),
            "strconv.FormatUint(address, 10)"
        );
        let rust = ontology.lookup(Language::Rust, &WireType::Utf8String).unwrap();
        assert_eq!(rust.render_param_type(&WireType::Utf8String), "&str");
        assert_eq!(rust.render_return_type(&WireType::Utf8String), "String");
    }
}
