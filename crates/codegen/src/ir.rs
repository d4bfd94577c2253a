//! Language-specific stub IR.
//!
//! Lowering resolves every name, type and encode expression for one target
//! language, so a backend only arranges strings.

use hdbg_wire::Language;

/// Everything one generated source file contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIR {
    pub language: Language,
    pub structs: Vec<StructIR>,
    /// Register names in id order.
    pub registers: Vec<String>,
    pub stubs: Vec<StubIR>,
}

impl ModuleIR {
    pub fn has_struct_params(&self) -> bool {
        self.stubs
            .iter()
            .flat_map(|stub| &stub.params)
            .any(|param| param.is_struct)
    }

    pub fn has_scalar_params(&self) -> bool {
        self.stubs
            .iter()
            .flat_map(|stub| &stub.params)
            .any(|param| !param.is_struct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructIR {
    pub name: String,
    pub fields: Vec<FieldIR>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIR {
    /// JSON key
    pub key: String,
    pub ident: String,
    pub ty: String,
    /// Byte arrays are carried as hex text inside struct JSON.
    pub hex: bool,
}

/// One generated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubIR {
    /// Identifier of the generated function or method
    pub name: String,
    /// Route on the engine (wire name)
    pub endpoint: String,
    /// Name as declared in the schema
    pub source_name: String,
    pub params: Vec<StubParam>,
    pub returns: StubReturn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubParam {
    /// Query-string key, always the schema parameter name
    pub key: String,
    pub ident: String,
    pub ty: String,
    /// Expression producing the encoded query value
    pub encode: String,
    pub is_struct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubReturn {
    /// `None` for Void
    pub ty: Option<String>,
    /// Tag handed to the dispatch primitive
    pub decode: String,
}
