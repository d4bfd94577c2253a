use hdbg_wire::WireType;
use serde::{Deserialize, Serialize};

/// Prefix carried by most engine exports and stripped from the wire name.
pub const WIRE_PREFIX: &str = "HyperDbg";

/// One named, typed parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Query-string key. Emitters may sanitize the identifier, never the key.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: WireType,
}

/// A remote operation: name, ordered parameters and return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(rename = "return_type")]
    pub returns: WireType,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, returns: WireType) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
        }
    }

    /// Append a parameter, keeping declaration order.
    pub fn param(mut self, name: impl Into<String>, ty: WireType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    /// The route the engine serves this endpoint under, which is also the
    /// name of the generated stub.
    ///
    /// ```
    /// # use hdbg_schema::Endpoint;
    /// # use hdbg_wire::WireType;
    /// let load = Endpoint::new("HyperDbgLoadVmmModule", WireType::Int32);
    /// assert_eq!(load.wire_name(), "LoadVmmModule");
    /// assert_eq!(Endpoint::new("SetBreakPoint", WireType::Void).wire_name(), "SetBreakPoint");
    /// ```
    pub fn wire_name(&self) -> &str {
        match self.name.strip_prefix(WIRE_PREFIX) {
            Some(rest) if !rest.is_empty() => rest,
            _ => &self.name,
        }
    }

    pub fn get_param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Every wire type this endpoint mentions, parameters first.
    pub fn wire_types(&self) -> impl Iterator<Item = &WireType> {
        self.params.iter().map(|p| &p.ty).chain(std::iter::once(&self.returns))
    }
}

/// A field of a struct definition. Fields are always scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: WireType,
}

/// An engine struct that travels as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: WireType) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty,
        });
        self
    }
}
