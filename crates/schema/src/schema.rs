use std::collections::{HashMap, HashSet};

use hdbg_wire::WireType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoint::{Endpoint, StructDef};
use crate::error::SchemaError;

/// The ordered endpoint catalogue plus the struct definitions it references.
///
/// A `Schema` obtained from [`Schema::new`], [`Schema::from_json`] or any
/// serde deserializer has been validated; accessors hand out shared
/// references only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    endpoints: Vec<Endpoint>,
    #[serde(default)]
    structs: Vec<StructDef>,
}

/// Wire shape of a [`Schema`] before validation.
#[derive(Deserialize)]
struct RawSchema {
    endpoints: Vec<Endpoint>,
    #[serde(default)]
    structs: Vec<StructDef>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Self::new(raw.endpoints, raw.structs)
    }
}

impl Schema {
    pub fn new(endpoints: Vec<Endpoint>, structs: Vec<StructDef>) -> Result<Self, SchemaError> {
        let schema = Self { endpoints, structs };
        schema.validate()?;
        Ok(schema)
    }

    /// Used by the built-in catalogue, whose validity is covered by tests.
    pub(crate) fn from_parts(endpoints: Vec<Endpoint>, structs: Vec<StructDef>) -> Self {
        Self { endpoints, structs }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    /// Find an endpoint by its declared name or by its wire name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|ep| ep.name == name)
            .or_else(|| self.endpoints.iter().find(|ep| ep.wire_name() == name))
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Check every structural invariant, stopping at the first violation.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut struct_names = HashSet::new();
        for def in &self.structs {
            if !struct_names.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateStruct(def.name.clone()));
            }
            let mut fields = HashSet::new();
            for field in &def.fields {
                if !fields.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        structure: def.name.clone(),
                        field: field.name.clone(),
                    });
                }
                if field.ty.is_struct() || field.ty.is_void() {
                    return Err(SchemaError::InvalidField {
                        structure: def.name.clone(),
                        field: field.name.clone(),
                        ty: field.ty.clone(),
                    });
                }
            }
        }

        let mut names = HashSet::new();
        let mut routes: HashMap<&str, &str> = HashMap::new();
        for ep in &self.endpoints {
            if !names.insert(ep.name.as_str()) {
                return Err(SchemaError::DuplicateEndpoint(ep.name.clone()));
            }
            if let Some(first) = routes.insert(ep.wire_name(), ep.name.as_str()) {
                return Err(SchemaError::DuplicateWireName {
                    wire_name: ep.wire_name().to_string(),
                    first: first.to_string(),
                    second: ep.name.clone(),
                });
            }

            let mut params = HashSet::new();
            for param in &ep.params {
                if !params.insert(param.name.as_str()) {
                    return Err(SchemaError::DuplicateParam {
                        endpoint: ep.name.clone(),
                        param: param.name.clone(),
                    });
                }
                if param.ty.is_void() {
                    return Err(SchemaError::VoidParam {
                        endpoint: ep.name.clone(),
                        param: param.name.clone(),
                    });
                }
            }

            for name in ep.wire_types().filter_map(|ty| ty.struct_name()) {
                if !struct_names.contains(name) {
                    return Err(SchemaError::UnknownStruct {
                        endpoint: ep.name.clone(),
                        name: name.to_string(),
                    });
                }
            }
        }

        debug!(
            endpoints = self.endpoints.len(),
            structs = self.structs.len(),
            "Schema validated"
        );
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate. Unlike going through `Deserialize`, a structural
    /// violation keeps its [`SchemaError`] variant.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_json::from_str(json)?;
        Self::try_from(raw)
    }
}
