use hdbg_wire::WireType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate endpoint {0:?}")]
    DuplicateEndpoint(String),

    #[error("endpoints {first:?} and {second:?} both map to route /{wire_name}")]
    DuplicateWireName {
        wire_name: String,
        first: String,
        second: String,
    },

    #[error("endpoint {endpoint:?} declares parameter {param:?} more than once")]
    DuplicateParam { endpoint: String, param: String },

    #[error("endpoint {endpoint:?}: parameter {param:?} has type Void")]
    VoidParam { endpoint: String, param: String },

    #[error("endpoint {endpoint:?} references undefined struct {name:?}")]
    UnknownStruct { endpoint: String, name: String },

    #[error("duplicate struct definition {0:?}")]
    DuplicateStruct(String),

    #[error("struct {structure:?} declares field {field:?} more than once")]
    DuplicateField { structure: String, field: String },

    #[error("struct {structure:?}: field {field:?} has non-scalar type {ty}")]
    InvalidField {
        structure: String,
        field: String,
        ty: WireType,
    },

    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}
