//! Declarative description of the HyperDbg HTTP export API.
//!
//! A [`Schema`] is an ordered list of [`Endpoint`] descriptors plus the struct
//! definitions their struct-typed parameters refer to. It is built once, either
//! from the built-in catalogue ([`Schema::hyperdbg`]) or from JSON, validated,
//! and then only read by the checker, the emitter and the dynamic client.

mod endpoint;
mod error;
mod hyperdbg;
mod registers;
mod schema;

pub use endpoint::{Endpoint, Field, Param, StructDef, WIRE_PREFIX};
pub use error::SchemaError;
pub use registers::{REGISTER_NAMES, register_id, register_name};
pub use schema::Schema;
