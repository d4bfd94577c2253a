//! Wire type ontology for the HyperDbg HTTP export API.
//!
//! Every value that crosses the wire is described by a [`WireType`]. This crate
//! owns the only definition of how such a value is written into a query string
//! ([`encode`]) and how a UTF-8 response body is turned back into a typed value
//! ([`decode`]), plus the per-language [`Ontology`] table the binding emitter
//! consults when it renders stubs for other languages.
//!
//! The decode side is intentionally schema-less: the body carries no type tag,
//! so the declared return type of the call alone drives base detection
//! (`0x` prefix), boolean parsing and hex payload handling.

mod decode;
mod encode;
mod error;
mod language;
mod ontology;
mod types;

pub use decode::{FromWire, body_text, decode, parse_arg};
pub use encode::{ToWire, encode, encode_json};
pub use error::{DecodeError, DecodeReason, UnsupportedType, WireError};
pub use language::{Language, ParseLanguageError};
pub use ontology::{Mapping, Ontology};
pub use types::{WireKind, WireType, WireValue};
