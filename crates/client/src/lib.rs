//! Dispatch primitive for the HyperDbg HTTP export API.
//!
//! Every call is one `GET <base><endpoint>[?k=v&...]`. The response body
//! carries no type information; the declared return [`WireType`] of the call
//! alone decides how it is decoded (see [`hdbg_wire::decode`]).
//!
//! ```no_run
//! # async fn run() -> Result<(), hdbg_client::ClientError> {
//! use hdbg_client::{Client, ClientConfig};
//! use hdbg_wire::ToWire;
//!
//! let client = Client::new(&ClientConfig::default())?;
//! let base: u64 = client.request("DebuggerGetKernelBase", &[]).await?;
//! client
//!     .request::<()>(
//!         "SetBreakPoint",
//!         &[
//!             ("address", base.to_wire()),
//!             ("pid", 4_u32.to_wire()),
//!             ("tid", 0_u32.to_wire()),
//!             ("core_numer", 0_u32.to_wire()),
//!         ],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`WireType`]: hdbg_wire::WireType

mod client;
mod config;
mod error;

pub use client::{Client, EXEC_COMMAND_ENDPOINT, build_url};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::ClientError;

// Generated Rust bindings only depend on this crate.
pub use hdbg_wire::{FromWire, ToWire, encode_json};
