use std::time::Duration;

use hdbg_wire::{DecodeError, UnsupportedType, WireError};
use reqwest::StatusCode;
use thiserror::Error;

/// Outcome of a failed call. Nothing here is retried or defaulted.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("{endpoint} returned {status}: {body}")]
    Server {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedType),

    #[error("invalid arguments for {endpoint}: {reason}")]
    InvalidArgument { endpoint: String, reason: String },

    #[error("failed to encode struct argument: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Config(String),
}

impl From<WireError> for ClientError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Decode(err) => Self::Decode(err),
            WireError::Unsupported(err) => Self::Unsupported(err),
        }
    }
}
