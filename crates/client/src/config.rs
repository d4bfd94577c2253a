use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8888/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings shared by every call made through one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Engine listener; endpoint names are appended directly.
    pub base_url: String,
    /// Per-call limit covering connect, send and body read.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout,
        })
    }
}

/// Validate an `http(s)` base URL and make sure it ends in `/`.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|err| ClientError::Config(format!("invalid server URL {trimmed:?}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "unsupported scheme {:?} in server URL {trimmed:?}",
            parsed.scheme()
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ClientError::Config(format!(
            "server URL {trimmed:?} must not carry a query or fragment"
        )));
    }
    let mut base = trimmed.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}
