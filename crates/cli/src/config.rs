//! `hdbg.toml` loading and settings resolution.
//!
//! ```toml
//! [client]
//! base_url = "http://192.168.1.20:8888/"
//! timeout_secs = 30
//!
//! [generate]
//! languages = ["go", "python"]
//! out_dir = "bindings"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use hdbg_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use hdbg_wire::Language;
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE: &str = "hdbg.toml";
pub const SERVER_ENV: &str = "HDBG_SERVER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HdbgConfig {
    pub client: ClientSection,
    pub generate: GenerateSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateSection {
    pub languages: Option<Vec<Language>>,
    pub out_dir: Option<PathBuf>,
    /// Schema JSON to generate from instead of the built-in catalogue.
    pub schema: Option<PathBuf>,
}

impl HdbgConfig {
    /// Load `explicit` if given (it must exist), otherwise `dir/hdbg.toml`
    /// when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
        let config = Self::parse(&contents)
            .map_err(|err| format!("Invalid config {}: {err}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration.");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Client settings. Precedence: flag, then `env` (the value of
    /// `HDBG_SERVER`), then the file, then defaults.
    pub fn client_config(
        &self,
        server_flag: Option<&str>,
        timeout_flag: Option<u64>,
        env: Option<&str>,
    ) -> Result<ClientConfig, String> {
        let base_url = server_flag
            .or(env)
            .or(self.client.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);
        let timeout_secs = timeout_flag
            .or(self.client.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err("Timeout must be at least one second".to_string());
        }
        ClientConfig::new(base_url, Duration::from_secs(timeout_secs))
            .map_err(|err| err.to_string())
    }

    /// Requested languages, falling back to the file and then to all.
    pub fn languages(&self, requested: &[Language]) -> Vec<Language> {
        if !requested.is_empty() {
            return requested.to_vec();
        }
        self.generate
            .languages
            .clone()
            .filter(|langs| !langs.is_empty())
            .unwrap_or_else(|| Language::ALL.to_vec())
    }
}
