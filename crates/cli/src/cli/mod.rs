pub mod call;
pub mod check;
pub mod exec;
pub mod generate;
pub mod schema;

use std::path::Path;

use clap::Args;
use hdbg_client::Client;
use hdbg_schema::Schema;

use crate::config::{HdbgConfig, SERVER_ENV};

pub async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    match f().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Connection flags shared by commands that talk to the engine.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Engine base URL [env: HDBG_SERVER] [default: http://127.0.0.1:8888/]
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Per-call timeout in seconds [default: 15]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ServerArgs {
    pub fn client(&self, config: &HdbgConfig) -> Result<Client, String> {
        let env = std::env::var(SERVER_ENV).ok();
        let client_config =
            config.client_config(self.server.as_deref(), self.timeout, env.as_deref())?;
        Client::new(&client_config).map_err(|err| err.to_string())
    }
}

/// The schema at `path`, or the built-in catalogue.
pub fn load_schema(path: Option<&Path>) -> Result<Schema, String> {
    let Some(path) = path else {
        return Ok(Schema::hyperdbg());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read schema {}: {err}", path.display()))?;
    Schema::from_json(&json).map_err(|err| format!("Invalid schema {}: {err}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_schema_round_trips_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, Schema::hyperdbg().to_json().unwrap()).unwrap();
        assert_eq!(load_schema(Some(&path)).unwrap(), Schema::hyperdbg());
    }

    #[test]
    fn test_load_schema_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let json = r#"{"endpoints":[
            {"name":"A","params":[{"name":"x","type":"Void"}],"return_type":"Void"}
        ]}"#;
        std::fs::write(&path, json).unwrap();
        let err = load_schema(Some(&path)).unwrap_err();
        assert!(err.starts_with("Invalid schema"));
    }
}
