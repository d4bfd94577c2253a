use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::cli::run_cli_async;
use crate::config::HdbgConfig;

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Write to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub async fn run(args: SchemaArgs, config: &HdbgConfig) -> i32 {
    run_cli_async(|| async { run_inner(&args, config) }).await
}

fn run_inner(args: &SchemaArgs, config: &HdbgConfig) -> Result<(), String> {
    let schema = crate::cli::load_schema(config.generate.schema.as_deref())?;
    let json = schema.to_json().map_err(|err| err.to_string())?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
            info!(path = %path.display(), endpoints = schema.endpoints().len(), "Wrote schema.");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hdbg_schema::Schema;

    #[test]
    fn test_export_reloads_to_same_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_meta.json");
        run_inner(
            &SchemaArgs {
                out: Some(path.clone()),
            },
            &HdbgConfig::default(),
        )
        .unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"HyperDbgReadMemory\""));
        assert_eq!(Schema::from_json(&json).unwrap(), Schema::hyperdbg());
    }
}
