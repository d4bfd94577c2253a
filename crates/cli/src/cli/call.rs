use clap::Args;
use hdbg_schema::{Endpoint, register_id};
use hdbg_wire::WireValue;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::{ServerArgs, load_schema, run_cli_async};
use crate::config::HdbgConfig;

/// Parameters that accept a register name in place of its numeric id.
const REGISTER_PARAMS: [&str; 1] = ["register_id"];

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Endpoint name, with or without the HyperDbg prefix
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Arguments as name=value; integers accept 0x-prefixed hex
    #[arg(value_name = "NAME=VALUE")]
    pub args: Vec<String>,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Schema JSON to resolve the endpoint against
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

pub async fn run(args: CallArgs, config: &HdbgConfig) -> i32 {
    run_cli_async(|| async {
        let output = run_inner(&args, config).await?;
        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    })
    .await
}

async fn run_inner(args: &CallArgs, config: &HdbgConfig) -> Result<String, String> {
    let schema = load_schema(args.schema.as_deref().or(config.generate.schema.as_deref()))?;
    let endpoint = schema
        .endpoint(&args.endpoint)
        .ok_or_else(|| format!("Unknown endpoint {:?}; see `hdbg schema`", args.endpoint))?;
    let pairs = resolve_register_names(endpoint, parse_pairs(&args.args)?);
    let borrowed: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let client = args.server.client(config)?;
    let value = client
        .call_endpoint(endpoint, &borrowed)
        .await
        .map_err(|err| err.to_string())?;
    debug!(endpoint = endpoint.wire_name(), ty = %value.wire_type(), "Call returned.");
    Ok(match value {
        WireValue::Void => String::new(),
        other => other.to_string(),
    })
}

fn parse_pairs(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| format!("Argument {arg:?} is not of the form name=value"))
        })
        .collect()
}

fn resolve_register_names(
    endpoint: &Endpoint,
    pairs: Vec<(String, String)>,
) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .map(|(key, value)| {
            let is_register =
                REGISTER_PARAMS.contains(&key.as_str()) && endpoint.get_param(&key).is_some();
            match register_id(&value) {
                Some(id) if is_register => (key, id.to_string()),
                _ => (key, value),
            }
        })
        .collect()
}
