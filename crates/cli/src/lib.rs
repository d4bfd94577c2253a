#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;
pub mod config;

use config::HdbgConfig;

#[derive(Parser)]
#[command(
    name = "hdbg",
    version,
    about = "hdbg generates typed bindings for the HyperDbg HTTP export API and calls it"
)]
struct Cli {
    /// Configuration file (defaults to ./hdbg.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate client bindings for one or more languages
    Generate(cli::generate::GenerateArgs),
    /// Check that every schema type maps in every requested language
    Check(cli::check::CheckArgs),
    /// Export the endpoint schema as JSON
    Schema(cli::schema::SchemaArgs),
    /// Call one endpoint with textual arguments
    Call(cli::call::CallArgs),
    /// Run a raw debugger command on the engine
    Exec(cli::exec::ExecArgs),
}

/// Entry point used by the `hdbg` binary. Returns the process exit code.
pub fn run_cli(args: Vec<String>) -> i32 {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(run_cli_async(args))
}

async fn run_cli_async(args: Vec<String>) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = err.exit_code();
            let _ = err.print();
            return code;
        }
    };

    init_tracing();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return 2;
    };

    let config = match std::env::current_dir()
        .map_err(|err| format!("Failed to determine working directory: {err}"))
        .and_then(|dir| HdbgConfig::load(cli.config.as_deref(), &dir))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    match command {
        Commands::Generate(args) => cli::generate::run(args, &config).await,
        Commands::Check(args) => cli::check::run(args, &config).await,
        Commands::Schema(args) => cli::schema::run(args, &config).await,
        Commands::Call(args) => cli::call::run(args, &config).await,
        Commands::Exec(args) => cli::exec::run(args, &config).await,
    }
}

/// Workspace crates whose events a plain `HDBG_LOG` level applies to.
const LOG_TARGETS: [&str; 5] = [
    "hdbg_cli",
    "hdbg_client",
    "hdbg_codegen",
    "hdbg_schema",
    "hdbg_wire",
];

fn init_tracing() {
    // HDBG_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "hdbg_client=debug,reqwest=warn"
    let filter = match std::env::var("HDBG_LOG") {
        Ok(level) if is_plain_level(&level) => level_filter(&level),
        Ok(spec) => spec,
        Err(_) => level_filter("info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn level_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plain_level_applies_to_workspace_crates() {
        assert!(is_plain_level("DEBUG"));
        assert!(!is_plain_level("hdbg_client=debug"));
        let filter = level_filter("debug");
        assert!(filter.starts_with("hdbg_cli=debug,"));
        assert_eq!(filter.matches("=debug").count(), LOG_TARGETS.len());
    }

    #[test]
    fn test_parses_repeated_languages() {
        let cli = Cli::try_parse_from([
            "hdbg", "generate", "--lang", "go", "--lang", "ts", "--out", "bindings",
        ])
        .unwrap();
        let Some(Commands::Generate(args)) = cli.command else {
            unreachable!("generate subcommand")
        };
        assert_eq!(
            args.languages,
            [hdbg_wire::Language::Go, hdbg_wire::Language::TypeScript]
        );
    }

    #[test]
    fn test_call_takes_trailing_pairs() {
        let cli = Cli::try_parse_from([
            "hdbg",
            "call",
            "SetBreakPoint",
            "address=0x7ff6a1b20000",
            "pid=4096",
            "--server",
            "http://10.0.0.2:8888",
        ])
        .unwrap();
        let Some(Commands::Call(args)) = cli.command else {
            unreachable!("call subcommand")
        };
        assert_eq!(args.endpoint, "SetBreakPoint");
        assert_eq!(args.args, ["address=0x7ff6a1b20000", "pid=4096"]);
        assert_eq!(args.server.server.as_deref(), Some("http://10.0.0.2:8888"));
    }
}
