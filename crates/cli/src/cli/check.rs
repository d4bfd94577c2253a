use clap::Args;
use hdbg_wire::{Language, Ontology};
use std::path::PathBuf;

use crate::cli::{load_schema, run_cli_async};
use crate::config::HdbgConfig;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Target language, repeatable; defaults to hdbg.toml or all languages
    #[arg(long = "lang", value_name = "LANG")]
    pub languages: Vec<Language>,

    /// Schema JSON to check instead of the built-in catalogue
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

pub async fn run(args: CheckArgs, config: &HdbgConfig) -> i32 {
    run_cli_async(|| async { run_inner(&args, config).map(|summary| println!("{summary}")) }).await
}

fn run_inner(args: &CheckArgs, config: &HdbgConfig) -> Result<String, String> {
    let schema = load_schema(args.schema.as_deref().or(config.generate.schema.as_deref()))?;
    let languages = config.languages(&args.languages);
    hdbg_codegen::check(&schema, &Ontology::standard(), &languages).map_err(|err| err.to_string())?;

    let names: Vec<&str> = languages.iter().map(|lang| lang.as_str()).collect();
    Ok(format!(
        "✅ {} endpoints and {} structs covered for {}",
        schema.endpoints().len(),
        schema.structs().len(),
        names.join(", ")
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schema_passes() {
        let args = CheckArgs {
            languages: vec![],
            schema: None,
        };
        let summary = run_inner(&args, &HdbgConfig::default()).unwrap();
        assert!(summary.contains("54 endpoints"));
        assert!(summary.ends_with("go, python, rust, typescript, csharp"));
    }

    #[test]
    fn test_struct_return_fails_with_every_failure_listed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{
                "endpoints": [
                    {"name": "ReadRegs", "return_type": {"StructByValue": "REGS"}},
                    {"name": "Pause", "return_type": "Void"}
                ],
                "structs": [{"name": "REGS", "fields": [{"name": "rax", "type": "UInt64"}]}]
            }"#,
        )
        .unwrap();
        let args = CheckArgs {
            languages: vec![Language::Go, Language::CSharp],
            schema: Some(path),
        };
        let err = run_inner(&args, &HdbgConfig::default()).unwrap_err();
        assert!(err.contains("2 failures"));
        assert!(err.contains(
            "[go] ReadRegs: return type StructByValue(REGS): unsupported return type"
        ));
        assert!(err.contains("[csharp] ReadRegs"));
    }
}
