use clap::Args;
use hdbg_codegen::GeneratedFile;
use hdbg_wire::{Language, Ontology};
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::{load_schema, run_cli_async};
use crate::config::HdbgConfig;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Target language, repeatable (go, python, rust, typescript, csharp)
    #[arg(long = "lang", value_name = "LANG")]
    pub languages: Vec<Language>,

    /// Output root; one file per language is written below it
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Write nothing; print a diff and fail if any file is stale
    #[arg(long)]
    pub check: bool,

    /// Schema JSON to generate from instead of the built-in catalogue
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

pub async fn run(args: GenerateArgs, config: &HdbgConfig) -> i32 {
    run_cli_async(|| async { run_inner(&args, config) }).await
}

fn run_inner(args: &GenerateArgs, config: &HdbgConfig) -> Result<(), String> {
    let schema = load_schema(args.schema.as_deref().or(config.generate.schema.as_deref()))?;
    let languages = config.languages(&args.languages);
    let out_dir = args
        .out
        .clone()
        .or_else(|| config.generate.out_dir.clone())
        .ok_or("No output directory: pass --out or set [generate] out_dir in hdbg.toml")?;

    let files = hdbg_codegen::generate(&schema, &Ontology::standard(), &languages)
        .map_err(|err| err.to_string())?;

    if args.check {
        let stale = stale_files(&out_dir, &files)?;
        if stale.is_empty() {
            println!("✅ {} binding file(s) up to date", files.len());
            return Ok(());
        }
        for file in &stale {
            println!("  {file}");
        }
        for file in &stale {
            if let Staleness::Outdated { diff, .. } = &file.staleness {
                print!("\n{diff}");
            }
        }
        return Err(format!(
            "{} generated file(s) are stale; run `hdbg generate` to update them",
            stale.len()
        ));
    }

    let written = write_files(&out_dir, &files)?;
    println!(
        "✅ Generated {} language(s), {} file(s) changed in {}",
        files.len(),
        written.len(),
        out_dir.display()
    );
    Ok(())
}

/// Write every file that differs from what is on disk. Returns the paths
/// actually written.
pub fn write_files(out_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>, String> {
    let mut written = Vec::new();
    for file in files {
        let path = out_dir.join(file.path);
        if fs::read_to_string(&path).is_ok_and(|existing| existing == file.contents) {
            debug!(path = %path.display(), "Bindings unchanged.");
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
        }
        fs::write(&path, &file.contents)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        info!(language = %file.language, path = %path.display(), "Wrote bindings.");
        written.push(path);
    }
    Ok(written)
}

/// How a generated binding file differs from the one on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Missing,
    Outdated {
        added: usize,
        removed: usize,
        /// Unified diff from the on-disk file to the generated one.
        diff: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFile {
    /// Path relative to the output root.
    pub path: &'static str,
    pub language: Language,
    pub staleness: Staleness,
}

impl fmt::Display for StaleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.staleness {
            Staleness::Missing => write!(f, "missing   {} ({})", self.path, self.language),
            Staleness::Outdated { added, removed, .. } => write!(
                f,
                "outdated  {} ({}, +{added} -{removed} lines)",
                self.path, self.language
            ),
        }
    }
}

/// Every generated file that is absent from `out_dir` or differs from it.
pub fn stale_files(out_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<StaleFile>, String> {
    let mut stale = Vec::new();
    for file in files {
        let path = out_dir.join(file.path);
        let staleness = match fs::read_to_string(&path) {
            Ok(existing) if existing == file.contents => continue,
            Ok(existing) => outdated(file.path, &existing, &file.contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Staleness::Missing,
            Err(err) => return Err(format!("Failed to read {}: {err}", path.display())),
        };
        debug!(path = %path.display(), "Bindings are stale.");
        stale.push(StaleFile {
            path: file.path,
            language: file.language,
            staleness,
        });
    }
    Ok(stale)
}

fn outdated(rel_path: &str, on_disk: &str, generated: &str) -> Staleness {
    let diff = TextDiff::from_lines(on_disk, generated);
    let (mut added, mut removed) = (0, 0);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("{rel_path} (on disk)"), &format!("{rel_path} (generated)"))
        .to_string();
    Staleness::Outdated {
        added,
        removed,
        diff: unified,
    }
}
