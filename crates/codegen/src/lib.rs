//! Binding emitter and consistency checker for the HyperDbg export schema.
//!
//! [`check`] runs first for every requested language; nothing is rendered
//! unless the whole schema is covered. Output is a pure function of the
//! schema and ontology, so regenerating an unchanged schema is a no-op.

mod backend;
mod check;
mod ir;
mod lower;
pub mod utils;

use std::collections::{BTreeMap, BTreeSet};

use hdbg_schema::Schema;
use hdbg_wire::{Language, Ontology};
use rayon::prelude::*;
use tracing::{debug, info};

pub use backend::{
    Backend, CSharpBackend, GoBackend, PythonBackend, RustBackend, TypeScriptBackend, backend_for,
};
pub use check::{CoverageFailure, FailureReason, SchemaCoverageError, check, coverage_failures};
pub use ir::{FieldIR, ModuleIR, StructIR, StubIR, StubParam, StubReturn};
pub use lower::{field_wire_type, lower_module};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub language: Language,
    /// Path relative to the output root.
    pub path: &'static str,
    pub contents: String,
}

/// Render the bindings for one language.
pub fn emit(
    schema: &Schema,
    ontology: &Ontology,
    lang: Language,
) -> Result<String, SchemaCoverageError> {
    let backend = backend_for(lang);
    let module = lower_module(schema, ontology, backend)?;
    let source = backend.render(&module);
    debug!(
        language = %lang,
        stubs = module.stubs.len(),
        structs = module.structs.len(),
        bytes = source.len(),
        "Rendered bindings"
    );
    Ok(source)
}

/// Check all `languages`, then render each one.
///
/// Duplicates are ignored. Coverage failures across every language are
/// reported together and abort the run before any file is rendered.
pub fn generate(
    schema: &Schema,
    ontology: &Ontology,
    languages: &[Language],
) -> Result<Vec<GeneratedFile>, SchemaCoverageError> {
    let languages: Vec<Language> = languages
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    check(schema, ontology, &languages)?;

    let rendered: BTreeMap<Language, String> = languages
        .par_iter()
        .map(|lang| emit(schema, ontology, *lang).map(|source| (*lang, source)))
        .collect::<Result<_, _>>()?;

    info!(languages = rendered.len(), endpoints = schema.endpoints().len(), "Generated bindings");
    Ok(rendered
        .into_iter()
        .map(|(language, contents)| GeneratedFile {
            language,
            path: backend_for(language).file_name(),
            contents,
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hdbg_schema::Endpoint;
    use hdbg_wire::{WireKind, WireType};

    #[test]
    fn test_generate_is_deterministic() {
        let schema = Schema::hyperdbg();
        let ontology = Ontology::standard();
        let first = generate(&schema, &ontology, &Language::ALL).unwrap();
        let second = generate(&schema, &ontology, &Language::ALL).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), Language::ALL.len());
    }

    #[test]
    fn test_generate_dedupes_languages() {
        let files = generate(
            &Schema::hyperdbg(),
            &Ontology::standard(),
            &[Language::Python, Language::Go, Language::Python],
        )
        .unwrap();
        let langs: Vec<_> = files.iter().map(|f| f.language).collect();
        assert_eq!(langs, [Language::Go, Language::Python]);
        assert_eq!(files[0].path, "go/sdk.go");
    }

    #[test]
    fn test_coverage_gap_aborts_every_language() {
        let ontology = Ontology::standard().without(Language::TypeScript, WireKind::StringArray);
        let err = generate(&Schema::hyperdbg(), &ontology, &Language::ALL).unwrap_err();
        assert!(err.failures.iter().all(|f| f.language == Language::TypeScript));
        assert_eq!(err.endpoints(), ["HyperDbgTestCommandParser"]);
    }

    #[test]
    fn test_every_endpoint_becomes_a_stub() {
        let schema = Schema::hyperdbg();
        for file in generate(&schema, &Ontology::standard(), &Language::ALL).unwrap() {
            for ep in schema.endpoints() {
                assert!(
                    file.contents.contains(&format!("\"{}\"", ep.wire_name())),
                    "{} lacks {}",
                    file.language,
                    ep.name
                );
            }
        }
    }

    #[test]
    fn test_schema_change_changes_output() {
        let ontology = Ontology::standard();
        let before = Schema::new(vec![Endpoint::new("Pause", WireType::Void)], vec![]).unwrap();
        let after = Schema::new(
            vec![
                Endpoint::new("Pause", WireType::Void),
                Endpoint::new("Continue", WireType::Void),
            ],
            vec![],
        )
        .unwrap();
        for lang in Language::ALL {
            let a = emit(&before, &ontology, lang).unwrap();
            let b = emit(&after, &ontology, lang).unwrap();
            assert_ne!(a, b);
            assert!(b.starts_with(&a[..a.find('\n').unwrap()]));
        }
    }
}
