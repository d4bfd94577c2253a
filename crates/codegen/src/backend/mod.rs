//! Per-language renderers.
//!
//! A backend owns two things: how names are spelled in its language, and how
//! a lowered [`ModuleIR`] is laid out as one source file. Every file has the
//! same shape: notice, dispatch primitive prelude, struct declarations,
//! register table, stubs.

mod csharp;
mod go;
mod python;
mod rust;
mod typescript;

use hdbg_wire::Language;

use crate::ir::ModuleIR;
use crate::utils::quote;

pub use csharp::CSharpBackend;
pub use go::GoBackend;
pub use python::PythonBackend;
pub use rust::RustBackend;
pub use typescript::TypeScriptBackend;

pub(crate) const GENERATED_NOTICE: &str =
    "Code generated by hdbg from the HyperDbg export schema. DO NOT EDIT.";

/// Renders stubs for one target language.
pub trait Backend: Send + Sync {
    fn language(&self) -> Language;

    /// Output path relative to the generation root.
    fn file_name(&self) -> &'static str;

    fn stub_ident(&self, wire_name: &str) -> String;

    /// Identifier for a parameter.
    fn value_ident(&self, name: &str) -> String;

    fn field_ident(&self, name: &str) -> String {
        self.value_ident(name)
    }

    fn type_ident(&self, name: &str) -> String {
        crate::utils::clean_identifier(name)
    }

    fn render(&self, module: &ModuleIR) -> String;
}

pub fn backend_for(lang: Language) -> &'static dyn Backend {
    match lang {
        Language::Go => &GoBackend,
        Language::Python => &PythonBackend,
        Language::Rust => &RustBackend,
        Language::TypeScript => &TypeScriptBackend,
        Language::CSharp => &CSharpBackend,
    }
}

// =============================================================================
// Shared layout helpers
// =============================================================================

fn line(out: &mut String, indent: usize, text: &str) {
    if !text.is_empty() {
        for _ in 0..indent {
            out.push_str("    ");
        }
        out.push_str(text);
    }
    out.push('\n');
}

/// Quoted register names, eight per row.
fn register_rows(registers: &[String]) -> Vec<String> {
    registers
        .chunks(8)
        .map(|row| {
            row.iter()
                .map(|name| quote(name))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_for_matches_language() {
        for lang in Language::ALL {
            assert_eq!(backend_for(lang).language(), lang);
        }
    }

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<_> = Language::ALL
            .iter()
            .map(|lang| backend_for(*lang).file_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Language::ALL.len());
    }

    #[test]
    fn test_register_rows() {
        let regs: Vec<String> = (0..10).map(|i| format!("r{i}")).collect();
        let rows = register_rows(&regs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "\"r8\", \"r9\"");
    }

    #[test]
    fn test_line_skips_indent_on_blank() {
        let mut out = String::new();
        line(&mut out, 2, "x");
        line(&mut out, 2, "");
        assert_eq!(out, "        x\n\n");
    }
}
