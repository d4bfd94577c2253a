//! Consistency checker: every wire type the schema mentions must have a
//! mapping in every requested language before anything is emitted.

use std::fmt;

use hdbg_schema::{Endpoint, Schema};
use hdbg_wire::{Language, Ontology, WireType};
use thiserror::Error;
use tracing::debug;

use crate::lower::field_wire_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The ontology has no entry for this (language, wire type) pair.
    MissingMapping,
    /// The type is mapped but has no decode rule, so it cannot be returned.
    UnsupportedReturn,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingMapping => f.write_str("no mapping"),
            FailureReason::UnsupportedReturn => f.write_str("unsupported return type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageFailure {
    pub language: Language,
    pub endpoint: String,
    /// `None` for the return type. Struct fields are reported as `param.field`.
    pub parameter: Option<String>,
    pub ty: WireType,
    pub reason: FailureReason,
}

impl fmt::Display for CoverageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(param) => write!(
                f,
                "[{}] {}: parameter {param} of type {}: {}",
                self.language, self.endpoint, self.ty, self.reason
            ),
            None => write!(
                f,
                "[{}] {}: return type {}: {}",
                self.language, self.endpoint, self.ty, self.reason
            ),
        }
    }
}

/// All coverage failures of one run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaCoverageError {
    pub failures: Vec<CoverageFailure>,
}

impl fmt::Display for SchemaCoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema coverage incomplete ({} failures)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

impl SchemaCoverageError {
    /// Endpoints with at least one failure, in schema order.
    pub fn endpoints(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !names.contains(&failure.endpoint.as_str()) {
                names.push(&failure.endpoint);
            }
        }
        names
    }
}

/// Check `schema` against `ontology` for each language, collecting every
/// failure instead of stopping at the first.
pub fn check(
    schema: &Schema,
    ontology: &Ontology,
    languages: &[Language],
) -> Result<(), SchemaCoverageError> {
    let failures: Vec<CoverageFailure> = languages
        .iter()
        .flat_map(|lang| coverage_failures(schema, ontology, *lang))
        .collect();
    debug!(
        languages = languages.len(),
        endpoints = schema.endpoints().len(),
        failures = failures.len(),
        "Checked schema coverage"
    );
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SchemaCoverageError { failures })
    }
}

pub fn coverage_failures(
    schema: &Schema,
    ontology: &Ontology,
    lang: Language,
) -> Vec<CoverageFailure> {
    let mut failures = Vec::new();
    for endpoint in schema.endpoints() {
        check_endpoint(schema, ontology, lang, endpoint, &mut failures);
    }
    failures
}

fn check_endpoint(
    schema: &Schema,
    ontology: &Ontology,
    lang: Language,
    endpoint: &Endpoint,
    failures: &mut Vec<CoverageFailure>,
) {
    let mut fail = |parameter: Option<String>, ty: &WireType, reason| {
        failures.push(CoverageFailure {
            language: lang,
            endpoint: endpoint.name.clone(),
            parameter,
            ty: ty.clone(),
            reason,
        });
    };

    for param in &endpoint.params {
        if ontology.lookup(lang, &param.ty).is_none() {
            fail(Some(param.name.clone()), &param.ty, FailureReason::MissingMapping);
        }
        // Struct declarations are emitted too, so their fields must map.
        let fields = param
            .ty
            .struct_name()
            .and_then(|name| schema.struct_def(name))
            .map(|def| def.fields.as_slice())
            .unwrap_or_default();
        for field in fields {
            let ty = field_wire_type(&field.ty);
            if ontology.lookup(lang, &ty).is_none() {
                fail(
                    Some(format!("{}.{}", param.name, field.name)),
                    &field.ty,
                    FailureReason::MissingMapping,
                );
            }
        }
    }

    match ontology.lookup(lang, &endpoint.returns) {
        None => fail(None, &endpoint.returns, FailureReason::MissingMapping),
        Some(mapping) if mapping.decode.is_none() || endpoint.returns.is_struct() => {
            fail(None, &endpoint.returns, FailureReason::UnsupportedReturn);
        }
        Some(_) => {}
    }
}
