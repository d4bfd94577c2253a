//! Schema + ontology -> [`ModuleIR`] for one backend.

use std::collections::HashSet;

use hdbg_schema::{REGISTER_NAMES, Schema, StructDef};
use hdbg_wire::{Language, Mapping, Ontology, WireType};

use crate::backend::Backend;
use crate::check::{CoverageFailure, FailureReason, SchemaCoverageError, check};
use crate::ir::{FieldIR, ModuleIR, StructIR, StubIR, StubParam, StubReturn};

/// The wire type a struct field is declared with. Byte arrays inside struct
/// JSON are hex strings.
pub fn field_wire_type(ty: &WireType) -> WireType {
    match ty {
        WireType::ByteBuffer => WireType::Utf8String,
        other => other.clone(),
    }
}

pub fn lower_module(
    schema: &Schema,
    ontology: &Ontology,
    backend: &dyn Backend,
) -> Result<ModuleIR, SchemaCoverageError> {
    let lang = backend.language();
    check(schema, ontology, &[lang])?;

    let mut structs = Vec::new();
    let mut stubs = Vec::with_capacity(schema.endpoints().len());
    let mut stub_names = HashSet::new();

    for def in referenced_structs(schema) {
        structs.push(lower_struct(ontology, backend, def)?);
    }

    for endpoint in schema.endpoints() {
        let resolve = |param: Option<&str>, ty: &WireType| {
            ontology.lookup(lang, ty).ok_or_else(|| {
                single_failure(lang, &endpoint.name, param, ty, FailureReason::MissingMapping)
            })
        };

        let mut idents = HashSet::new();
        let mut params = Vec::with_capacity(endpoint.params.len());
        for param in &endpoint.params {
            let mapping = resolve(Some(param.name.as_str()), &param.ty)?;
            let ident = unique(&mut idents, backend.value_ident(&param.name));
            params.push(StubParam {
                key: param.name.clone(),
                ty: mapping.render_param_type(&param.ty),
                encode: mapping.render_encode(&param.ty, &ident),
                is_struct: param.ty.is_struct(),
                ident,
            });
        }

        let mapping: &Mapping = resolve(None, &endpoint.returns)?;
        let decode = mapping.decode.ok_or_else(|| {
            single_failure(
                lang,
                &endpoint.name,
                None,
                &endpoint.returns,
                FailureReason::UnsupportedReturn,
            )
        })?;
        let returns = StubReturn {
            ty: (!endpoint.returns.is_void())
                .then(|| mapping.render_return_type(&endpoint.returns)),
            decode: decode.to_string(),
        };

        stubs.push(StubIR {
            name: unique(&mut stub_names, backend.stub_ident(endpoint.wire_name())),
            endpoint: endpoint.wire_name().to_string(),
            source_name: endpoint.name.clone(),
            params,
            returns,
        });
    }

    Ok(ModuleIR {
        language: lang,
        structs,
        registers: REGISTER_NAMES.iter().map(|name| (*name).to_string()).collect(),
        stubs,
    })
}

/// Struct definitions used by at least one parameter, in schema order.
fn referenced_structs(schema: &Schema) -> impl Iterator<Item = &StructDef> {
    let used: HashSet<&str> = schema
        .endpoints()
        .iter()
        .flat_map(|ep| &ep.params)
        .filter_map(|param| param.ty.struct_name())
        .collect();
    schema
        .structs()
        .iter()
        .filter(move |def| used.contains(def.name.as_str()))
}

fn lower_struct(
    ontology: &Ontology,
    backend: &dyn Backend,
    def: &StructDef,
) -> Result<StructIR, SchemaCoverageError> {
    let lang = backend.language();
    let mut idents = HashSet::new();
    let mut fields = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        let ty = field_wire_type(&field.ty);
        let mapping = ontology.lookup(lang, &ty).ok_or_else(|| {
            single_failure(
                lang,
                &def.name,
                Some(field.name.as_str()),
                &field.ty,
                FailureReason::MissingMapping,
            )
        })?;
        fields.push(FieldIR {
            key: field.name.clone(),
            ident: unique(&mut idents, backend.field_ident(&field.name)),
            ty: mapping.render_return_type(&ty),
            hex: matches!(field.ty, WireType::ByteBuffer),
        });
    }
    Ok(StructIR {
        name: backend.type_ident(&def.name),
        fields,
    })
}

/// Suffix `_2`, `_3`, ... until `candidate` is unused.
fn unique(used: &mut HashSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let next = format!("{candidate}_{n}");
        if used.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}

fn single_failure(
    language: Language,
    endpoint: &str,
    parameter: Option<&str>,
    ty: &WireType,
    reason: FailureReason,
) -> SchemaCoverageError {
    SchemaCoverageError {
        failures: vec![CoverageFailure {
            language,
            endpoint: endpoint.to_string(),
            parameter: parameter.map(str::to_string),
            ty: ty.clone(),
            reason,
        }],
    }
}
