use hdbg_wire::Language;

use super::{Backend, GENERATED_NOTICE, line, register_rows};
use crate::ir::{ModuleIR, StructIR, StubIR};
use crate::utils::{RUST_RESERVED_WORDS, clean_identifier, quote, to_snake_case};

/// Async methods on an `Engine` wrapping `hdbg_client::Client`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

fn rust_ident(name: &str) -> String {
    let ident = to_snake_case(&clean_identifier(name));
    if RUST_RESERVED_WORDS.contains(ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

impl Backend for RustBackend {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn file_name(&self) -> &'static str {
        "rust/sdk.rs"
    }

    fn stub_ident(&self, wire_name: &str) -> String {
        let ident = rust_ident(wire_name);
        // `Engine::new` and `Engine::client` are taken.
        if ident == "new" || ident == "client" {
            format!("{ident}_")
        } else {
            ident
        }
    }

    fn value_ident(&self, name: &str) -> String {
        rust_ident(name)
    }

    fn render(&self, module: &ModuleIR) -> String {
        let mut out = String::new();
        out.push_str(&format!("// {GENERATED_NOTICE}\n"));
        out.push_str("//! Typed client for the HyperDbg HTTP export API.\n\n");
        out.push_str(
            "#![allow(non_camel_case_types, non_snake_case, clippy::too_many_arguments)]\n\n",
        );

        let mut imports = vec!["Client", "ClientError"];
        if module.has_scalar_params() {
            imports.push("ToWire");
        }
        if module.has_struct_params() {
            imports.push("encode_json");
        }
        out.push_str(&format!("use hdbg_client::{{{}}};\n", imports.join(", ")));
        if !module.structs.is_empty() {
            out.push_str("use serde::Serialize;\n");
        }

        for def in &module.structs {
            out.push('\n');
            render_struct(&mut out, def);
        }

        out.push_str("\n/// Register names indexed by register id.\n");
        out.push_str(&format!(
            "pub const REGISTER_NAMES: [&str; {}] = [\n",
            module.registers.len()
        ));
        for row in register_rows(&module.registers) {
            line(&mut out, 1, &format!("{row},"));
        }
        out.push_str("];\n\n");

        out.push_str(ENGINE);
        for stub in &module.stubs {
            out.push('\n');
            render_stub(&mut out, stub);
        }
        out.push_str("}\n");
        out
    }
}

const ENGINE: &str = r#"/// One engine listener. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Engine {
    client: Client,
}

impl Engine {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
"#;

fn render_struct(out: &mut String, def: &StructIR) {
    line(out, 0, "#[derive(Debug, Clone, Default, PartialEq, Serialize)]");
    line(out, 0, &format!("pub struct {} {{", def.name));
    for field in &def.fields {
        if field.ident != field.key {
            line(out, 1, &format!("#[serde(rename = {})]", quote(&field.key)));
        }
        if field.hex {
            line(out, 1, "/// Hex-encoded bytes.");
        }
        line(out, 1, &format!("pub {}: {},", field.ident, field.ty));
    }
    line(out, 0, "}");
}

fn render_stub(out: &mut String, stub: &StubIR) {
    let mut params = vec!["&self".to_string()];
    params.extend(stub.params.iter().map(|p| format!("{}: {}", p.ident, p.ty)));
    let ret = stub.returns.ty.as_deref().unwrap_or("()");

    line(out, 1, &format!("/// Calls `/{}`.", stub.endpoint));
    line(
        out,
        1,
        &format!(
            "pub async fn {}({}) -> Result<{ret}, ClientError> {{",
            stub.name,
            params.join(", ")
        ),
    );
    line(out, 2, "self.client");
    let endpoint = quote(&stub.endpoint);
    let turbofish = &stub.returns.decode;
    if stub.params.is_empty() {
        line(out, 3, &format!(".request::<{turbofish}>({endpoint}, &[])"));
    } else {
        line(out, 3, &format!(".request::<{turbofish}>("));
        line(out, 4, &format!("{endpoint},"));
        line(out, 4, "&[");
        for p in &stub.params {
            line(out, 5, &format!("({}, {}),", quote(&p.key), p.encode));
        }
        line(out, 4, "],");
        line(out, 3, ")");
    }
    line(out, 3, ".await");
    line(out, 1, "}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit;
    use hdbg_schema::{Endpoint, Schema};
    use hdbg_wire::{Ontology, WireType};

    fn generated() -> String {
        emit(&Schema::hyperdbg(), &Ontology::standard(), Language::Rust).unwrap()
    }

    #[test]
    fn test_void_stub() {
        let src = generated();
        assert!(src.contains(
            "    pub async fn set_break_point(\
             &self, address: u64, pid: u32, tid: u32, core_numer: u32\
             ) -> Result<(), ClientError> {\n\
             \x20       self.client\n\
             \x20           .request::<()>(\n\
             \x20               \"SetBreakPoint\",\n\
             \x20               &[\n\
             \x20                   (\"address\", address.to_wire()),\n"
        ));
    }

    #[test]
    fn test_struct_param_and_rename() {
        let src = generated();
        assert!(src.contains("guest_registers: &GUEST_REGS"));
        assert!(src.contains("(\"guest_registers\", encode_json(guest_registers)?),"));
        assert!(src.contains("    #[serde(rename = \"CS\")]\n    pub cs: u16,\n"));
        assert!(src.contains("    pub rax: u64,\n"));
        assert!(!src.contains("rename = \"rax\""));
    }

    #[test]
    fn test_imports_follow_usage() {
        let schema = Schema::new(vec![Endpoint::new("Pause", WireType::Void)], vec![]).unwrap();
        let src = emit(&schema, &Ontology::standard(), Language::Rust).unwrap();
        assert!(src.contains("use hdbg_client::{Client, ClientError};\n"));
        assert!(!src.contains("serde"));
        assert!(src.contains(".request::<()>(\"Pause\", &[])"));

        let full = generated();
        assert!(full.contains("use hdbg_client::{Client, ClientError, ToWire, encode_json};\n"));
        assert!(full.contains("pub const REGISTER_NAMES: [&str; 120] = [\n"));
    }
}
