//! Go: one `package sdk` file, free functions returning `(T, error)`.

use hdbg_wire::Language;

use super::{Backend, GENERATED_NOTICE, register_rows};
use crate::ir::{ModuleIR, StructIR, StubIR};
use crate::utils::{GO_RESERVED_WORDS, capitalize_first, clean_identifier, quote};

#[derive(Debug, Clone, Copy, Default)]
pub struct GoBackend;

/// Exported names the prelude defines.
const PRELUDE_EXPORTS: [&str; 6] = [
    "BaseURL",
    "ServerError",
    "DecodeError",
    "TransportError",
    "TimeoutError",
    "RegisterNames",
];

impl Backend for GoBackend {
    fn language(&self) -> Language {
        Language::Go
    }

    fn file_name(&self) -> &'static str {
        "go/sdk.go"
    }

    fn stub_ident(&self, wire_name: &str) -> String {
        let name = capitalize_first(&clean_identifier(wire_name));
        if PRELUDE_EXPORTS.contains(&name.as_str()) {
            format!("{name}_")
        } else {
            name
        }
    }

    fn value_ident(&self, name: &str) -> String {
        let ident = clean_identifier(name);
        if GO_RESERVED_WORDS.contains(ident.as_str()) {
            format!("{ident}_")
        } else {
            ident
        }
    }

    fn field_ident(&self, name: &str) -> String {
        // Exported, or encoding/json skips the field.
        capitalize_first(&clean_identifier(name))
    }

    fn render(&self, module: &ModuleIR) -> String {
        let mut out = String::new();
        out.push_str(&format!("// {GENERATED_NOTICE}\n\n"));
        out.push_str(PRELUDE);

        for def in &module.structs {
            out.push('\n');
            render_struct(&mut out, def);
        }

        out.push_str(
            "\n// RegisterNames maps register ids (the index) to engine register names.\n",
        );
        out.push_str("var RegisterNames = []string{\n");
        for row in register_rows(&module.registers) {
            out.push_str(&format!("\t{row},\n"));
        }
        out.push_str("}\n");

        for stub in &module.stubs {
            out.push('\n');
            render_stub(&mut out, stub);
        }
        out
    }
}

fn render_struct(out: &mut String, def: &StructIR) {
    out.push_str(&format!("type {} struct {{\n", def.name));
    for field in &def.fields {
        let note = if field.hex { " // hex" } else { "" };
        out.push_str(&format!(
            "\t{} {} `json:{}`{note}\n",
            field.ident,
            field.ty,
            quote(&field.key)
        ));
    }
    out.push_str("}\n");
}

fn render_stub(out: &mut String, stub: &StubIR) {
    let params = stub
        .params
        .iter()
        .map(|p| format!("{} {}", p.ident, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    // Struct arguments are marshalled up front; `encode` holds the fallible call.
    let mut marshal = String::new();
    let mut args = String::from("nil");
    if !stub.params.is_empty() {
        args = String::from("[]param{\n");
        for p in &stub.params {
            let value = if p.is_struct {
                let encoded = format!("{}JSON", p.ident);
                marshal.push_str(&format!("\t{encoded}, err := {}\n", p.encode));
                marshal.push_str("\tif err != nil {\n");
                let wrapped = format!("fmt.Errorf(\"encoding {}: %w\", err)", p.key);
                match &stub.returns.ty {
                    None => marshal.push_str(&format!("\t\treturn {wrapped}\n")),
                    Some(ty) => marshal.push_str(&format!("\t\treturn fail[{ty}]({wrapped})\n")),
                }
                marshal.push_str("\t}\n");
                encoded
            } else {
                p.encode.clone()
            };
            args.push_str(&format!("\t\t{{{}, {value}}},\n", quote(&p.key)));
        }
        args.push_str("\t}");
    }
    let call = format!("request[{}]({}, {args})", stub.returns.decode, quote(&stub.endpoint));

    out.push_str(&format!("// {} calls /{}.\n", stub.name, stub.endpoint));
    match &stub.returns.ty {
        None => {
            out.push_str(&format!("func {}({params}) error {{\n", stub.name));
            out.push_str(&marshal);
            let assign = if marshal.is_empty() { ":=" } else { "=" };
            out.push_str(&format!("\t_, err {assign} {call}\n"));
            out.push_str("\treturn err\n");
        }
        Some(ty) => {
            out.push_str(&format!("func {}({params}) ({ty}, error) {{\n", stub.name));
            out.push_str(&marshal);
            out.push_str(&format!("\treturn {call}\n"));
        }
    }
    out.push_str("}\n");
}

const PRELUDE: &str = r#"// Package sdk is a typed client for the HyperDbg HTTP export API.
package sdk

import (
	"context"
	"encoding/hex"
	"encoding/json"
	"errors"
	"fmt"
	"io"
	"net"
	"net/http"
	"net/url"
	"strconv"
	"strings"
	"time"
	"unicode/utf8"
)

// BaseURL is the engine listener every call is sent to.
var BaseURL = "http://127.0.0.1:8888/"

var client = &http.Client{
	Timeout:   15 * time.Second,
	Transport: &http.Transport{DisableKeepAlives: true, Proxy: nil},
}

type void struct{}

type param struct {
	key   string
	value string
}

// ServerError is returned for any non-200 response.
type ServerError struct {
	Endpoint string
	Status   int
	Body     string
}

func (e *ServerError) Error() string {
	return fmt.Sprintf("%s returned %d: %s", e.Endpoint, e.Status, e.Body)
}

// DecodeError is returned when a body does not match the declared type.
type DecodeError struct {
	Raw  string
	Type string
	Err  error
}

func (e *DecodeError) Error() string {
	return fmt.Sprintf("cannot decode %q as %s: %v", e.Raw, e.Type, e.Err)
}

func (e *DecodeError) Unwrap() error { return e.Err }

// TransportError is returned when no response could be read: connection
// refused, reset, DNS failure or a truncated body.
type TransportError struct {
	Endpoint string
	Err      error
}

func (e *TransportError) Error() string {
	return fmt.Sprintf("%s: transport error: %v", e.Endpoint, e.Err)
}

func (e *TransportError) Unwrap() error { return e.Err }

// TimeoutError is returned when a call exceeds the client timeout.
type TimeoutError struct {
	Endpoint string
	Err      error
}

func (e *TimeoutError) Error() string {
	return fmt.Sprintf("%s: timed out: %v", e.Endpoint, e.Err)
}

func (e *TimeoutError) Unwrap() error { return e.Err }

func transportError(endpoint string, err error) error {
	var netErr net.Error
	if errors.Is(err, context.DeadlineExceeded) || (errors.As(err, &netErr) && netErr.Timeout()) {
		return &TimeoutError{Endpoint: endpoint, Err: err}
	}
	return &TransportError{Endpoint: endpoint, Err: err}
}

func jsonArg(v any) (string, error) {
	b, err := json.Marshal(v)
	if err != nil {
		return "", err
	}
	return string(b), nil
}

func fail[T any](err error) (T, error) {
	var zero T
	return zero, err
}

func request[T any](endpoint string, params []param) (T, error) {
	var zero T
	target := BaseURL + endpoint
	if len(params) > 0 {
		pairs := make([]string, 0, len(params))
		for _, p := range params {
			pairs = append(pairs, url.QueryEscape(p.key)+"="+url.QueryEscape(p.value))
		}
		target += "?" + strings.Join(pairs, "&")
	}
	resp, err := client.Get(target)
	if err != nil {
		return zero, transportError(endpoint, err)
	}
	defer resp.Body.Close()
	body, err := io.ReadAll(resp.Body)
	if err != nil {
		return zero, transportError(endpoint, err)
	}
	if resp.StatusCode != http.StatusOK {
		return zero, &ServerError{Endpoint: endpoint, Status: resp.StatusCode, Body: string(body)}
	}
	if _, isVoid := any(zero).(void); !isVoid && !utf8.Valid(body) {
		text := strings.TrimSpace(strings.ToValidUTF8(string(body), "\uFFFD"))
		err := errors.New("body is not valid UTF-8")
		return zero, &DecodeError{Raw: text, Type: fmt.Sprintf("%T", zero), Err: err}
	}
	return decode[T](strings.TrimSpace(string(body)))
}

func hasHexPrefix(text string) bool {
	return strings.HasPrefix(text, "0x") || strings.HasPrefix(text, "0X")
}

func parseUnsigned(text string, bits int) (uint64, error) {
	if hasHexPrefix(text) {
		return strconv.ParseUint(text[2:], 16, bits)
	}
	return strconv.ParseUint(text, 10, bits)
}

// Hex text is the two's complement bit pattern of the declared width.
func parseSigned(text string, bits int) (int64, error) {
	if hasHexPrefix(text) {
		u, err := strconv.ParseUint(text[2:], 16, bits)
		if err != nil {
			return 0, err
		}
		shift := uint(64 - bits)
		return int64(u<<shift) >> shift, nil
	}
	return strconv.ParseInt(text, 10, bits)
}

func parseBool(text string) (bool, error) {
	if hasHexPrefix(text) {
		text = text[2:]
	}
	switch {
	case strings.EqualFold(text, "true"):
		return true, nil
	case strings.EqualFold(text, "false"):
		return false, nil
	}
	return false, fmt.Errorf("unrecognized boolean literal")
}

func parseHex(text string) ([]byte, error) {
	if hasHexPrefix(text) {
		text = text[2:]
	}
	return hex.DecodeString(text)
}

func decode[T any](text string) (T, error) {
	var zero T
	var out any
	var err error
	switch any(zero).(type) {
	case void:
		return zero, nil
	case bool:
		out, err = parseBool(text)
	case int8:
		var v int64
		v, err = parseSigned(text, 8)
		out = int8(v)
	case int16:
		var v int64
		v, err = parseSigned(text, 16)
		out = int16(v)
	case int32:
		var v int64
		v, err = parseSigned(text, 32)
		out = int32(v)
	case int64:
		out, err = parseSigned(text, 64)
	case uint8:
		var v uint64
		v, err = parseUnsigned(text, 8)
		out = uint8(v)
	case uint16:
		var v uint64
		v, err = parseUnsigned(text, 16)
		out = uint16(v)
	case uint32:
		var v uint64
		v, err = parseUnsigned(text, 32)
		out = uint32(v)
	case uint64:
		out, err = parseUnsigned(text, 64)
	case uintptr:
		var v uint64
		v, err = parseUnsigned(text, 64)
		out = uintptr(v)
	case float32:
		var v float64
		v, err = strconv.ParseFloat(text, 32)
		out = float32(v)
	case float64:
		out, err = strconv.ParseFloat(text, 64)
	case string:
		out = text
	case []byte:
		out, err = parseHex(text)
	case []string:
		out = strings.Fields(text)
	default:
		return zero, fmt.Errorf("no decode rule for %T", zero)
	}
	if err != nil {
		return zero, &DecodeError{Raw: text, Type: fmt.Sprintf("%T", zero), Err: err}
	}
	return out.(T), nil
}
"#;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit;
    use hdbg_schema::Schema;
    use hdbg_wire::Ontology;

    fn generated() -> String {
        emit(&Schema::hyperdbg(), &Ontology::standard(), Language::Go).unwrap()
    }

    #[test]
    fn test_void_stub() {
        let src = generated();
        assert!(src.contains(
            "func SetBreakPoint(\
             address uint64, pid uint32, tid uint32, core_numer uint32) error {\n\
             \t_, err := request[void](\"SetBreakPoint\", []param{\n\
             \t\t{\"address\", strconv.FormatUint(address, 10)},\n"
        ));
    }

    #[test]
    fn test_value_stub_without_params() {
        let src = generated();
        assert!(src.contains(
            "func DebuggerGetKernelBase() (uint64, error) {\n\
             \treturn request[uint64](\"DebuggerGetKernelBase\", nil)\n}"
        ));
    }

    #[test]
    fn test_struct_fields_are_exported_with_json_keys() {
        let src = generated();
        assert!(src.contains("type GUEST_REGS struct {\n\tRax uint64 `json:\"rax\"`\n"));
        assert!(src.contains("\tLlLhData string `json:\"LlLhData\"` // hex\n"));
        assert!(src.contains("guest_registers *GUEST_REGS"));
    }

    #[test]
    fn test_struct_argument_marshal_error_is_returned() {
        let src = generated();
        assert!(!src.contains("panic("));
        assert!(src.contains(
            "\tguest_registersJSON, err := jsonArg(guest_registers)\n\
             \tif err != nil {\n\
             \t\treturn fail[bool](fmt.Errorf(\"encoding guest_registers: %w\", err))\n\
             \t}\n"
        ));
        assert!(src.contains("\t\t{\"guest_registers\", guest_registersJSON},\n"));

        // Void stubs return the wrapped error directly and reuse `err`.
        assert!(src.contains("\t\treturn fmt.Errorf(\"encoding dt_details: %w\", err)\n"));
        assert!(src.contains("\t_, err = request[void](\"ShowMemoryOrDisassemble\""));
    }

    #[test]
    fn test_transport_and_timeout_errors_are_typed() {
        let src = generated();
        assert!(src.contains("type TransportError struct {"));
        assert!(src.contains("type TimeoutError struct {"));
        assert!(src.contains("return zero, transportError(endpoint, err)"));
        assert!(src.contains("netErr.Timeout()"));
    }

    #[test]
    fn test_invalid_utf8_body_is_a_decode_error() {
        let src = generated();
        assert!(src.contains("!utf8.Valid(body)"));
        assert!(src.contains("errors.New(\"body is not valid UTF-8\")"));
    }

    #[test]
    fn test_notice_precedes_package_clause() {
        let src = generated();
        assert!(src.starts_with("// Code generated by hdbg"));
        assert!(src.find("package sdk").unwrap() < src.find("func request").unwrap());
    }
}
