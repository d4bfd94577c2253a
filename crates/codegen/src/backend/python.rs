use hdbg_wire::Language;

use super::{Backend, GENERATED_NOTICE, line, register_rows};
use crate::ir::{ModuleIR, StructIR, StubIR};
use crate::utils::{PYTHON_RESERVED_WORDS, clean_identifier, quote, to_snake_case};

/// Python 3.9+ module built on `urllib`, no third-party imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonBackend;

fn python_ident(name: &str) -> String {
    let ident = to_snake_case(&clean_identifier(name));
    if PYTHON_RESERVED_WORDS.contains(ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

impl Backend for PythonBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn file_name(&self) -> &'static str {
        "python/sdk.py"
    }

    fn stub_ident(&self, wire_name: &str) -> String {
        python_ident(wire_name)
    }

    fn value_ident(&self, name: &str) -> String {
        python_ident(name)
    }

    fn render(&self, module: &ModuleIR) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {GENERATED_NOTICE}\n"));
        out.push_str(PRELUDE);

        for def in &module.structs {
            out.push_str("\n\n");
            render_struct(&mut out, def);
        }

        out.push_str("\n\n# Register names indexed by register id.\n");
        out.push_str("REGISTER_NAMES = (\n");
        for row in register_rows(&module.registers) {
            line(&mut out, 1, &format!("{row},"));
        }
        out.push_str(")\n");

        for stub in &module.stubs {
            out.push_str("\n\n");
            render_stub(&mut out, stub);
        }
        out
    }
}

fn field_default(ty: &str) -> &'static str {
    match ty {
        "bool" => "False",
        "float" => "0.0",
        "str" => "\"\"",
        "bytes" => "b\"\"",
        "list[str]" => "field(default_factory=list)",
        _ => "0",
    }
}

fn render_struct(out: &mut String, def: &StructIR) {
    line(out, 0, "@dataclass");
    line(out, 0, &format!("class {}:", def.name));
    for field in &def.fields {
        let note = if field.hex { "  # hex" } else { "" };
        line(
            out,
            1,
            &format!("{}: {} = {}{note}", field.ident, field.ty, field_default(&field.ty)),
        );
    }
    line(out, 0, "");
    line(out, 1, "def to_wire(self) -> dict[str, Any]:");
    line(out, 2, "return {");
    for field in &def.fields {
        line(out, 3, &format!("{}: self.{},", quote(&field.key), field.ident));
    }
    line(out, 2, "}");
}

fn render_stub(out: &mut String, stub: &StubIR) {
    let params = stub
        .params
        .iter()
        .map(|p| format!("{}: {}", p.ident, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let returns = stub.returns.ty.as_deref().unwrap_or("None");
    line(out, 0, &format!("def {}({params}) -> {returns}:", stub.name));
    line(out, 1, &format!("\"\"\"Call /{}.\"\"\"", stub.endpoint));

    let prefix = if stub.returns.ty.is_some() { "return " } else { "" };
    let endpoint = quote(&stub.endpoint);
    let tag = quote(&stub.returns.decode);
    if stub.params.is_empty() {
        line(out, 1, &format!("{prefix}_request({endpoint}, [], {tag})"));
        return;
    }
    line(out, 1, &format!("{prefix}_request("));
    line(out, 2, &format!("{endpoint},"));
    line(out, 2, "[");
    for p in &stub.params {
        line(out, 3, &format!("({}, {}),", quote(&p.key), p.encode));
    }
    line(out, 2, "],");
    line(out, 2, &format!("{tag},"));
    line(out, 1, ")");
}

const PRELUDE: &str = r#""""Typed client for the HyperDbg HTTP export API."""

from __future__ import annotations

import http.client
import json
import re
import socket
import urllib.error
import urllib.parse
import urllib.request
from dataclasses import dataclass, field
from typing import Any

BASE_URL = "http://127.0.0.1:8888/"
TIMEOUT = 15.0

_OPENER = urllib.request.build_opener(urllib.request.ProxyHandler({}))


class ServerError(Exception):
    """The engine answered with a non-200 status."""

    def __init__(self, endpoint: str, status: int, body: str) -> None:
        super().__init__(f"{endpoint} returned {status}: {body}")
        self.endpoint = endpoint
        self.status = status
        self.body = body


class DecodeError(ValueError):
    """A response body did not match the declared return type."""


class TransportError(Exception):
    """No response could be read from the engine."""

    def __init__(self, endpoint: str, reason: object) -> None:
        super().__init__(f"{endpoint}: transport error: {reason}")
        self.endpoint = endpoint
        self.reason = reason


class RequestTimeoutError(TransportError):
    """The call did not complete within TIMEOUT seconds."""


def _is_timeout(reason: object) -> bool:
    return isinstance(reason, (socket.timeout, TimeoutError))


def _bool(value: bool) -> str:
    return "true" if value else "false"


def _json(value: Any) -> str:
    return json.dumps(value.to_wire(), separators=(",", ":"))


_BITS = {
    "i8": 8, "i16": 16, "i32": 32, "i64": 64,
    "u8": 8, "u16": 16, "u32": 32, "u64": 64, "ptr": 64,
}
_HEX_INT = re.compile(r"0[xX]([0-9a-fA-F]+)")
_SIGNED = re.compile(r"[+-]?[0-9]+")
_UNSIGNED = re.compile(r"[0-9]+")
_HEX_BYTES = re.compile(r"(?:[0-9a-fA-F]{2})*")


def _strip_hex_prefix(text: str) -> str:
    return text[2:] if text[:2] in ("0x", "0X") else text


def _int(text: str, tag: str) -> int:
    bits = _BITS[tag]
    signed = tag.startswith("i")
    match = _HEX_INT.fullmatch(text)
    if match:
        value = int(match.group(1), 16)
        if value >= 1 << bits:
            raise DecodeError(f"{text!r} out of range for {tag}")
        # two's complement of the declared width
        if signed and value >= 1 << (bits - 1):
            value -= 1 << bits
        return value
    if not (_SIGNED if signed else _UNSIGNED).fullmatch(text):
        raise DecodeError(f"{text!r} is not a valid {tag}")
    value = int(text)
    if signed:
        low, high = -(1 << (bits - 1)), (1 << (bits - 1)) - 1
    else:
        low, high = 0, (1 << bits) - 1
    if not low <= value <= high:
        raise DecodeError(f"{text!r} out of range for {tag}")
    return value


def _decode(text: str, tag: str) -> Any:
    if tag == "void":
        return None
    if tag in _BITS:
        return _int(text, tag)
    if tag == "bool":
        word = _strip_hex_prefix(text).lower()
        if word == "true":
            return True
        if word == "false":
            return False
        raise DecodeError(f"{text!r} is not a boolean")
    if tag in ("f32", "f64"):
        if "_" in text:
            raise DecodeError(f"{text!r} is not a float")
        try:
            return float(text)
        except ValueError as err:
            raise DecodeError(f"{text!r} is not a float") from err
    if tag in ("str", "wstr"):
        return text
    if tag == "bytes":
        digits = _strip_hex_prefix(text)
        if not _HEX_BYTES.fullmatch(digits):
            raise DecodeError(f"{text!r} is not an even-length hex string")
        return bytes.fromhex(digits)
    if tag == "strs":
        return text.split()
    raise DecodeError(f"no decode rule for {tag}")


def _request(endpoint: str, params: list[tuple[str, str]], tag: str) -> Any:
    url = BASE_URL + endpoint
    if params:
        url += "?" + urllib.parse.urlencode(params)
    try:
        with _OPENER.open(url, timeout=TIMEOUT) as response:
            status = response.status
            raw = response.read()
    except urllib.error.HTTPError as err:
        text = err.read().decode("utf-8", errors="replace")
        raise ServerError(endpoint, err.code, text) from err
    except urllib.error.URLError as err:
        if _is_timeout(err.reason):
            raise RequestTimeoutError(endpoint, err.reason) from err
        raise TransportError(endpoint, err.reason) from err
    except (socket.timeout, TimeoutError) as err:
        raise RequestTimeoutError(endpoint, err) from err
    except (OSError, http.client.HTTPException) as err:
        raise TransportError(endpoint, err) from err
    if status != 200:
        raise ServerError(endpoint, status, raw.decode("utf-8", errors="replace"))
    if tag == "void":
        return None
    try:
        body = raw.decode("utf-8")
    except UnicodeDecodeError as err:
        text = raw.decode("utf-8", errors="replace").strip()
        raise DecodeError(f"{text!r} is not valid UTF-8") from err
    return _decode(body.strip(), tag)
"#;
