use hdbg_wire::Language;

use super::{Backend, GENERATED_NOTICE, line, register_rows};
use crate::ir::{ModuleIR, StructIR, StubIR};
use crate::utils::{TS_RESERVED_WORDS, clean_identifier, lowercase_first, quote};

/// ES2022 module using the global `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptBackend;

fn escape_reserved(ident: String) -> String {
    if TS_RESERVED_WORDS.contains(ident.as_str()) {
        format!("_{ident}")
    } else {
        ident
    }
}

impl Backend for TypeScriptBackend {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn file_name(&self) -> &'static str {
        "typescript/sdk.ts"
    }

    fn stub_ident(&self, wire_name: &str) -> String {
        escape_reserved(lowercase_first(&clean_identifier(wire_name)))
    }

    fn value_ident(&self, name: &str) -> String {
        escape_reserved(lowercase_first(&clean_identifier(name)))
    }

    // Interface members are the JSON keys themselves.
    fn field_ident(&self, name: &str) -> String {
        name.to_string()
    }

    fn render(&self, module: &ModuleIR) -> String {
        let mut out = String::new();
        out.push_str(&format!("// {GENERATED_NOTICE}\n"));
        out.push_str(PRELUDE);

        for def in &module.structs {
            out.push('\n');
            render_interface(&mut out, def);
        }

        out.push_str("\n/** Register names indexed by register id. */\n");
        out.push_str("export const REGISTER_NAMES = [\n");
        for row in register_rows(&module.registers) {
            line(&mut out, 1, &format!("{row},"));
        }
        out.push_str("] as const;\n");

        for stub in &module.stubs {
            out.push('\n');
            render_stub(&mut out, stub);
        }
        out
    }
}

fn property_name(key: &str) -> String {
    if clean_identifier(key) == key {
        key.to_string()
    } else {
        quote(key)
    }
}

fn render_interface(out: &mut String, def: &StructIR) {
    line(out, 0, &format!("export interface {} {{", def.name));
    for field in &def.fields {
        let note = if field.hex { " // hex" } else { "" };
        line(
            out,
            1,
            &format!("{}: {};{note}", property_name(&field.ident), field.ty),
        );
    }
    line(out, 0, "}");
}

fn render_stub(out: &mut String, stub: &StubIR) {
    let params = stub
        .params
        .iter()
        .map(|p| format!("{}: {}", p.ident, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let ret = stub.returns.ty.as_deref().unwrap_or("void");
    let keyword = if stub.returns.ty.is_some() { "return" } else { "await" };
    let endpoint = quote(&stub.endpoint);
    let tag = quote(&stub.returns.decode);

    line(out, 0, &format!("/** Calls /{}. */", stub.endpoint));
    line(
        out,
        0,
        &format!("export async function {}({params}): Promise<{ret}> {{", stub.name),
    );
    if stub.params.is_empty() {
        line(out, 1, &format!("{keyword} request({endpoint}, [], {tag});"));
    } else {
        line(out, 1, &format!("{keyword} request({endpoint}, ["));
        for p in &stub.params {
            line(out, 2, &format!("[{}, {}],", quote(&p.key), p.encode));
        }
        line(out, 1, &format!("], {tag});"));
    }
    line(out, 0, "}");
}

const PRELUDE: &str = r#"/** Typed client for the HyperDbg HTTP export API. */

export let baseUrl = "http://127.0.0.1:8888/";
export let timeoutMs = 15_000;

export function setBaseUrl(url: string): void {
    baseUrl = url.endsWith("/") ? url : `${url}/`;
}

export function setTimeoutMs(ms: number): void {
    timeoutMs = ms;
}

/** The engine answered with a non-200 status. */
export class ServerError extends Error {
    constructor(
        readonly endpoint: string,
        readonly status: number,
        readonly body: string,
    ) {
        super(`${endpoint} returned ${status}: ${body}`);
        this.name = "ServerError";
    }
}

/** A response body did not match the declared return type. */
export class DecodeError extends Error {
    constructor(
        readonly raw: string,
        readonly tag: string,
        reason: string,
    ) {
        super(`cannot decode ${JSON.stringify(raw)} as ${tag}: ${reason}`);
        this.name = "DecodeError";
    }
}

/** No response could be read: refused connection, DNS failure, reset. */
export class TransportError extends Error {
    constructor(
        readonly endpoint: string,
        reason: string,
        options?: { cause?: unknown },
    ) {
        super(`${endpoint}: ${reason}`, options);
        this.name = "TransportError";
    }
}

/** The call did not complete within `timeoutMs`. */
export class TimeoutError extends TransportError {
    constructor(endpoint: string, options?: { cause?: unknown }) {
        super(endpoint, `timed out after ${timeoutMs} ms`, options);
        this.name = "TimeoutError";
    }
}

function transportError(endpoint: string, cause: unknown): TransportError {
    const aborted = cause instanceof DOMException
        && (cause.name === "TimeoutError" || cause.name === "AbortError");
    if (aborted) {
        return new TimeoutError(endpoint, { cause });
    }
    return new TransportError(endpoint, `transport error: ${String(cause)}`, { cause });
}

const strictUtf8 = new TextDecoder("utf-8", { fatal: true });
const lossyUtf8 = new TextDecoder("utf-8");

interface WireValues {
    bool: boolean;
    i8: number;
    i16: number;
    i32: number;
    i64: bigint;
    u8: number;
    u16: number;
    u32: number;
    u64: bigint;
    ptr: bigint;
    f32: number;
    f64: number;
    str: string;
    wstr: string;
    bytes: Uint8Array;
    strs: string[];
    void: void;
}

type WireTag = keyof WireValues;

const BITS: Partial<Record<WireTag, number>> = {
    i8: 8, i16: 16, i32: 32, i64: 64,
    u8: 8, u16: 16, u32: 32, u64: 64, ptr: 64,
};

function toHex(bytes: Uint8Array): string {
    return Array.from(bytes, (b) => b.toString(16).padStart(2, "0")).join("");
}

function jsonArg(value: object): string {
    return JSON.stringify(value, (_key, v) => (typeof v === "bigint" ? `__bigint__${v}` : v))
        .replace(/"__bigint__(-?\d+)"/g, "$1");
}

function parseInteger(text: string, tag: WireTag, bits: number): bigint {
    const width = BigInt(bits);
    const signed = tag.startsWith("i");
    if (/^0[xX][0-9a-fA-F]+$/.test(text)) {
        const value = BigInt(`0x${text.slice(2)}`);
        if (value >= 1n << width) {
            throw new DecodeError(text, tag, "out of range");
        }
        // two's complement of the declared width
        return signed ? BigInt.asIntN(bits, value) : value;
    }
    if (!(signed ? /^[+-]?\d+$/ : /^\d+$/).test(text)) {
        throw new DecodeError(text, tag, "not an integer");
    }
    const value = BigInt(text);
    const low = signed ? -(1n << (width - 1n)) : 0n;
    const high = signed ? (1n << (width - 1n)) - 1n : (1n << width) - 1n;
    if (value < low || value > high) {
        throw new DecodeError(text, tag, "out of range");
    }
    return value;
}

function parseFloating(text: string, tag: WireTag): number {
    if (/^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$/.test(text)) {
        return Number(text);
    }
    if (/^[+-]?inf(inity)?$/i.test(text)) {
        return text.startsWith("-") ? -Infinity : Infinity;
    }
    if (/^[+-]?nan$/i.test(text)) {
        return NaN;
    }
    throw new DecodeError(text, tag, "not a float");
}

function decode(text: string, tag: WireTag): unknown {
    const bits = BITS[tag];
    if (bits !== undefined) {
        const value = parseInteger(text, tag, bits);
        return bits === 64 ? value : Number(value);
    }
    switch (tag) {
        case "void":
            return undefined;
        case "bool": {
            const word = text.replace(/^0[xX]/, "").toLowerCase();
            if (word === "true") return true;
            if (word === "false") return false;
            throw new DecodeError(text, tag, "not a boolean");
        }
        case "f32":
        case "f64":
            return parseFloating(text, tag);
        case "str":
        case "wstr":
            return text;
        case "bytes": {
            const digits = text.replace(/^0[xX]/, "");
            if (!/^([0-9a-fA-F]{2})*$/.test(digits)) {
                throw new DecodeError(text, tag, "not an even-length hex string");
            }
            const out = new Uint8Array(digits.length / 2);
            for (let i = 0; i < out.length; i++) {
                out[i] = parseInt(digits.slice(2 * i, 2 * i + 2), 16);
            }
            return out;
        }
        case "strs":
            return text.split(/\s+/).filter((token) => token.length > 0);
    }
    throw new DecodeError(text, tag, "no decode rule");
}

async function request<K extends WireTag>(
    endpoint: string,
    params: [string, string][],
    tag: K,
): Promise<WireValues[K]> {
    const query = new URLSearchParams(params).toString();
    const url = baseUrl + endpoint + (query ? `?${query}` : "");
    let status: number;
    let raw: Uint8Array;
    try {
        const response = await fetch(url, { signal: AbortSignal.timeout(timeoutMs) });
        status = response.status;
        raw = new Uint8Array(await response.arrayBuffer());
    } catch (cause) {
        throw transportError(endpoint, cause);
    }
    if (status !== 200) {
        throw new ServerError(endpoint, status, lossyUtf8.decode(raw));
    }
    if (tag === "void") {
        return undefined as WireValues[K];
    }
    let body: string;
    try {
        body = strictUtf8.decode(raw);
    } catch {
        throw new DecodeError(lossyUtf8.decode(raw).trim(), tag, "body is not valid UTF-8");
    }
    return decode(body.trim(), tag) as WireValues[K];
}
"#;
