use hdbg_wire::Language;

use super::{Backend, GENERATED_NOTICE, line, register_rows};
use crate::ir::{ModuleIR, StructIR, StubIR};
use crate::utils::{
    CSHARP_RESERVED_WORDS, capitalize_first, clean_identifier, lowercase_first, quote,
};

/// .NET 6+ file: a static `Engine` class of `Task`-returning methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpBackend;

fn escape_reserved(ident: String) -> String {
    if CSHARP_RESERVED_WORDS.contains(ident.as_str()) {
        format!("@{ident}")
    } else {
        ident
    }
}

impl Backend for CSharpBackend {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn file_name(&self) -> &'static str {
        "csharp/Sdk.cs"
    }

    fn stub_ident(&self, wire_name: &str) -> String {
        let name = capitalize_first(&clean_identifier(wire_name));
        // A member cannot share its enclosing type's name.
        if name == "Engine" {
            format!("{name}_")
        } else {
            escape_reserved(name)
        }
    }

    fn value_ident(&self, name: &str) -> String {
        escape_reserved(lowercase_first(&clean_identifier(name)))
    }

    fn field_ident(&self, name: &str) -> String {
        capitalize_first(&clean_identifier(name))
    }

    fn render(&self, module: &ModuleIR) -> String {
        let mut out = String::new();
        out.push_str(&format!("// {GENERATED_NOTICE}\n"));
        out.push_str(PRELUDE);

        for def in &module.structs {
            out.push('\n');
            render_class(&mut out, def);
        }

        out.push('\n');
        line(&mut out, 1, "/// <summary>Register names indexed by register id.</summary>");
        line(&mut out, 1, "public static class Registers");
        line(&mut out, 1, "{");
        line(&mut out, 2, "public static readonly string[] Names =");
        line(&mut out, 2, "{");
        for row in register_rows(&module.registers) {
            line(&mut out, 3, &format!("{row},"));
        }
        line(&mut out, 2, "};");
        line(&mut out, 1, "}");

        out.push('\n');
        line(&mut out, 1, "public static class Engine");
        line(&mut out, 1, "{");
        for (i, stub) in module.stubs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            render_stub(&mut out, stub);
        }
        line(&mut out, 1, "}");
        out.push_str("}\n");
        out
    }
}

fn property_default(ty: &str) -> &'static str {
    match ty {
        "string" => " = \"\";",
        "string[]" => " = Array.Empty<string>();",
        _ => "",
    }
}

fn render_class(out: &mut String, def: &StructIR) {
    line(out, 1, &format!("public sealed class {}", def.name));
    line(out, 1, "{");
    for field in &def.fields {
        if field.hex {
            line(out, 2, "/// <summary>Hex-encoded bytes.</summary>");
        }
        line(out, 2, &format!("[JsonPropertyName({})]", quote(&field.key)));
        line(
            out,
            2,
            &format!(
                "public {} {} {{ get; set; }}{}",
                field.ty,
                field.ident,
                property_default(&field.ty)
            ),
        );
    }
    line(out, 1, "}");
}

fn render_stub(out: &mut String, stub: &StubIR) {
    let params = stub
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.ident))
        .collect::<Vec<_>>()
        .join(", ");
    let endpoint = quote(&stub.endpoint);
    let (ret, call) = match &stub.returns.ty {
        None => ("Task".to_string(), format!("Transport.RequestVoidAsync({endpoint}, ")),
        Some(ty) => (
            format!("Task<{ty}>"),
            format!("Transport.RequestAsync<{ty}>({endpoint}, "),
        ),
    };
    let kind = match stub.returns.ty {
        None => String::new(),
        Some(_) => format!(", WireKind.{}", stub.returns.decode),
    };

    line(out, 2, &format!("/// <summary>Calls /{}.</summary>", stub.endpoint));
    line(out, 2, &format!("public static {ret} {}({params}) =>", stub.name));
    if stub.params.is_empty() {
        line(out, 3, &format!("{call}Array.Empty<(string, string)>(){kind});"));
        return;
    }
    line(out, 3, &format!("{call}new (string, string)[]"));
    line(out, 3, "{");
    for p in &stub.params {
        line(out, 4, &format!("({}, {}),", quote(&p.key), p.encode));
    }
    line(out, 3, &format!("}}{kind});"));
}

const PRELUDE: &str = r#"// Typed client for the HyperDbg HTTP export API.

#nullable enable

using System;
using System.Globalization;
using System.IO;
using System.Linq;
using System.Net.Http;
using System.Text;
using System.Text.Json;
using System.Text.Json.Serialization;
using System.Threading.Tasks;

namespace HyperDbg.Sdk
{
    public enum WireKind
    {
        Bool,
        Int8,
        Int16,
        Int32,
        Int64,
        UInt8,
        UInt16,
        UInt32,
        UInt64,
        Pointer,
        Float32,
        Float64,
        Utf8String,
        WideString,
        ByteBuffer,
        StringArray,
        Void,
    }

    /// <summary>The engine answered with a non-200 status.</summary>
    public sealed class ServerException : Exception
    {
        public ServerException(string endpoint, int status, string body)
            : base($"{endpoint} returned {status}: {body}")
        {
            Endpoint = endpoint;
            Status = status;
            Body = body;
        }

        public string Endpoint { get; }
        public int Status { get; }
        public string Body { get; }
    }

    /// <summary>A response body did not match the declared return type.</summary>
    public sealed class DecodeException : FormatException
    {
        public DecodeException(string raw, WireKind kind, string reason)
            : base($"cannot decode \"{raw}\" as {kind}: {reason}")
        {
            Raw = raw;
            Kind = kind;
        }

        public string Raw { get; }
        public WireKind Kind { get; }
    }

    /// <summary>No response could be read from the engine.</summary>
    public class TransportException : Exception
    {
        public TransportException(string endpoint, string message, Exception inner)
            : base($"{endpoint}: {message}", inner)
        {
            Endpoint = endpoint;
        }

        public string Endpoint { get; }
    }

    /// <summary>The call did not complete within <see cref="Transport.Timeout"/>.</summary>
    public sealed class RequestTimeoutException : TransportException
    {
        public RequestTimeoutException(string endpoint, TimeSpan timeout, Exception inner)
            : base(endpoint, $"timed out after {timeout.TotalSeconds} s", inner)
        {
            Timeout = timeout;
        }

        public TimeSpan Timeout { get; }
    }

    public static class Transport
    {
        public static string BaseUrl { get; set; } = "http://127.0.0.1:8888/";

        public static TimeSpan Timeout => Http.Timeout;

        private static readonly HttpClient Http =
            new HttpClient(new HttpClientHandler { UseProxy = false })
            {
                Timeout = TimeSpan.FromSeconds(15),
                DefaultRequestHeaders = { ConnectionClose = true },
            };

        private static readonly UTF8Encoding StrictUtf8 = new UTF8Encoding(false, true);

        public static async Task<T> RequestAsync<T>(
            string endpoint,
            (string, string)[] args,
            WireKind kind)
        {
            var raw = await SendAsync(endpoint, args).ConfigureAwait(false);
            string body;
            try
            {
                body = StrictUtf8.GetString(raw);
            }
            catch (DecoderFallbackException)
            {
                var lossy = Encoding.UTF8.GetString(raw).Trim();
                throw new DecodeException(lossy, kind, "body is not valid UTF-8");
            }
            return (T)Decode(body.Trim(), kind);
        }

        public static async Task RequestVoidAsync(string endpoint, (string, string)[] args)
        {
            await SendAsync(endpoint, args).ConfigureAwait(false);
        }

        private static async Task<byte[]> SendAsync(
            string endpoint,
            (string Key, string Value)[] args)
        {
            var url = BaseUrl + endpoint;
            if (args.Length > 0)
            {
                url += "?" + string.Join("&", args.Select(a =>
                    Uri.EscapeDataString(a.Key) + "=" + Uri.EscapeDataString(a.Value)));
            }
            try
            {
                using var response = await Http.GetAsync(url).ConfigureAwait(false);
                var raw = await response.Content.ReadAsByteArrayAsync().ConfigureAwait(false);
                var status = (int)response.StatusCode;
                if (status != 200)
                {
                    throw new ServerException(endpoint, status, Encoding.UTF8.GetString(raw));
                }
                return raw;
            }
            catch (TaskCanceledException ex)
            {
                throw new RequestTimeoutException(endpoint, Http.Timeout, ex);
            }
            catch (HttpRequestException ex)
            {
                throw new TransportException(endpoint, ex.Message, ex);
            }
            catch (IOException ex)
            {
                throw new TransportException(endpoint, ex.Message, ex);
            }
        }

        internal static object Decode(string text, WireKind kind) => kind switch
        {
            WireKind.Bool => (object)ParseBool(text, kind),
            WireKind.Int8 => (object)(sbyte)ParseSigned(text, 8, kind),
            WireKind.Int16 => (object)(short)ParseSigned(text, 16, kind),
            WireKind.Int32 => (object)(int)ParseSigned(text, 32, kind),
            WireKind.Int64 => (object)ParseSigned(text, 64, kind),
            WireKind.UInt8 => (object)(byte)ParseUnsigned(text, 8, kind),
            WireKind.UInt16 => (object)(ushort)ParseUnsigned(text, 16, kind),
            WireKind.UInt32 => (object)(uint)ParseUnsigned(text, 32, kind),
            WireKind.UInt64 or WireKind.Pointer => (object)ParseUnsigned(text, 64, kind),
            WireKind.Float32 => (object)(float)ParseFloat(text, kind),
            WireKind.Float64 => (object)ParseFloat(text, kind),
            WireKind.Utf8String or WireKind.WideString => text,
            WireKind.ByteBuffer => ParseHex(text, kind),
            WireKind.StringArray =>
                text.Split((char[]?)null, StringSplitOptions.RemoveEmptyEntries),
            _ => throw new DecodeException(text, kind, "no decode rule"),
        };

        private static bool HasHexPrefix(string text) =>
            text.StartsWith("0x", StringComparison.OrdinalIgnoreCase);

        private static ulong ParseUnsigned(string text, int bits, WireKind kind)
        {
            ulong value = 0;
            var inv = CultureInfo.InvariantCulture;
            var hex = NumberStyles.AllowHexSpecifier;
            var ok = HasHexPrefix(text)
                ? text.Length > 2 && ulong.TryParse(text.AsSpan(2), hex, inv, out value)
                : ulong.TryParse(text, NumberStyles.None, inv, out value);
            if (!ok || (bits < 64 && value >> bits != 0))
            {
                throw new DecodeException(text, kind, "not a valid unsigned integer");
            }
            return value;
        }

        // Hex text is the two's complement bit pattern of the declared width.
        private static long ParseSigned(string text, int bits, WireKind kind)
        {
            if (HasHexPrefix(text))
            {
                var shift = 64 - bits;
                return (long)(ParseUnsigned(text, bits, kind) << shift) >> shift;
            }
            long value = 0;
            var min = bits == 64 ? long.MinValue : -(1L << (bits - 1));
            var max = bits == 64 ? long.MaxValue : (1L << (bits - 1)) - 1;
            var parsed = long.TryParse(
                text, NumberStyles.AllowLeadingSign, CultureInfo.InvariantCulture, out value);
            if (!parsed || value < min || value > max)
            {
                throw new DecodeException(text, kind, "not a valid signed integer");
            }
            return value;
        }

        private static double ParseFloat(string text, WireKind kind)
        {
            var magnitude = text.TrimStart('+', '-');
            var negative = text.StartsWith("-", StringComparison.Ordinal);
            var ignoreCase = StringComparison.OrdinalIgnoreCase;
            if (magnitude.Equals("inf", ignoreCase) || magnitude.Equals("infinity", ignoreCase))
            {
                return negative ? double.NegativeInfinity : double.PositiveInfinity;
            }
            if (magnitude.Equals("nan", ignoreCase))
            {
                return double.NaN;
            }
            var styles = NumberStyles.AllowLeadingSign
                | NumberStyles.AllowDecimalPoint
                | NumberStyles.AllowExponent;
            if (!double.TryParse(text, styles, CultureInfo.InvariantCulture, out var value))
            {
                throw new DecodeException(text, kind, "not a float");
            }
            return value;
        }

        private static bool ParseBool(string text, WireKind kind)
        {
            var word = HasHexPrefix(text) ? text.Substring(2) : text;
            if (word.Equals("true", StringComparison.OrdinalIgnoreCase))
            {
                return true;
            }
            if (word.Equals("false", StringComparison.OrdinalIgnoreCase))
            {
                return false;
            }
            throw new DecodeException(text, kind, "not a boolean");
        }

        private static byte[] ParseHex(string text, WireKind kind)
        {
            var digits = HasHexPrefix(text) ? text.Substring(2) : text;
            try
            {
                return Convert.FromHexString(digits);
            }
            catch (FormatException)
            {
                throw new DecodeException(text, kind, "not an even-length hex string");
            }
        }
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
        emit(&Schema::hyperdbg(), &Ontology::standard(), Language::CSharp).unwrap()
    }

    #[test]
    fn test_void_stub() {
        let src = generated();
        assert!(src.contains(
            "        public static Task SetBreakPoint(\
             ulong address, uint pid, uint tid, uint core_numer) =>\n\
             \x20           Transport.RequestVoidAsync(\"SetBreakPoint\", new (string, string)[]\n\
             \x20           {\n\
             \x20               (\"address\", address.ToString(CultureInfo.InvariantCulture)),\n"
        ));
    }

    #[test]
    fn test_value_stub_without_params() {
        let src = generated();
        assert!(src.contains(
            "public static Task<ulong> DebuggerGetKernelBase() =>\n\
             \x20           Transport.RequestAsync<ulong>(\"DebuggerGetKernelBase\", \
             Array.Empty<(string, string)>(), WireKind.UInt64);\n"
        ));
    }

    #[test]
    fn test_classes_use_json_property_names() {
        let src = generated();
        assert!(src.contains(
            "        [JsonPropertyName(\"rax\")]\n        public ulong Rax { get; set; }\n"
        ));
        assert!(src.contains("public string LlLhData { get; set; } = \"\";"));
        assert!(src.contains("(\"io_apic\", JsonSerializer.Serialize(io_apic)),"));
    }

    #[test]
    fn test_reserved_words_are_verbatim() {
        let backend = CSharpBackend;
        assert_eq!(backend.value_ident("string"), "@string");
        assert_eq!(backend.stub_ident("Continue"), "Continue");
        assert_eq!(backend.stub_ident("Engine"), "Engine_");
    }

    #[test]
    fn test_transport_failures_are_typed() {
        let src = generated();
        assert!(src.contains("public class TransportException : Exception"));
        assert!(src.contains("public sealed class RequestTimeoutException : TransportException"));
        assert!(src.contains(
            "catch (TaskCanceledException ex)\n            {\n                \
             throw new RequestTimeoutException(endpoint, Http.Timeout, ex);"
        ));
        assert!(src.contains("catch (HttpRequestException ex)"));
    }

    #[test]
    fn test_success_body_is_decoded_strictly() {
        let src = generated();
        assert!(src.contains("new UTF8Encoding(false, true)"));
        assert!(src.contains("catch (DecoderFallbackException)"));
        assert!(!src.contains("ReadAsStringAsync"));
    }

    #[test]
    fn test_namespace_is_closed() {
        let src = generated();
        assert!(src.trim_end().ends_with("    }\n}"));
        assert_eq!(src.matches('{').count(), src.matches('}').count());
    }
}
