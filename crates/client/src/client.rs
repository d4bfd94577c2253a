use std::collections::HashSet;
use std::time::Duration;

use hdbg_schema::Endpoint;
use hdbg_wire::{
    FromWire, UnsupportedType, WireType, WireValue, body_text, decode, encode, parse_arg,
};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::{ClientConfig, normalize_base_url};
use crate::error::ClientError;

/// Raw command console of the engine.
pub const EXEC_COMMAND_ENDPOINT: &str = "ExecCommand";

/// Handle to one engine listener.
///
/// Holds no per-call state. Keep-alive is off, so each call opens a fresh
/// connection and a stalled engine never poisons later calls.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Client {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(|err| {
                warn!(error = %err, "Failed to build engine HTTP client.");
                ClientError::Config(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `endpoint` with pre-encoded `args` and decode the body as `ret`.
    ///
    /// Struct return types are rejected before any request is made.
    pub async fn dispatch(
        &self,
        endpoint: &str,
        args: &[(&str, String)],
        ret: &WireType,
    ) -> Result<WireValue, ClientError> {
        if ret.is_struct() {
            return Err(UnsupportedType(ret.clone()).into());
        }
        let body = self.send(endpoint, args).await?;
        Ok(decode(ret, body_text(ret, &body)?)?)
    }

    /// Typed form of [`Client::dispatch`]: `T` names the return wire type.
    pub async fn request<T: FromWire>(
        &self,
        endpoint: &str,
        args: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let body = self.send(endpoint, args).await?;
        Ok(T::from_wire(body_text(&T::wire_type(), &body)?)?)
    }

    /// Invoke a schema endpoint with textual arguments.
    ///
    /// Every declared parameter must be supplied exactly once and nothing
    /// else may be; violations are reported before anything is sent.
    pub async fn call_endpoint(
        &self,
        endpoint: &Endpoint,
        args: &[(&str, &str)],
    ) -> Result<WireValue, ClientError> {
        let encoded = encode_args(endpoint, args)?;
        self.dispatch(endpoint.wire_name(), &encoded, &endpoint.returns)
            .await
    }

    /// Run a raw debugger command and return its captured output.
    pub async fn exec_command(&self, command: &str) -> Result<String, ClientError> {
        self.request(EXEC_COMMAND_ENDPOINT, &[("command", command.to_string())])
            .await
    }

    /// The raw body of a 200 response. Other statuses become
    /// [`ClientError::Server`] with the body decoded lossily.
    async fn send(&self, endpoint: &str, args: &[(&str, String)]) -> Result<Vec<u8>, ClientError> {
        let url = build_url(&self.base_url, endpoint, args);
        debug!(%url, "Sending engine request.");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| self.transport_error(&url, err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(&url, err))?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(endpoint, %status, body = %body.trim(), "Engine returned an error status.");
            return Err(ClientError::Server {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        debug!(endpoint, %status, bytes = body.len(), "Received engine response.");
        Ok(body.to_vec())
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            debug!(error = %err, %url, "Engine request timed out.");
            ClientError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            debug!(error = %err, %url, "Engine request failed.");
            ClientError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// `<base><endpoint>`, plus a form-encoded query string when `args` is
/// non-empty. Pairs keep their given order.
pub fn build_url(base: &str, endpoint: &str, args: &[(&str, String)]) -> String {
    let mut url = format!("{base}{endpoint}");
    if !args.is_empty() {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in args {
            query.append_pair(key, value);
        }
        url.push('?');
        url.push_str(&query.finish());
    }
    url
}

fn encode_args<'a>(
    endpoint: &'a Endpoint,
    args: &[(&str, &str)],
) -> Result<Vec<(&'a str, String)>, ClientError> {
    let invalid = |reason: String| ClientError::InvalidArgument {
        endpoint: endpoint.name.clone(),
        reason,
    };

    let mut seen = HashSet::new();
    for (key, _) in args {
        if endpoint.get_param(key).is_none() {
            return Err(invalid(format!("unknown parameter {key:?}")));
        }
        if !seen.insert(*key) {
            return Err(invalid(format!("parameter {key:?} given more than once")));
        }
    }

    let mut encoded = Vec::with_capacity(endpoint.params.len());
    for param in &endpoint.params {
        let text = args
            .iter()
            .find(|(key, _)| *key == param.name)
            .map(|(_, value)| *value)
            .ok_or_else(|| invalid(format!("missing parameter {:?} ({})", param.name, param.ty)))?;
        let value = parse_arg(&param.ty, text)
            .map_err(|err| invalid(format!("parameter {:?}: {err}", param.name)))?;
        if let Some(wire) = encode(&value) {
            encoded.push((param.name.as_str(), wire));
        }
    }
    Ok(encoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use hdbg_schema::Schema;
    use hdbg_wire::{DecodeReason, ToWire};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> Client {
        let config = ClientConfig::new(&server.uri(), Duration::from_secs(5)).unwrap();
        Client::new(&config).unwrap()
    }

    #[test]
    fn test_build_url_without_args_has_no_query() {
        assert_eq!(
            build_url("http://127.0.0.1:8888/", "DebuggerGetKernelBase", &[]),
            "http://127.0.0.1:8888/DebuggerGetKernelBase"
        );
    }

    #[test]
    fn test_build_url_keeps_order_and_decimal_values() {
        let args = [
            ("address", 0x7FF6_A240_0000_u64.to_wire()),
            ("pid", 4096_u32.to_wire()),
            ("tid", 1_u32.to_wire()),
            ("core", 0_u32.to_wire()),
        ];
        assert_eq!(
            build_url("http://127.0.0.1:8888/", "SetBreakPoint", &args),
            "http://127.0.0.1:8888/SetBreakPoint?address=140699712380928&pid=4096&tid=1&core=0"
        );
    }

    #[test]
    fn test_build_url_escapes_strings() {
        let args = [("command", "r rax=0x10 & g".to_string())];
        assert_eq!(
            build_url("http://h/", "Interpreter", &args),
            "http://h/Interpreter?command=r+rax%3D0x10+%26+g"
        );
    }

    #[tokio::test]
    async fn test_set_break_point_sends_declared_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/SetBreakPoint"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let schema = Schema::hyperdbg();
        let ep = schema.endpoint("SetBreakPoint").unwrap();
        let value = client_for(&server)
            .await
            .call_endpoint(
                ep,
                &[
                    ("core_numer", "0"),
                    ("tid", "1"),
                    ("pid", "4096"),
                    ("address", "0x7FF6A2400000"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(value, WireValue::Void);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].url.query(),
            Some("address=140699712380928&pid=4096&tid=1&core_numer=0")
        );
    }

    #[tokio::test]
    async fn test_hex_body_decodes_to_integer() {
        let server = MockServer::start().await;
        Mock::given(path("/DebuggerGetKernelBase"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0x1000"))
            .mount(&server)
            .await;
        Mock::given(path("/LoadVmmModule"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0X1000\r\n"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let base: u64 = client.request("DebuggerGetKernelBase", &[]).await.unwrap();
        assert_eq!(base, 4096);
        let status = client
            .dispatch("LoadVmmModule", &[], &WireType::Int32)
            .await
            .unwrap();
        assert_eq!(status, WireValue::Int32(4096));
    }

    #[tokio::test]
    async fn test_padded_bool_body() {
        let server = MockServer::start().await;
        Mock::given(path("/VmxSupportDetection"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  false  "))
            .mount(&server)
            .await;

        let supported: bool = client_for(&server)
            .await
            .request("VmxSupportDetection", &[])
            .await
            .unwrap();
        assert!(!supported);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/VmxSupportDetection"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .request::<bool>("VmxSupportDetection", &[])
            .await
            .unwrap_err();
        match err {
            ClientError::Decode(err) => {
                assert_eq!(err.raw, "1");
                assert_eq!(err.reason, DecodeReason::BadBool);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/ExecCommand"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Genuine\xffIntel".to_vec()))
            .mount(&server)
            .await;
        Mock::given(path("/Pause"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe]))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.exec_command("cpu").await.unwrap_err();
        match err {
            ClientError::Decode(err) => {
                assert_eq!(err.reason, DecodeReason::InvalidUtf8);
                assert_eq!(err.raw, "Genuine\u{fffd}Intel");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = client
            .dispatch(EXEC_COMMAND_ENDPOINT, &[], &WireType::Utf8String)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "{err}");

        // Void bodies are never read as text.
        let value = client.dispatch("Pause", &[], &WireType::Void).await.unwrap();
        assert_eq!(value, WireValue::Void);
        client.request::<()>("Pause", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_200_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(path("/ExecCommand"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Missing command parameter"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.exec_command("").await.unwrap_err();
        match err {
            ClientError::Server { endpoint, status, body } => {
                assert_eq!(endpoint, "ExecCommand");
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "Missing command parameter");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_exec_command_returns_output() {
        let server = MockServer::start().await;
        Mock::given(path("/ExecCommand"))
            .and(query_param("command", "lm km"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("fffff800`00000000 nt\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = client_for(&server).await.exec_command("lm km").await.unwrap();
        assert_eq!(output, "fffff800`00000000 nt");
    }

    #[tokio::test]
    async fn test_struct_return_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .dispatch("ReadAllRegisters", &[], &WireType::StructByValue("GUEST_REGS".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(path("/Pause"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = ClientConfig::new(&server.uri(), Duration::from_millis(100)).unwrap();
        let err = Client::new(&config)
            .unwrap()
            .request::<()>("Pause", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_arguments_send_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let schema = Schema::hyperdbg();
        let ep = schema.endpoint("SetBreakPoint").unwrap();
        let client = client_for(&server).await;

        let missing = client.call_endpoint(ep, &[("address", "0x1000")]).await;
        assert!(matches!(missing, Err(ClientError::InvalidArgument { .. })));

        let unknown = client
            .call_endpoint(
                ep,
                &[
                    ("address", "1"),
                    ("pid", "1"),
                    ("tid", "1"),
                    ("core_numer", "0"),
                    ("core", "0"),
                ],
            )
            .await;
        assert!(matches!(unknown, Err(ClientError::InvalidArgument { .. })));

        let malformed = client
            .call_endpoint(
                ep,
                &[("address", "0xZZ"), ("pid", "1"), ("tid", "1"), ("core_numer", "0")],
            )
            .await;
        assert!(matches!(malformed, Err(ClientError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let config = ClientConfig::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        let err = Client::new(&config)
            .unwrap()
            .request::<bool>("VmxSupportDetection", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }), "{err}");
    }
}
