use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::RequestExecutor;
use super::context::CallContext;
use super::request::{ApiRequest, RequestBody, ResponseFraming, demux_docker_stream};
use crate::core::config::Credentials;
use crate::core::security::join_endpoint;
use crate::domains::tools::{ToolError, ToolResult};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed executor. One shared connection pool per process.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    context: Arc<CallContext>,
}

impl HttpExecutor {
    pub fn new(context: Arc<CallContext>) -> crate::core::Result<Self> {
        let client = Client::builder()
            .timeout(context.timeout)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!context.verify_ssl)
            .build()
            .map_err(|e| {
                crate::core::Error::internal(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, context })
    }

    /// Resolve the absolute URL for `request` against the configured base.
    pub fn build_url(&self, request: &ApiRequest) -> ToolResult<Url> {
        let mut url = join_endpoint(&self.context.base_url, &request.prefix, &request.segments)
            .map_err(|e| ToolError::validation("path", e.to_string()))?;

        if !request.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&request.query)
                .map_err(|e| ToolError::internal(format!("cannot encode query: {e}")))?;
            url.set_query(Some(&encoded));
        }
        Ok(url)
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    #[instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path_display())
    )]
    async fn execute(&self, request: &ApiRequest) -> ToolResult<Value> {
        let url = self.build_url(request)?;
        let mut builder = self.client.request(request.method.clone(), url);

        builder = match &self.context.credentials {
            Credentials::None => builder,
            Credentials::Bearer { token } => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credentials::Headers { headers } => headers
                .iter()
                .fold(builder, |b, (name, value)| b.header(name, value)),
        };

        for (name, value) in self.context.default_headers.iter().chain(&request.headers) {
            builder = builder.header(name, value);
        }

        builder = match &request.body {
            None => builder,
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::NdJson(lines)) => builder
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(RequestBody::encode_ndjson(lines)?),
            Some(RequestBody::Text {
                content_type,
                content,
            }) => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(content.clone()),
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = response.bytes().await.map_err(transport_error)?;
        let body = decode_body(request.framing, &raw);

        debug!(status = status.as_u16(), bytes = raw.len(), "Response received");
        normalize_response(status, content_type.as_deref(), &body)
    }
}

/// Response bytes as text, with stream framing removed when the request
/// asked for it and the body is actually framed.
fn decode_body(framing: ResponseFraming, raw: &[u8]) -> String {
    let payload = match framing {
        ResponseFraming::DockerStream => demux_docker_stream(raw),
        ResponseFraming::Plain => None,
    };
    match payload {
        Some(payload) => String::from_utf8_lossy(&payload).into_owned(),
        None => String::from_utf8_lossy(raw).into_owned(),
    }
}

fn transport_error(e: reqwest::Error) -> ToolError {
    if e.is_timeout() {
        ToolError::transport("Request timed out")
    } else if e.is_connect() {
        ToolError::transport(format!("Connection failed: {e}"))
    } else {
        ToolError::transport(e.to_string())
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Turn a raw response into the tool payload or an [`ToolError::Http`].
///
/// Empty bodies and 204 become `null`. JSON content types are parsed;
/// a body that claims JSON but does not parse is kept as text.
pub fn normalize_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> ToolResult<Value> {
    let payload = if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        Value::Null
    } else if is_json(content_type) {
        match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Response declared JSON but did not parse");
                Value::String(body.to_string())
            }
        }
    } else {
        Value::String(body.to_string())
    };

    if status.is_success() {
        return Ok(payload);
    }

    let message = error_message(&payload)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(ToolError::http(status.as_u16(), message))
}

/// Best human-readable message from an error payload.
fn error_message(payload: &Value) -> Option<String> {
    let text = |v: &Value| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string);

    match payload {
        Value::String(raw) => Some(raw.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => map
            .get("message")
            .and_then(text)
            .or_else(|| map.get("error").and_then(|e| e.get("reason")).and_then(text))
            .or_else(|| map.get("error").and_then(text))
            .or_else(|| {
                let first = map.get("errors").and_then(|e| e.get(0))?;
                first.get("message").and_then(text).or_else(|| text(first))
            })
            .or_else(|| map.get("error_message").and_then(text))
            .or_else(|| Some(payload.to_string())),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::core::config::Platform;
    use crate::domains::executor::stub::{self, response};

    fn executor(base: &str) -> HttpExecutor {
        HttpExecutor::new(Arc::new(CallContext::for_tests(Platform::Jenkins, base))).unwrap()
    }

    fn executor_with(base: &str, credentials: Credentials) -> HttpExecutor {
        let mut context = CallContext::for_tests(Platform::Jenkins, base);
        context.credentials = credentials;
        HttpExecutor::new(Arc::new(context)).unwrap()
    }

    #[test]
    fn test_build_url_encodes_segments_and_query() {
        let exec = executor("https://ci.example.com/jenkins");
        let req = ApiRequest::get(["job", "release build", "api", "json"])
            .query("tree", "builds[number,result]");
        let url = exec.build_url(&req).unwrap();
        assert_eq!(url.host_str(), Some("ci.example.com"));
        assert_eq!(url.path(), "/jenkins/job/release%20build/api/json");
        assert_eq!(url.query(), Some("tree=builds%5Bnumber%2Cresult%5D"));
    }

    #[test]
    fn test_build_url_rejects_traversal_segment() {
        let exec = executor("https://ci.example.com");
        let err = exec.build_url(&ApiRequest::get(["job", ".."])).unwrap_err();
        assert_eq!(err.field(), Some("path"));
    }

    #[test]
    fn test_normalize_success_json() {
        let value = normalize_response(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            r#"{"jobs":[]}"#,
        )
        .unwrap();
        assert_eq!(value, json!({"jobs": []}));
    }

    #[test]
    fn test_normalize_empty_and_no_content() {
        assert_eq!(
            normalize_response(StatusCode::NO_CONTENT, None, "").unwrap(),
            Value::Null
        );
        assert_eq!(
            normalize_response(StatusCode::CREATED, Some("application/json"), "  ").unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_normalize_text_body() {
        let value =
            normalize_response(StatusCode::OK, Some("text/plain"), "Started by user").unwrap();
        assert_eq!(value, json!("Started by user"));
    }

    #[test]
    fn test_normalize_invalid_json_falls_back_to_text() {
        let value =
            normalize_response(StatusCode::OK, Some("application/json"), "<html>").unwrap();
        assert_eq!(value, json!("<html>"));
    }

    #[test]
    fn test_error_message_extraction_order() {
        let err = normalize_response(
            StatusCode::NOT_FOUND,
            Some("application/json"),
            r#"{"message":"Not Found","documentation_url":"x"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ToolError::http(404, "Not Found"));

        let err = normalize_response(
            StatusCode::BAD_REQUEST,
            Some("application/json"),
            r#"{"error":{"type":"x","reason":"index exists"},"status":400}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "index exists");

        let err = normalize_response(
            StatusCode::FORBIDDEN,
            Some("application/json"),
            r#"{"errors":["Forbidden"]}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "Forbidden");

        let err = normalize_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("application/vnd.api+json"),
            r#"{"errors":[{"message":"name taken"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "name taken");
    }

    #[test]
    fn test_error_falls_back_to_reason_phrase() {
        let err = normalize_response(StatusCode::SERVICE_UNAVAILABLE, None, "").unwrap_err();
        assert_eq!(err, ToolError::http(503, "Service Unavailable"));

        let err = normalize_response(StatusCode::UNAUTHORIZED, Some("text/html"), "Bad creds")
            .unwrap_err();
        assert_eq!(err, ToolError::http(401, "Bad creds"));
    }

    #[tokio::test]
    async fn test_execute_bearer_auth_with_json_body() {
        let reply = response("201 Created", Some("application/json"), br#"{"id":42}"#);
        let (base, captured) = stub::serve_once(reply).await;
        let exec = executor_with(
            &format!("{base}/api/v4"),
            Credentials::Bearer {
                token: "glpat-secret".to_string(),
            },
        );

        let request = ApiRequest::post(["projects"]).json(json!({"name": "svc"}));
        let value = exec.execute(&request).await.unwrap();
        assert_eq!(value, json!({"id": 42}));

        let seen = captured.await.unwrap();
        assert_eq!(seen.request_line(), "POST /api/v4/projects HTTP/1.1");
        assert_eq!(seen.headers("authorization"), vec!["Bearer glpat-secret"]);
        assert_eq!(seen.header("content-type"), Some("application/json"));
        let sent: Value = serde_json::from_slice(&seen.body).unwrap();
        assert_eq!(sent, json!({"name": "svc"}));
    }

    #[tokio::test]
    async fn test_execute_basic_auth_get_without_body() {
        let reply = response("200 OK", Some("application/json"), br#"{"jobs":[]}"#);
        let (base, captured) = stub::serve_once(reply).await;
        let exec = executor_with(
            &base,
            Credentials::Basic {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
        );

        let request = ApiRequest::get(["api", "json"]).query("tree", "jobs[name]");
        assert_eq!(exec.execute(&request).await.unwrap(), json!({"jobs": []}));

        let seen = captured.await.unwrap();
        assert_eq!(seen.request_line(), "GET /api/json?tree=jobs%5Bname%5D HTTP/1.1");
        assert_eq!(seen.headers("authorization"), vec!["Basic dXNlcjpwYXNz"]);
        assert_eq!(seen.header("accept"), Some("application/json"));
        assert_eq!(seen.header("content-type"), None);
        assert!(seen.body.is_empty());
    }

    #[tokio::test]
    async fn test_execute_header_auth_sends_no_authorization() {
        let (base, captured) = stub::serve_once(response("200 OK", None, b"")).await;
        let exec = executor_with(
            &base,
            Credentials::Headers {
                headers: vec![
                    ("DD-API-KEY".to_string(), "api-key".to_string()),
                    ("DD-APPLICATION-KEY".to_string(), "app-key".to_string()),
                ],
            },
        );

        exec.execute(&ApiRequest::get(["api", "v1", "validate"])).await.unwrap();

        let seen = captured.await.unwrap();
        assert_eq!(seen.headers("dd-api-key"), vec!["api-key"]);
        assert_eq!(seen.headers("dd-application-key"), vec!["app-key"]);
        assert!(seen.headers("authorization").is_empty());
    }

    #[tokio::test]
    async fn test_execute_ndjson_body() {
        let (base, captured) = stub::serve_once(response("200 OK", None, b"")).await;
        let exec = executor(&base);

        let request = ApiRequest::post(["_bulk"])
            .ndjson(vec![json!({"index": {"_index": "logs"}}), json!({"msg": "hi"})]);
        exec.execute(&request).await.unwrap();

        let seen = captured.await.unwrap();
        assert_eq!(seen.header("content-type"), Some("application/x-ndjson"));
        assert_eq!(
            seen.body_text(),
            "{\"index\":{\"_index\":\"logs\"}}\n{\"msg\":\"hi\"}\n"
        );
    }

    #[tokio::test]
    async fn test_execute_text_body_keeps_content_type() {
        let (base, captured) = stub::serve_once(response("200 OK", None, b"")).await;
        let exec = executor(&base);

        let request = ApiRequest::post(["createItem"])
            .query("name", "deploy")
            .text("application/xml", "<project/>");
        exec.execute(&request).await.unwrap();

        let seen = captured.await.unwrap();
        assert_eq!(seen.request_line(), "POST /createItem?name=deploy HTTP/1.1");
        assert_eq!(seen.headers("content-type"), vec!["application/xml"]);
        assert_eq!(seen.body_text(), "<project/>");
    }

    #[tokio::test]
    async fn test_execute_empty_success_is_null() {
        let reply = response("200 OK", Some("application/json"), b"");
        let (base, _captured) = stub::serve_once(reply).await;
        let value = executor(&base).execute(&ApiRequest::post(["build"])).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_execute_maps_error_status() {
        let reply = response("404 Not Found", Some("application/json"), br#"{"message":"nope"}"#);
        let (base, _captured) = stub::serve_once(reply).await;
        let err = executor(&base).execute(&ApiRequest::get(["missing"])).await.unwrap_err();
        assert_eq!(err, ToolError::http(404, "nope"));
    }

    #[tokio::test]
    async fn test_execute_connection_refused_is_transport_error() {
        let err = executor("http://127.0.0.1:1")
            .execute(&ApiRequest::get(["api", "json"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_execute_timeout_is_transport_error() {
        let base = stub::stall(Duration::from_secs(5)).await;
        let mut context = CallContext::for_tests(Platform::Jenkins, &base);
        context.timeout = Duration::from_secs(1);
        let exec = HttpExecutor::new(Arc::new(context)).unwrap();

        let err = exec.execute(&ApiRequest::get(["api", "json"])).await.unwrap_err();
        assert_eq!(err, ToolError::transport("Request timed out"));
    }

    #[tokio::test]
    async fn test_execute_docker_stream_strips_frame_headers() {
        let reply = response(
            "200 OK",
            Some("application/vnd.docker.multiplexed-stream"),
            b"\x01\0\0\0\0\0\0\x06hello\n",
        );
        let (base, _captured) = stub::serve_once(reply).await;
        let request = ApiRequest::get(["containers", "web", "logs"])
            .framing(ResponseFraming::DockerStream);
        let value = executor(&base).execute(&request).await.unwrap();
        assert_eq!(value, json!("hello\n"));
    }

    #[test]
    fn test_decode_body_leaves_plain_and_tty_output() {
        let framed = b"\x01\0\0\0\0\0\0\x03ok\n";
        assert_eq!(decode_body(ResponseFraming::Plain, framed).len(), framed.len());
        assert_eq!(decode_body(ResponseFraming::DockerStream, b"tty line\n"), "tty line\n");
    }
}
