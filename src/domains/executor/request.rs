use reqwest::Method;
use serde_json::Value;

use crate::core::security::split_path;
use crate::domains::tools::{ToolError, ToolResult};

/// Request payload encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as a single JSON document.
    Json(Value),
    /// One compact JSON document per line (bulk endpoints).
    NdJson(Vec<Value>),
    /// Sent verbatim with the given content type (e.g. Jenkins XML).
    Text { content_type: String, content: String },
}

/// How the executor reads the response body before normalizing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFraming {
    /// The body is used as sent.
    #[default]
    Plain,
    /// Docker attach/logs stream: when the body is a sequence of 8-byte
    /// frame headers and payloads, only the payloads are kept.
    DockerStream,
}

/// One outbound call, relative to the configured base URL.
///
/// The final URL is `base / prefix / segments ? query`. Segments are kept
/// separate so each one is percent-encoded on its own and none of them can
/// rewrite the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// API version prefix, swapped by fallback chains.
    pub prefix: Vec<String>,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Extra headers for this call only.
    pub headers: Vec<(String, String)>,
    pub framing: ResponseFraming,
}

impl ApiRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            prefix: Vec::new(),
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            framing: ResponseFraming::Plain,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn put<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PUT, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// Set the version prefix, e.g. `"v1/beta"`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Append a caller-supplied relative path that may contain slashes.
    ///
    /// Rejects absolute URLs and `.`/`..` segments.
    pub fn append_path(mut self, field: &str, path: &str) -> ToolResult<Self> {
        let extra = split_path(path).map_err(|e| ToolError::validation(field, e.to_string()))?;
        self.segments.extend(extra);
        Ok(self)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query pair only when `value` is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn ndjson(mut self, lines: Vec<Value>) -> Self {
        self.body = Some(RequestBody::NdJson(lines));
        self
    }

    pub fn text(mut self, content_type: &str, content: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text {
            content_type: content_type.to_string(),
            content: content.into(),
        });
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn framing(mut self, framing: ResponseFraming) -> Self {
        self.framing = framing;
        self
    }

    /// `/prefix/segments` as it appears in logs, without encoding.
    pub fn path_display(&self) -> String {
        let mut path = String::new();
        for segment in self.prefix.iter().chain(&self.segments) {
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }
}

impl RequestBody {
    /// Encode an NDJSON body: one document per line, newline terminated.
    pub fn encode_ndjson(lines: &[Value]) -> ToolResult<String> {
        let mut out = String::new();
        for line in lines {
            let encoded = serde_json::to_string(line)
                .map_err(|e| ToolError::internal(format!("cannot encode NDJSON line: {e}")))?;
            out.push_str(&encoded);
            out.push('\n');
        }
        Ok(out)
    }
}

const FRAME_HEADER_LEN: usize = 8;

/// Strip Docker stream frame headers and join the payloads.
///
/// Each frame is `[stream, 0, 0, 0, len_be_u32]` followed by `len` bytes,
/// with `stream` one of stdin (0), stdout (1) or stderr (2). Returns `None`
/// when `raw` is not a complete sequence of such frames (TTY output).
pub fn demux_docker_stream(raw: &[u8]) -> Option<Vec<u8>> {
    let mut payload = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while !rest.is_empty() {
        let header = rest.get(..FRAME_HEADER_LEN)?;
        if header[0] > 2 || header[1..4] != [0, 0, 0] {
            return None;
        }
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let end = FRAME_HEADER_LEN.checked_add(len)?;
        payload.extend_from_slice(rest.get(FRAME_HEADER_LEN..end)?);
        rest = &rest[end..];
    }
    Some(payload)
}
