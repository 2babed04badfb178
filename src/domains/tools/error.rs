//! Tool-specific error types.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Result type for everything that happens during one tool call.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during a tool call.
///
/// All of these are recoverable: they are reported to the caller and the
/// server keeps serving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A parameter failed validation. Raised before any outbound request.
    #[error("Invalid parameter '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// The remote API answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, TLS, refused, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, serializable name of a [`ToolError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    ValidationError,
    HttpError,
    TransportError,
    InternalError,
}

impl ToolError {
    /// Create a new "validation" error for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "http" error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new "transport" error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Http { .. } => ErrorKind::HttpError,
            Self::Transport(_) => ErrorKind::TransportError,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Remote HTTP status, when the remote answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The offending parameter, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// True for a remote 404, the only status that advances a version fallback chain.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Label the error with the step of a multi-call tool that produced it.
    pub fn in_step(self, step: &str) -> Self {
        match self {
            Self::Http { status, message } => Self::Http {
                status,
                message: format!("{step}: {message}"),
            },
            Self::Transport(msg) => Self::Transport(format!("{step}: {msg}")),
            Self::Internal(msg) => Self::Internal(format!("{step}: {msg}")),
            other => other,
        }
    }

    /// Human readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::UnknownTool(name) => format!("Unknown tool: {name}"),
            Self::Validation { reason, .. } => reason.clone(),
            Self::Http { message, .. } => message.clone(),
            Self::Transport(msg) | Self::Internal(msg) => msg.clone(),
        }
    }

    /// Structured form sent back to the caller.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "kind": self.kind(),
            "message": self.message(),
        });
        if let Some(status) = self.status() {
            body["status"] = json!(status);
        }
        if let Some(field) = self.field() {
            body["field"] = json!(field);
        }
        body
    }
}
