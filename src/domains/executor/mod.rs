//! Request executor domain.
//!
//! Everything between a tool handler and the remote platform API lives
//! here: the immutable [`CallContext`] built once from configuration, the
//! [`ApiRequest`] a handler describes, and the [`RequestExecutor`] that turns
//! it into one authenticated HTTP call and a normalized result.
//!
//! ## Architecture
//!
//! - `context.rs` - Base URL, credentials and timeout shared by every call
//! - `request.rs` - Method, path segments, query, body and headers of one call
//! - `http.rs` - reqwest-backed executor and response normalization
//! - `fallback.rs` - Ordered API-version prefixes retried on 404
//! - `stub.rs` - One-shot loopback HTTP server for executor tests

mod context;
mod fallback;
mod http;
mod request;

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;
use serde_json::Value;

use crate::domains::tools::ToolResult;

pub use context::CallContext;
pub use fallback::{VersionChain, execute_versioned};
pub use http::{HttpExecutor, normalize_response};
pub use request::{ApiRequest, RequestBody, ResponseFraming, demux_docker_stream};

/// Performs one outbound call per [`ApiRequest`].
///
/// Implementations make exactly one attempt. `Ok` carries the parsed
/// payload (`Value::Null` for empty bodies); `Err` is an HTTP, transport or
/// path error. Nothing is retried here.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> ToolResult<Value>;
}
