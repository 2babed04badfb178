//! Tool handler plumbing.
//!
//! A handler is a plain function from a [`ToolCall`] to a boxed future. It
//! receives parameters that already passed schema validation, the shared
//! read-only [`CallContext`] and the executor it must use for every
//! outbound request.

use futures::future::BoxFuture;
use serde_json::Value;

use super::error::ToolResult;
use super::schema::Params;
use crate::domains::executor::{
    ApiRequest, CallContext, RequestExecutor, VersionChain, execute_versioned,
};

/// Everything one handler invocation may touch.
#[derive(Clone, Copy)]
pub struct ToolCall<'a> {
    pub params: &'a Params,
    pub context: &'a CallContext,
    pub executor: &'a dyn RequestExecutor,
}

/// Signature shared by every tool handler.
pub type Handler = for<'a> fn(ToolCall<'a>) -> BoxFuture<'a, ToolResult<Value>>;

impl<'a> ToolCall<'a> {
    pub fn new(
        params: &'a Params,
        context: &'a CallContext,
        executor: &'a dyn RequestExecutor,
    ) -> Self {
        Self {
            params,
            context,
            executor,
        }
    }

    /// One outbound call.
    pub async fn send(&self, request: ApiRequest) -> ToolResult<Value> {
        self.executor.execute(&request).await
    }

    /// One logical call tried under each prefix of `chain`.
    pub async fn send_versioned(
        &self,
        request: ApiRequest,
        chain: &VersionChain,
    ) -> ToolResult<Value> {
        execute_versioned(self.executor, &request, chain).await
    }
}
