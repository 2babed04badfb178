//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Used by the STDIO and TCP transports. Every route forwards to the shared
//! [`Dispatcher`], so validation and error rendering are identical to the
//! HTTP transport.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
};
use serde_json::Value;
use tracing::info;

use super::dispatch::Dispatcher;

/// Build the tool router with one route per registered tool.
///
/// A route races the dispatch against the request's cancellation token.
/// When the client cancels, the dispatch future is dropped, which aborts the
/// in-flight outbound request.
pub fn build_tool_router<S>(dispatcher: Arc<Dispatcher>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    dispatcher
        .registry()
        .tool_names()
        .into_iter()
        .filter_map(|name| dispatcher.registry().get(name))
        .fold(ToolRouter::new(), |router, descriptor| {
            let name = descriptor.name;
            let dispatcher = dispatcher.clone();
            router.with_route(ToolRoute::new_dyn(
                descriptor.to_tool(),
                move |ctx: ToolCallContext<'_, S>| {
                    let args = ctx.arguments.clone().unwrap_or_default();
                    let ct = ctx.request_context.ct.clone();
                    let dispatcher = dispatcher.clone();
                    async move {
                        tokio::select! {
                            _ = ct.cancelled() => {
                                info!(tool = name, "Tool call cancelled");
                                Err(McpError::internal_error("request cancelled", None))
                            }
                            result = dispatcher.call_tool(name, Value::Object(args)) => Ok(result),
                        }
                    }
                    .boxed()
                },
            ))
        })
}
