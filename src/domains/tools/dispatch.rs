//! Dispatch front-end: name lookup, validation, handler invocation and
//! result serialization. Every transport funnels tool calls through here.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::error::{ToolError, ToolResult};
use super::handlers::ToolCall;
use super::registry::ToolRegistry;
use crate::core::config::PlatformConfig;
use crate::domains::executor::{CallContext, HttpExecutor, RequestExecutor};

/// Shared, read-only dispatcher. Cheap to clone behind an `Arc`.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    context: Arc<CallContext>,
    executor: Arc<dyn RequestExecutor>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        context: Arc<CallContext>,
        executor: Arc<dyn RequestExecutor>,
    ) -> Self {
        Self {
            registry,
            context,
            executor,
        }
    }

    /// Wire the registry, context and HTTP executor for the configured platform.
    pub fn from_config(config: &PlatformConfig) -> crate::core::Result<Self> {
        let context = Arc::new(CallContext::from_config(config)?);
        let executor = Arc::new(HttpExecutor::new(context.clone())?);
        let registry = Arc::new(ToolRegistry::for_platform(config.platform)?);

        info!(
            platform = %config.platform,
            base_url = %context.base_url,
            auth = config.credentials.scheme(),
            tools = registry.len(),
            "Dispatcher ready"
        );

        Ok(Self::new(registry, context, executor))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Look up `name`, validate `arguments`, run the handler.
    ///
    /// Validation always completes before the handler is entered, so an
    /// invalid call never produces outbound traffic.
    #[instrument(skip(self, arguments), fields(platform = %self.context.platform))]
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolResult<Value> {
        let Some(descriptor) = self.registry.get(name) else {
            warn!("Unknown tool requested");
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let params = descriptor.schema.validate(arguments)?;
        debug!("Parameters validated");

        let call = ToolCall::new(&params, &self.context, self.executor.as_ref());
        (descriptor.handler)(call).await
    }

    /// [`dispatch`](Self::dispatch) rendered as an MCP tool result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let result = self.dispatch(name, arguments).await;
        if let Err(e) = &result {
            info!(tool = name, kind = ?e.kind(), status = ?e.status(), "Tool call failed: {}", e);
        }
        to_call_tool_result(result)
    }
}

/// Serialize a handler outcome.
///
/// Success: the payload as pretty JSON text (strings verbatim), plus
/// structured content when the payload is an object. Failure: the error
/// message as text, `{"error": {...}}` as structured content, `isError`.
pub fn to_call_tool_result(result: ToolResult<Value>) -> CallToolResult {
    match result {
        Ok(payload) => {
            let text = match &payload {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
            };
            let mut out = CallToolResult::success(vec![Content::text(text)]);
            if payload.is_object() {
                out.structured_content = Some(payload);
            }
            out
        }
        Err(e) => {
            let mut out = CallToolResult::error(vec![Content::text(e.to_string())]);
            out.structured_content = Some(json!({ "error": e.to_json() }));
            out
        }
    }
}
