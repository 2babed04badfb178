//! MCP Server implementation and lifecycle management.
//!
//! The server handler owns the [`Dispatcher`] for the configured platform.
//! STDIO and TCP sessions reach it through the rmcp [`ToolRouter`] built in
//! `domains/tools/router.rs`; the HTTP transport calls
//! [`McpServer::list_tools`] and [`McpServer::call_tool`] directly.
//!
//! Adding a tool only touches the platform's catalog under
//! `domains/tools/definitions/`.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use crate::domains::tools::{Dispatcher, build_tool_router};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Validates and executes tool calls for the configured platform.
    dispatcher: Arc<Dispatcher>,

    /// Tool router for rmcp sessions.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server for the platform named in `config`.
    ///
    /// Fails when the HTTP client cannot be built or the catalog is inconsistent.
    pub fn new(config: Config) -> crate::core::Result<Self> {
        let config = Arc::new(config);
        let dispatcher = Arc::new(Dispatcher::from_config(&config.platform)?);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a server around an existing dispatcher.
    pub fn with_dispatcher(config: Arc<Config>, dispatcher: Arc<Dispatcher>) -> Self {
        info!(
            platform = %config.platform.platform,
            tools = dispatcher.registry().len(),
            "MCP server initialized"
        );
        Self {
            tool_router: build_tool_router::<Self>(dispatcher.clone()),
            config,
            dispatcher,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Short usage note sent to clients on initialize.
    pub fn instructions(&self) -> String {
        format!(
            "DevOps MCP server for {} at {}. Every tool validates its parameters before \
             calling the remote API; failures come back as tool errors with a structured \
             `error` object.",
            self.config.platform.platform,
            self.dispatcher.context().base_url
        )
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.dispatcher
            .registry()
            .get_all_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Tool failures are part of the returned result (`isError`), not an `Err`.
    #[cfg(feature = "http")]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> serde_json::Result<Value> {
        let result = self.dispatcher.call_tool(name, arguments).await;
        serde_json::to_value(result)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
