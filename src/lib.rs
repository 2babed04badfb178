//! DevOps MCP server.
//!
//! Exposes one DevOps platform's REST API (Jenkins, GitHub, GitLab, Nexus,
//! Docker Engine, Datadog or Elasticsearch) as a catalog of MCP tools. The
//! platform is chosen at startup with `MCP_PLATFORM`; every tool call is
//! validated against its parameter schema before a single outbound request
//! is made.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and
//!   the inbound transports
//! - **domains**
//!   - **executor**: outbound request model, reqwest executor, response
//!     normalization and API version fallback
//!   - **tools**: schemas, registry, dispatcher and per-platform catalogs
//!
//! # Example
//!
//! ```rust,no_run
//! use devops_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

pub use core::{Config, Error, McpServer, Result};
