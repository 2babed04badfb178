//! Tools domain module.
//!
//! Tools are the functions MCP clients call. Each one is a [`ToolDescriptor`]:
//! a name, a declarative parameter schema and a handler that turns validated
//! parameters into one or more outbound API requests.
//!
//! ## Architecture
//!
//! - `definitions/` - Per-platform tool catalogs (one file per platform)
//! - `schema.rs` - Parameter schema, validation and JSON Schema rendering
//! - `handlers.rs` - Handler signature and the per-call view handed to it
//! - `registry.rs` - Descriptor lookup by name
//! - `dispatch.rs` - Lookup, validate, invoke, serialize
//! - `router.rs` - rmcp ToolRouter for STDIO/TCP transport
//! - `error.rs` - Call-time error taxonomy
//!
//! ## Adding a New Tool
//!
//! 1. Add a handler and a `ToolDescriptor` in the platform's catalog file
//! 2. Append the descriptor to that file's `tools()` list
//!
//! The registry, router and HTTP transport pick it up from there.

pub mod definitions;
mod dispatch;
mod error;
mod handlers;
mod registry;
pub mod router;
mod schema;

pub use dispatch::{Dispatcher, to_call_tool_result};
pub use error::{ErrorKind, ToolError, ToolResult};
pub use handlers::{Handler, ToolCall};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use router::build_tool_router;
pub use schema::{FieldSpec, FieldType, ParamSchema, Params};
