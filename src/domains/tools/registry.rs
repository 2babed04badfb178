//! Tool Registry - name to descriptor lookup.
//!
//! This module provides:
//! - [`ToolDescriptor`]: name, description, parameter schema and handler
//! - [`ToolRegistry`]: the immutable set of descriptors served by one process
//! - Tool metadata for listing

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::Tool;

use super::definitions;
use super::handlers::Handler;
use super::schema::ParamSchema;
use crate::core::config::Platform;
use crate::core::{Error, Result};

/// A registered tool. Immutable once registered.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ParamSchema,
    pub handler: Handler,
}

impl ToolDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: ParamSchema,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            description,
            schema,
            handler,
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("fields", &self.schema.fields().len())
            .finish_non_exhaustive()
    }
}

/// Tool registry - all tools one process serves, keyed by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry holding the catalog of `platform`.
    pub fn for_platform(platform: Platform) -> Result<Self> {
        let mut registry = Self::new();
        for descriptor in definitions::catalog(platform) {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register one descriptor. Names are unique.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<()> {
        if self.tools.contains_key(descriptor.name) {
            return Err(Error::internal(format!(
                "Tool '{}' registered twice",
                descriptor.name
            )));
        }
        self.tools.insert(descriptor.name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Get all tool names, sorted.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Single source of truth for every transport's `tools/list`.
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.tools.values().map(ToolDescriptor::to_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
