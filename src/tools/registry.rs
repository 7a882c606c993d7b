//! Plugin registry and dispatch
//!
//! Tools are registered explicitly; `builtin_tools` is the registration list.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use crate::error::{AdminError, Result};

use super::definition::McpTool;
use super::echo::EchoTool;

/// Every tool compiled into this build.
pub fn builtin_tools() -> Vec<Box<dyn McpTool>> {
    vec![Box::new(EchoTool::new())]
}

/// Name-keyed registry of runnable tools
#[derive(Default)]
pub struct McpRegistry {
    tools: BTreeMap<String, Box<dyn McpTool>>,
}

impl std::fmt::Debug for McpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl McpRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builtin tool
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_many(builtin_tools());
        registry
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Box<dyn McpTool>) {
        let name = tool.metadata().name.clone();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!("Replaced registered tool '{}'", name);
        } else {
            debug!("Registered tool '{}'", name);
        }
    }

    pub fn register_many(&mut self, tools: Vec<Box<dyn McpTool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// Descriptors of every registered tool, hidden ones included, ordered by name
    pub fn list_tools(&self) -> Vec<Value> {
        self.tools.values().map(|t| t.as_mcp_tool()).collect()
    }

    /// Get a tool by name
    pub fn tool(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Run a tool by name
    pub fn call(&self, name: &str, payload: Value) -> Result<Value> {
        let tool = self
            .tool(name)
            .ok_or_else(|| AdminError::not_found("tool", name))?;
        if !tool.metadata().enabled {
            return Err(AdminError::InvalidOperation(format!("tool '{}' is disabled", name)));
        }
        debug!("Calling tool '{}'", name);
        tool.run(payload)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
