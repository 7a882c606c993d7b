//! Example echo tool.

use serde_json::{Value, json};

use crate::error::Result;

use super::definition::{McpTool, ToolMetadata};

/// Echoes the payload back to the caller.
#[derive(Debug)]
pub struct EchoTool {
    metadata: ToolMetadata,
}

impl EchoTool {
    pub fn new() -> Self {
        Self {
            metadata: ToolMetadata::new(
                "example.echo",
                "Echoes the payload back to the caller.",
                "examples",
            )
            .with_labels(&["demo"]),
        }
    }
}

impl Default for EchoTool {
    fn default() -> Self {
        Self::new()
    }
}

impl McpTool for EchoTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn run(&self, payload: Value) -> Result<Value> {
        Ok(json!({ "echo": payload }))
    }
}
