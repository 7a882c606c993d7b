//! Plugin tool metadata and the runnable tool trait.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Descriptive metadata of a runnable tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Tool name (e.g., "example.echo")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Folder the tool is shown under
    pub folder: String,
    /// Free-form label names
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Hint for clients; hidden tools are still listed and callable
    #[serde(default)]
    pub hidden: bool,
}

fn default_enabled() -> bool {
    true
}

impl ToolMetadata {
    /// Create metadata for an enabled, visible tool
    pub fn new(name: impl Into<String>, description: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            folder: folder.into(),
            labels: Vec::new(),
            enabled: true,
            hidden: false,
        }
    }

    /// Set labels
    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Mark disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A runnable tool exposed through the plugin registry
pub trait McpTool: Send + Sync {
    fn metadata(&self) -> &ToolMetadata;

    /// Run the tool on a JSON payload.
    fn run(&self, payload: Value) -> Result<Value>;

    /// Descriptor advertised to MCP clients.
    fn as_mcp_tool(&self) -> Value {
        let meta = self.metadata();
        serde_json::json!({
            "name": meta.name,
            "description": meta.description,
            "folder_id": meta.folder,
            "labels": meta.labels,
            "enabled": meta.enabled,
            "hidden": meta.hidden,
        })
    }
}
