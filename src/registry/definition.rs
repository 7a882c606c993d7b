//! Seed definitions for the registry tree.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declarative node: `{name, label?, enabled?, children?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ToolDefinition>,
}

fn default_enabled() -> bool {
    true
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
            enabled: true,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ToolDefinition>) -> Self {
        self.children = children;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Label to display, falling back to the title-cased name.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }
}

/// Built-in seed used when no definitions file is configured.
pub fn default_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("messaging", "Messaging").with_children(vec![
            ToolDefinition::new("echo", "Echo"),
            ToolDefinition::new("broadcast", "Broadcast"),
        ]),
        ToolDefinition::new("analytics", "Analytics")
            .with_children(vec![ToolDefinition::new("report", "Report")]),
    ]
}

/// Parse a YAML list of definitions.
pub fn parse_definitions(yaml: &str) -> Result<Vec<ToolDefinition>> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a YAML list of definitions from a file.
pub fn load_definitions(path: &Path) -> Result<Vec<ToolDefinition>> {
    let content = std::fs::read_to_string(path)?;
    parse_definitions(&content)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
