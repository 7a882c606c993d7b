//! Record types read from the relational store.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Id of the protected root folder and root label.
pub const ROOT_ID: i64 = 1;

/// A folder or label row joined with its parent link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: i64,
    pub name: String,
    /// `None` only for the root
    pub parent_id: Option<i64>,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

impl NodeRecord {
    /// Check if this is the protected root node.
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

/// A tool row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub folder_id: i64,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

/// Label attached to a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelRef {
    pub id: i64,
    pub name: String,
}

/// Fields for a new tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTool {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub folder_id: i64,
}

impl NewTool {
    /// An enabled tool with no description, placed in the root folder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            folder_id: ROOT_ID,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn in_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = folder_id;
        self
    }
}

/// Partial tool update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub folder_id: Option<i64>,
}

impl ToolUpdate {
    /// Check if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.enabled.is_none() && self.folder_id.is_none()
    }

    /// Merge onto the current record.
    pub fn apply_to(&self, current: &ToolRecord) -> ToolRecord {
        ToolRecord {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            enabled: self.enabled.unwrap_or(current.enabled),
            folder_id: self.folder_id.unwrap_or(current.folder_id),
            ..current.clone()
        }
    }
}

/// Get current time in milliseconds since epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Name given to a copied folder, label or tool.
pub fn copy_name(name: &str) -> String {
    format!("{} (copy)", name)
}
