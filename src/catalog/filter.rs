//! Read-path filtering and folder path resolution.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{AdminError, Result};
use crate::hierarchy::Folders;
use crate::store::{LabelRef, NodeRecord, ROOT_ID, ToolRecord};

/// Separator between folder names in a rendered path.
pub const PATH_SEPARATOR: &str = " / ";

/// A tool with its folder path and labels resolved for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolView {
    #[serde(flatten)]
    pub tool: ToolRecord,
    pub folder_path: String,
    pub labels: Vec<LabelRef>,
}

/// Folder paths memoized per request.
///
/// Loads every folder once, then renders each path by walking parent links,
/// reusing any ancestor path already rendered.
#[derive(Debug)]
pub struct FolderPathCache {
    folders: HashMap<i64, NodeRecord>,
    paths: HashMap<i64, String>,
}

impl FolderPathCache {
    /// Snapshot the folder table.
    pub fn load(folders: &Folders<'_>) -> Result<Self> {
        Ok(Self::from_records(folders.list_all()?))
    }

    pub fn from_records(records: Vec<NodeRecord>) -> Self {
        let mut paths = HashMap::new();
        paths.insert(ROOT_ID, String::new());
        Self {
            folders: records.into_iter().map(|r| (r.id, r)).collect(),
            paths,
        }
    }

    /// Root-to-leaf names joined by `" / "`; the root renders as "".
    ///
    /// An unknown folder id renders as "".
    pub fn path(&mut self, folder_id: i64) -> String {
        // Climb until a memoized ancestor (or the top) is reached.
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(folder_id);
        let mut prefix = String::new();
        while let Some(id) = current {
            if let Some(cached) = self.paths.get(&id) {
                prefix = cached.clone();
                break;
            }
            let Some(folder) = self.folders.get(&id) else {
                break;
            };
            if !seen.insert(id) {
                break;
            }
            chain.push(id);
            current = folder.parent_id;
        }

        // Render back down, memoizing every ancestor on the way.
        for id in chain.into_iter().rev() {
            let name = &self.folders[&id].name;
            prefix = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}{}{}", prefix, PATH_SEPARATOR, name)
            };
            self.paths.insert(id, prefix.clone());
        }

        self.paths.get(&folder_id).cloned().unwrap_or_default()
    }

    /// Number of rendered paths, the root included.
    pub fn cached(&self) -> usize {
        self.paths.len()
    }
}

/// In-memory filter over resolved tool views. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    /// Case-insensitive substring of the folder path
    pub folder_path: Option<String>,
    /// Match tools carrying at least one of these labels
    pub labels: Vec<i64>,
}

impl ToolFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_folder_path(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = i64>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    /// Parse the comma-separated form, e.g. `"2,5"`. Blank segments are skipped.
    pub fn with_label_csv(self, csv: &str) -> Result<Self> {
        let labels = csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| AdminError::InvalidInput(format!("invalid label id '{}'", s)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_labels(labels))
    }

    /// Check if a view satisfies every criterion.
    pub fn matches(&self, view: &ToolView) -> bool {
        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            if !view.tool.name.to_lowercase().contains(&needle)
                && !view.tool.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(path) = non_blank(&self.folder_path)
            && !view.folder_path.to_lowercase().contains(&path.to_lowercase())
        {
            return false;
        }

        if !self.labels.is_empty() && !view.labels.iter().any(|l| self.labels.contains(&l.id)) {
            return false;
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
