//! In-memory tool registry tree.
//!
//! A static tree built once from seed definitions. Only the `enabled` flag of
//! a node ever changes afterwards. Not persisted and not shared with the
//! relational catalog; there is no locking, callers mutate through `&mut`.

mod definition;

use log::{debug, info};
use serde::Serialize;

pub use definition::{
    ToolDefinition, default_definitions, load_definitions, parse_definitions, title_case,
};

/// A node of the registry tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolNode {
    pub name: String,
    pub label: String,
    pub enabled: bool,
    pub children: Vec<ToolNode>,
}

impl ToolNode {
    fn from_definition(definition: &ToolDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            label: definition.display_label(),
            enabled: definition.enabled,
            children: definition.children.iter().map(Self::from_definition).collect(),
        }
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut ToolNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    fn label_path(&self, name: &str, trail: &mut Vec<String>) -> bool {
        trail.push(self.label.clone());
        if self.name == name || self.children.iter().any(|child| child.label_path(name, trail)) {
            return true;
        }
        trail.pop();
        false
    }
}

/// Pre-order traversal of a `ToolNode` subtree.
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a ToolNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ToolNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// The registry tree rooted at `{name: "root", label: "Root"}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolTree {
    root: ToolNode,
}

impl ToolTree {
    /// Build the tree from seed definitions.
    pub fn discover(definitions: &[ToolDefinition]) -> Self {
        let root = ToolNode {
            name: "root".to_string(),
            label: "Root".to_string(),
            enabled: true,
            children: definitions.iter().map(ToolNode::from_definition).collect(),
        };
        let tree = Self { root };
        debug!("Built registry tree with {} nodes", tree.iter().count());
        tree
    }

    /// Build the tree from the built-in seed.
    pub fn with_defaults() -> Self {
        Self::discover(&default_definitions())
    }

    pub fn root(&self) -> &ToolNode {
        &self.root
    }

    /// Top-level nodes below the root.
    pub fn children(&self) -> &[ToolNode] {
        &self.root.children
    }

    /// Pre-order iterator over every node, root first.
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    /// First node with this name in pre-order, root included.
    pub fn find(&self, name: &str) -> Option<&ToolNode> {
        self.iter().find(|node| node.name == name)
    }

    /// Set a node's enabled flag. Returns false if no node has this name.
    pub fn toggle(&mut self, name: &str, enabled: bool) -> bool {
        match self.root.find_mut(name) {
            Some(node) => {
                node.enabled = enabled;
                info!("Registry node '{}' enabled={}", name, enabled);
                true
            }
            None => false,
        }
    }

    /// Display labels from the root down to the named node, inclusive.
    /// Empty when no node has this name.
    pub fn label_path(&self, name: &str) -> Vec<String> {
        let mut trail = Vec::new();
        if self.root.label_path(name, &mut trail) {
            trail
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messaging_tree() -> ToolTree {
        ToolTree::discover(&[ToolDefinition::new("messaging", "Messaging").with_children(vec![
            ToolDefinition::new("echo", "Echo"),
            ToolDefinition::new("broadcast", "Broadcast"),
        ])])
    }

    #[test]
    fn test_toggle_and_label_path() {
        let mut tree = messaging_tree();

        assert!(tree.toggle("echo", false));
        assert!(!tree.find("echo").unwrap().enabled);
        assert_eq!(tree.label_path("echo"), vec!["Root", "Messaging", "Echo"]);
        assert!(!tree.toggle("missing", true));
    }

    #[test]
    fn test_toggle_root_and_inner_nodes() {
        let mut tree = messaging_tree();
        assert!(tree.toggle("root", false));
        assert!(!tree.root().enabled);
        assert!(tree.toggle("messaging", false));
        assert!(!tree.children()[0].enabled);
        // children keep their own state
        assert!(tree.find("broadcast").unwrap().enabled);
    }

    #[test]
    fn test_label_path_of_root() {
        let tree = messaging_tree();
        assert_eq!(tree.label_path("root"), vec!["Root"]);
    }

    #[test]
    fn test_label_path_missing_is_empty() {
        let tree = messaging_tree();
        assert!(tree.label_path("nope").is_empty());
    }

    #[test]
    fn test_preorder_iteration() {
        let tree = ToolTree::with_defaults();
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["root", "messaging", "echo", "broadcast", "analytics", "report"]
        );
    }

    #[test]
    fn test_deep_nodes_are_found() {
        let mut tree = ToolTree::discover(&[ToolDefinition::new("a", "A").with_children(vec![
            ToolDefinition::new("b", "B").with_children(vec![ToolDefinition::new("c", "C").disabled()]),
        ])]);

        assert!(!tree.find("c").unwrap().enabled);
        assert!(tree.toggle("c", true));
        assert!(tree.find("c").unwrap().enabled);
        assert_eq!(tree.label_path("c"), vec!["Root", "A", "B", "C"]);
    }

    #[test]
    fn test_first_match_wins_for_duplicate_names() {
        let tree = ToolTree::discover(&[
            ToolDefinition::new("x", "First").with_children(vec![ToolDefinition::new("dup", "One")]),
            ToolDefinition::new("y", "Second").with_children(vec![ToolDefinition::new("dup", "Two")]),
        ]);
        assert_eq!(tree.label_path("dup"), vec!["Root", "First", "One"]);
        assert_eq!(tree.find("dup").unwrap().label, "One");
    }

    #[test]
    fn test_shape_is_fixed_after_toggles() {
        let mut tree = ToolTree::with_defaults();
        let before = tree.iter().count();
        tree.toggle("report", false);
        assert_eq!(tree.iter().count(), before);
    }

    #[test]
    fn test_serializes_nested() {
        let tree = messaging_tree();
        let json = serde_json::to_value(tree.children()).unwrap();
        assert_eq!(json[0]["name"], "messaging");
        assert_eq!(json[0]["children"][0]["label"], "Echo");
        assert_eq!(json[0]["children"][1]["enabled"], true);
    }
}
