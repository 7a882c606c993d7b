//! Nested view of a hierarchy.
//!
//! `HierarchyTree` turns the flat `list_all()` records into parent/child
//! links with depths, for display.

use std::collections::HashMap;

use crate::store::NodeRecord;

/// Hierarchical representation of folders or labels.
#[derive(Debug, Default)]
pub struct HierarchyTree {
    /// All nodes indexed by ID
    nodes: HashMap<i64, TreeNode>,
    /// IDs of top-level nodes (no parent, or parent not in the record set)
    root_ids: Vec<i64>,
}

impl HierarchyTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree from flat records.
    pub fn build_from_records(records: Vec<NodeRecord>) -> Self {
        let mut tree = Self::new();

        // First pass: create all nodes
        for record in &records {
            tree.nodes.insert(
                record.id,
                TreeNode {
                    record: record.clone(),
                    depth: 0,
                    children: Vec::new(),
                },
            );
        }

        // Second pass: parent-child links
        for record in &records {
            match record.parent_id {
                Some(parent_id) if tree.nodes.contains_key(&parent_id) => {
                    if let Some(parent) = tree.nodes.get_mut(&parent_id) {
                        parent.children.push(record.id);
                    }
                }
                _ => tree.root_ids.push(record.id),
            }
        }

        let names: HashMap<i64, (String, i64)> = tree
            .nodes
            .iter()
            .map(|(id, node)| (*id, (node.record.name.clone(), *id)))
            .collect();
        for node in tree.nodes.values_mut() {
            node.children.sort_by(|a, b| names[a].cmp(&names[b]));
        }
        tree.root_ids.sort_by(|a, b| names[a].cmp(&names[b]));

        for root_id in tree.root_ids.clone() {
            tree.calculate_depth(root_id, 0);
        }

        tree
    }

    fn calculate_depth(&mut self, node_id: i64, depth: usize) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.depth = depth;
            let children = node.children.clone();
            for child_id in children {
                self.calculate_depth(child_id, depth + 1);
            }
        }
    }

    /// Pre-order walk: each parent before its name-ordered children.
    pub fn flatten(&self) -> Vec<&TreeNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<i64> = self.root_ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// IDs of the top-level nodes.
    pub fn root_ids(&self) -> &[i64] {
        &self.root_ids
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: i64) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Get total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A node in the hierarchy tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub record: NodeRecord,
    /// Depth in the tree (0 = top level)
    pub depth: usize,
    /// Child node IDs, ordered by name
    pub children: Vec<i64>,
}
