use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TreeError};

/// Index of a node inside a [`WeightedTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Label of this node; `None` only for the canonical empty tree.
    pub value: Option<String>,
    /// Leaf: externally supplied size. Branch: sum of the children.
    pub weight: u64,
    pub color: Rgb,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A weighted tree stored as an arena of nodes.
///
/// Children are owned through `children` index lists; `parent` is a plain
/// back-reference used to walk towards the root. Removed nodes keep their
/// arena slot as a detached tombstone so ids stay stable.
///
/// Invariants maintained by every public operation:
/// - a node with children weighs exactly the sum of its children;
/// - a node without a value is the lone, parentless, weightless empty root;
/// - a node with a parent occurs exactly once in that parent's children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTree {
    pub(crate) root: NodeId,
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) separator: String,
}

impl Default for WeightedTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl WeightedTree {
    /// The canonical empty tree.
    pub fn empty() -> Self {
        Self {
            root: NodeId(0),
            nodes: vec![TreeNode {
                id: NodeId(0),
                parent: None,
                value: None,
                weight: 0,
                color: Rgb::default(),
                children: Vec::new(),
            }],
            separator: std::path::MAIN_SEPARATOR_STR.to_string(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.index()].value.is_none()
    }

    /// Number of arena slots, detached tombstones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_weight(&self) -> u64 {
        self.nodes[self.root.index()].weight
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Walks parent links upwards, starting with the parent of `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    /// Values from the root down to `id`, joined by the tree's separator.
    pub fn path_string(&self, id: NodeId) -> Result<String> {
        let node = self.node(id)?;
        let mut parts: Vec<&str> = vec![node.value.as_deref().unwrap_or_default()];
        for ancestor in self.ancestors(id) {
            parts.push(self.nodes[ancestor.index()].value.as_deref().unwrap_or_default());
        }
        parts.reverse();
        Ok(parts.join(&self.separator))
    }

    /// Re-checks the structural invariants over the whole arena.
    pub fn validate(&self) -> Result<()> {
        for node in &self.nodes {
            if node.value.is_none()
                && (!node.children.is_empty() || node.parent.is_some() || node.weight != 0)
            {
                return Err(TreeError::ConsistencyViolation(format!(
                    "{:?} has no value but is not the empty tree",
                    node.id
                )));
            }
            if let Some(parent) = node.parent {
                let owner = self.get(parent).ok_or_else(|| TreeError::ConsistencyViolation(format!(
                    "{:?} points at missing parent {:?}",
                    node.id, parent
                )))?;
                let occurrences = owner.children.iter().filter(|c| **c == node.id).count();
                if occurrences != 1 {
                    return Err(TreeError::ConsistencyViolation(format!(
                        "{:?} occurs {} times under {:?}",
                        node.id, occurrences, parent
                    )));
                }
            }
            if !node.children.is_empty() {
                let mut sum: u64 = 0;
                for child in &node.children {
                    let c = self.get(*child).ok_or_else(|| TreeError::ConsistencyViolation(format!(
                        "{:?} lists missing child {:?}",
                        node.id, child
                    )))?;
                    if c.parent != Some(node.id) {
                        return Err(TreeError::ConsistencyViolation(format!(
                            "{:?} lists {:?} whose parent is {:?}",
                            node.id, child, c.parent
                        )));
                    }
                    sum = sum.checked_add(c.weight).ok_or(TreeError::WeightOverflow)?;
                }
                if sum != node.weight {
                    return Err(TreeError::ConsistencyViolation(format!(
                        "{:?} weighs {} but its children sum to {}",
                        node.id, node.weight, sum
                    )));
                }
            }
        }
        Ok(())
    }
}

pub struct Ancestors<'a> {
    tree: &'a WeightedTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.parent);
        Some(id)
    }
}
