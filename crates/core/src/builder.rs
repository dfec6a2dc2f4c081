//! Construction of [`WeightedTree`]s from plain descriptions.
//!
//! Callers describe leaves as `(value, weight)` and branches as
//! `(value, children)`; the builder sums branch weights bottom-up, wires the
//! parent links and gives every node a colour.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, TreeError};
use crate::model::{NodeId, Rgb, TreeNode, WeightedTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Leaf { value: String, weight: u64 },
    Branch { value: String, children: Vec<Entry> },
}

impl Entry {
    pub fn leaf(value: impl Into<String>, weight: u64) -> Self {
        Entry::Leaf {
            value: value.into(),
            weight,
        }
    }

    pub fn branch(value: impl Into<String>, children: Vec<Entry>) -> Self {
        Entry::Branch {
            value: value.into(),
            children,
        }
    }
}

/// Where a tree's data comes from. Only affects how paths are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    /// Files and folders; paths use the platform separator.
    #[default]
    FileSystem,
    /// Hierarchical records such as region/country figures.
    Dataset,
}

impl Domain {
    pub fn separator(self) -> &'static str {
        match self {
            Domain::FileSystem => std::path::MAIN_SEPARATOR_STR,
            Domain::Dataset => "/",
        }
    }
}

pub struct TreeBuilder {
    rng: StdRng,
    separator: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Builder with randomly seeded colours.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Builder whose colours are reproducible for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            separator: Domain::default().separator().to_string(),
        }
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.separator = domain.separator().to_string();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn build(mut self, root: Entry) -> Result<WeightedTree> {
        let mut nodes = Vec::with_capacity(64);
        let root = self.insert(&mut nodes, root, None)?;
        let tree = WeightedTree {
            root,
            nodes,
            separator: self.separator,
        };
        debug_assert!(tree.validate().is_ok());
        tracing::debug!(nodes = tree.len(), weight = tree.total_weight(), "built weighted tree");
        Ok(tree)
    }

    fn insert(
        &mut self,
        nodes: &mut Vec<TreeNode>,
        entry: Entry,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = NodeId(nodes.len() as u64);
        let color = Rgb(self.rng.gen(), self.rng.gen(), self.rng.gen());
        let (value, weight, children) = match entry {
            Entry::Leaf { value, weight } => (value, weight, Vec::new()),
            Entry::Branch { value, children } => (value, 0, children),
        };
        nodes.push(TreeNode {
            id,
            parent,
            value: Some(value),
            weight,
            color,
            children: Vec::with_capacity(children.len()),
        });

        let mut total: u64 = weight;
        for child in children {
            let child_id = self.insert(nodes, child, Some(id))?;
            total = total
                .checked_add(nodes[child_id.index()].weight)
                .ok_or(TreeError::WeightOverflow)?;
            nodes[id.index()].children.push(child_id);
        }
        nodes[id.index()].weight = total;
        Ok(id)
    }
}
