use crate::error::{Result, TreeError};
use crate::model::{NodeId, WeightedTree};

/// One percent of `weight`, rounded up. Agrees with `ceil(0.01 * weight)` in
/// floating point for every weight a tree realistically holds.
fn step(weight: u64) -> u64 {
    weight.div_ceil(100)
}

impl WeightedTree {
    /// Detaches leaf `id` from its parent and subtracts its weight from every
    /// ancestor. The node keeps its arena slot with no parent and weight 0.
    ///
    /// Returns the weight that was removed.
    pub fn remove_leaf(&mut self, id: NodeId) -> Result<u64> {
        self.require_leaf(id)?;
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Err(TreeError::InvalidOperation(format!(
                "{id:?} has no parent and cannot be removed"
            )));
        };
        let weight = node.weight;

        for ancestor in self.ancestors(id).collect::<Vec<_>>() {
            self.nodes[ancestor.index()].weight -= weight;
        }
        self.nodes[parent.index()].children.retain(|c| *c != id);
        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.weight = 0;

        debug_assert!(self.validate().is_ok());
        tracing::debug!(?id, weight, total = self.total_weight(), "removed leaf");
        Ok(weight)
    }

    /// Grows a leaf by one percent of its weight (at least 1 unless the weight
    /// is 0) and adds the same amount to every ancestor.
    ///
    /// Returns the applied delta.
    pub fn grow_leaf(&mut self, id: NodeId) -> Result<u64> {
        self.require_attached_leaf(id)?;
        let weight = self.nodes[id.index()].weight;
        let delta = step(weight);
        let grown = weight.checked_add(delta).ok_or(TreeError::WeightOverflow)?;
        self.resize(id, grown)?;

        tracing::debug!(?id, delta, total = self.total_weight(), "grew leaf");
        Ok(delta)
    }

    /// Shrinks a leaf by one percent of its weight. A result below 1 is
    /// clamped to exactly 1, and ancestors change by the amount the leaf
    /// actually changed, so a leaf of weight 0 ends at 1 and every ancestor
    /// gains 1.
    ///
    /// Returns the actual reduction, negative when the clamp raised the leaf.
    pub fn shrink_leaf(&mut self, id: NodeId) -> Result<i64> {
        self.require_attached_leaf(id)?;
        let weight = self.nodes[id.index()].weight;
        let delta = step(weight);
        let remaining = if weight.saturating_sub(delta) < 1 {
            1
        } else {
            weight - delta
        };
        self.resize(id, remaining)?;

        let reduction = if remaining <= weight {
            (weight - remaining) as i64
        } else {
            -((remaining - weight) as i64)
        };
        tracing::debug!(?id, reduction, total = self.total_weight(), "shrank leaf");
        Ok(reduction)
    }

    /// Same as [`WeightedTree::path_string`].
    pub fn get_path(&self, id: NodeId) -> Result<String> {
        self.path_string(id)
    }

    /// Sets a leaf's weight and moves every ancestor by the same difference.
    /// Nothing changes if an ancestor would overflow.
    fn resize(&mut self, id: NodeId, weight: u64) -> Result<()> {
        let old = self.nodes[id.index()].weight;
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        if weight >= old {
            let diff = weight - old;
            if ancestors
                .iter()
                .any(|n| self.nodes[n.index()].weight.checked_add(diff).is_none())
            {
                return Err(TreeError::WeightOverflow);
            }
            for n in ancestors {
                self.nodes[n.index()].weight += diff;
            }
        } else {
            let diff = old - weight;
            for n in ancestors {
                self.nodes[n.index()].weight -= diff;
            }
        }
        self.nodes[id.index()].weight = weight;

        debug_assert!(self.validate().is_ok());
        Ok(())
    }

    fn require_leaf(&self, id: NodeId) -> Result<()> {
        if self.is_leaf(id)? {
            Ok(())
        } else {
            Err(TreeError::InvalidOperation(format!("{id:?} is not a leaf")))
        }
    }

    /// A leaf that still belongs to a non-empty tree.
    fn require_attached_leaf(&self, id: NodeId) -> Result<()> {
        self.require_leaf(id)?;
        let node = &self.nodes[id.index()];
        if node.value.is_none() || (id != self.root && node.parent.is_none()) {
            return Err(TreeError::InvalidOperation(format!(
                "{id:?} is not part of the tree"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Entry, TreeBuilder};
    use crate::treemap::{generate, leaves, Rect};
    use test_case::test_case;

    /// r -> [d -> [a(weight), b(50)], c(25)]
    fn sample(weight: u64) -> WeightedTree {
        TreeBuilder::seeded(11)
            .build(Entry::branch(
                "r",
                vec![
                    Entry::branch("d", vec![Entry::leaf("a", weight), Entry::leaf("b", 50)]),
                    Entry::leaf("c", 25),
                ],
            ))
            .unwrap()
    }

    const R: NodeId = NodeId(0);
    const D: NodeId = NodeId(1);
    const A: NodeId = NodeId(2);
    const C: NodeId = NodeId(4);

    fn weight(tree: &WeightedTree, id: NodeId) -> u64 {
        tree.node(id).unwrap().weight
    }

    #[test_case(0, 0 ; "zero weight does not grow")]
    #[test_case(1, 1 ; "minimum growth is one")]
    #[test_case(100, 1 ; "exact percent")]
    #[test_case(101, 2 ; "rounds up")]
    #[test_case(2500, 25 ; "large weight")]
    fn grow_applies_ceil_percent(start: u64, delta: u64) {
        let mut tree = sample(start);
        let root_before = weight(&tree, R);
        assert_eq!(tree.grow_leaf(A).unwrap(), delta);
        assert_eq!(weight(&tree, A), start + delta);
        assert_eq!(weight(&tree, D), start + 50 + delta);
        assert_eq!(weight(&tree, R), root_before + delta);
        tree.validate().unwrap();
    }

    #[test_case(1, 0, 1 ; "floor holds at one")]
    #[test_case(2, 1, 1 ; "two drops to one")]
    #[test_case(100, 1, 99 ; "exact percent")]
    #[test_case(150, 2, 148 ; "rounds up")]
    fn shrink_applies_ceil_percent(start: u64, reduction: i64, after: u64) {
        let mut tree = sample(start);
        let root_before = weight(&tree, R);
        assert_eq!(tree.shrink_leaf(A).unwrap(), reduction);
        assert_eq!(weight(&tree, A), after);
        assert_eq!(weight(&tree, R), root_before - reduction as u64);
        tree.validate().unwrap();
    }

    #[test]
    fn shrink_raises_zero_weight_leaf_to_one() {
        let mut tree = sample(0);
        assert_eq!(tree.shrink_leaf(A).unwrap(), -1);
        assert_eq!(weight(&tree, A), 1);
        assert_eq!(weight(&tree, D), 51);
        assert_eq!(weight(&tree, R), 76);
        for _ in 0..5 {
            assert_eq!(tree.shrink_leaf(A).unwrap(), 0);
        }
        assert_eq!(weight(&tree, A), 1);
        assert_eq!(weight(&tree, R), 76);
        assert!(leaves(&tree).contains(&A));
        tree.validate().unwrap();
    }

    #[test]
    fn repeated_shrinks_converge_to_one() {
        let mut tree = sample(1_000);
        for _ in 0..2_000 {
            tree.shrink_leaf(A).unwrap();
            assert!(weight(&tree, A) >= 1);
        }
        assert_eq!(weight(&tree, A), 1);
        assert_eq!(weight(&tree, R), 76);
        tree.validate().unwrap();
    }

    #[test]
    fn grow_then_shrink_conserves_root_delta() {
        let mut tree = sample(250);
        let before = weight(&tree, R) as i64;
        let grown = tree.grow_leaf(A).unwrap() as i64;
        let shrunk = tree.shrink_leaf(A).unwrap();
        assert_eq!(weight(&tree, R) as i64, before + grown - shrunk);
        assert_eq!(weight(&tree, D), weight(&tree, A) + 50);
    }

    #[test]
    fn resizing_rejects_detached_and_empty_nodes() {
        let mut tree = sample(40);
        tree.remove_leaf(A).unwrap();
        assert!(matches!(tree.shrink_leaf(A), Err(TreeError::InvalidOperation(_))));
        assert!(matches!(tree.grow_leaf(A), Err(TreeError::InvalidOperation(_))));
        assert_eq!(weight(&tree, A), 0);
        assert_eq!(weight(&tree, R), 75);

        let mut empty = WeightedTree::empty();
        let root = empty.root();
        assert!(matches!(empty.shrink_leaf(root), Err(TreeError::InvalidOperation(_))));
        assert_eq!(empty.total_weight(), 0);
        empty.validate().unwrap();
    }

    #[test]
    fn remove_propagates_and_detaches() {
        let mut tree = sample(40);
        assert_eq!(tree.remove_leaf(A).unwrap(), 40);
        assert_eq!(weight(&tree, D), 50);
        assert_eq!(weight(&tree, R), 75);
        assert_eq!(weight(&tree, A), 0);
        assert_eq!(tree.node(A).unwrap().parent, None);
        assert!(!tree.children(D).unwrap().contains(&A));
        assert!(!leaves(&tree).contains(&A));
        let items = generate(&tree, Rect::new(0, 0, 100, 100));
        assert!(items.iter().all(|i| i.id != A));
        tree.validate().unwrap();
    }

    #[test]
    fn removing_every_child_leaves_an_empty_branch() {
        let mut tree = sample(40);
        tree.remove_leaf(A).unwrap();
        tree.remove_leaf(NodeId(3)).unwrap();
        assert!(tree.is_leaf(D).unwrap());
        assert_eq!(weight(&tree, D), 0);
        assert_eq!(leaves(&tree), vec![C]);
        tree.validate().unwrap();
    }

    #[test]
    fn remove_rejects_parentless_nodes() {
        let mut tree = sample(40);
        assert!(matches!(tree.remove_leaf(R), Err(TreeError::InvalidOperation(_))));
        tree.remove_leaf(A).unwrap();
        assert!(matches!(tree.remove_leaf(A), Err(TreeError::InvalidOperation(_))));
        assert_eq!(weight(&tree, R), 75);
    }

    #[test]
    fn remove_rejects_branches() {
        let mut tree = sample(3);
        assert!(matches!(tree.remove_leaf(D), Err(TreeError::InvalidOperation(_))));
        assert_eq!(weight(&tree, D), 53);
        assert_eq!(weight(&tree, R), 78);
        assert!(tree.children(R).unwrap().contains(&D));
        tree.validate().unwrap();
    }

    #[test]
    fn resizing_rejects_branches() {
        let mut tree = sample(40);
        assert!(matches!(tree.grow_leaf(D), Err(TreeError::InvalidOperation(_))));
        assert!(matches!(tree.shrink_leaf(R), Err(TreeError::InvalidOperation(_))));
        assert_eq!(weight(&tree, R), 115);
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let mut tree = sample(40);
        assert_eq!(tree.grow_leaf(NodeId(42)), Err(TreeError::UnknownNode(NodeId(42))));
        assert_eq!(tree.remove_leaf(NodeId(42)), Err(TreeError::UnknownNode(NodeId(42))));
    }

    #[test]
    fn grow_overflow_is_rejected_without_change() {
        let mut tree = TreeBuilder::seeded(0)
            .build(Entry::branch("r", vec![Entry::leaf("a", u64::MAX - 1)]))
            .unwrap();
        assert_eq!(tree.grow_leaf(NodeId(1)), Err(TreeError::WeightOverflow));
        assert_eq!(tree.total_weight(), u64::MAX - 1);
    }

    #[test]
    fn get_path_matches_path_string() {
        let tree = sample(1);
        assert_eq!(tree.get_path(A).unwrap(), tree.path_string(A).unwrap());
    }
}
