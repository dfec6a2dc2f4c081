use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::model::{NodeId, WeightedTree};
use crate::treemap::leaves;

/// Visible leaves whose full path matches `needle`, best score first.
/// Equal scores keep layout order.
pub fn find_leaves(tree: &WeightedTree, needle: &str) -> Vec<(NodeId, i64)> {
    let m = SkimMatcherV2::default();
    let mut hits: Vec<(NodeId, i64)> = leaves(tree)
        .into_iter()
        .filter_map(|id| {
            let path = tree.path_string(id).ok()?;
            m.fuzzy_match(&path, needle).map(|score| (id, score))
        })
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1));
    hits
}

pub fn best_leaf(tree: &WeightedTree, needle: &str) -> Option<NodeId> {
    find_leaves(tree, needle).first().map(|(id, _)| *id)
}
