//! Slice-and-dice treemap layout and hit-testing.
//!
//! Each branch splits its rectangle into bands along its longer side, one
//! band per child, sized by the child's share of the branch weight. Spans
//! are floored, and the last child with any weight takes everything up to
//! the far edge so the bands always tile the parent exactly.

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, Rgb, WeightedTree};

/// Pixel rectangle; `w` and `h` are expected to be non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        let (x, y, px, py) = (self.x as i64, self.y as i64, px as i64, py as i64);
        x <= px && px <= x + self.w as i64 && y <= py && py <= y + self.h as i64
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreemapItem {
    pub id: NodeId,
    pub rect: Rect,
    pub color: Rgb,
}

/// Lays out every leaf with positive weight inside `area`.
///
/// Returns nothing for the empty tree or a tree of total weight 0, and the
/// whole `area` for a single-leaf tree.
pub fn generate(tree: &WeightedTree, area: Rect) -> Vec<TreemapItem> {
    let mut out = Vec::new();
    slice(tree, tree.root(), area, &mut out);
    tracing::trace!(items = out.len(), ?area, "generated treemap");
    out
}

fn slice(tree: &WeightedTree, id: NodeId, area: Rect, out: &mut Vec<TreemapItem>) {
    let node = &tree.nodes[id.index()];
    if node.value.is_none() || node.weight == 0 {
        return;
    }
    if node.children.is_empty() {
        out.push(TreemapItem {
            id,
            rect: area,
            color: node.color,
        });
        return;
    }

    let columns = area.w > area.h;
    let (start, span) = if columns { (area.x, area.w) } else { (area.y, area.h) };
    let end = start + span;
    let last = node
        .children
        .iter()
        .rposition(|c| tree.nodes[c.index()].weight > 0);

    let mut offset = start;
    for (i, &child) in node.children.iter().enumerate() {
        let band = if Some(i) == last {
            end - offset
        } else {
            share(tree.nodes[child.index()].weight, node.weight, span)
        };
        let sub = if columns {
            Rect::new(offset, area.y, band, area.h)
        } else {
            Rect::new(area.x, offset, area.w, band)
        };
        slice(tree, child, sub, out);
        offset += band;
    }
}

/// `floor(weight / total * span)` evaluated in `f64`, in that order.
///
/// The ratio is rounded before scaling, so an exact share such as 29/100 of
/// 100 comes out as 28; layouts depend on reproducing that.
fn share(weight: u64, total: u64, span: i32) -> i32 {
    ((weight as f64 / total as f64) * span.max(0) as f64).floor() as i32
}

/// Leaves with positive weight, in the order [`generate`] emits them.
pub fn leaves(tree: &WeightedTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let node = &tree.nodes[id.index()];
        if node.value.is_none() || node.weight == 0 {
            continue;
        }
        if node.children.is_empty() {
            out.push(id);
        } else {
            stack.extend(node.children.iter().rev());
        }
    }
    out
}

/// Finds the leaf whose rectangle contains `(px, py)` when the tree is laid
/// out in `area`. On shared edges the earlier rectangle wins.
pub fn hit_test(tree: &WeightedTree, (px, py): (i32, i32), area: Rect) -> Option<NodeId> {
    let items = generate(tree, area);
    let leaves = leaves(tree);
    debug_assert_eq!(items.len(), leaves.len());
    let index = items.iter().position(|item| item.rect.contains(px, py))?;
    leaves.get(index).copied()
}
