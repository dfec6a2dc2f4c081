use crate::model::*;
use crate::treemap::{Rect, TreemapItem};

pub fn to_csv(tree: &WeightedTree, items: &[TreemapItem], mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["path", "weight", "x", "y", "w", "h", "color"])?;
    for item in items {
        let weight = tree.get(item.id).map(|n| n.weight).unwrap_or_default();
        writer.write_record([
            tree.path_string(item.id).unwrap_or_default(),
            weight.to_string(),
            item.rect.x.to_string(),
            item.rect.y.to_string(),
            item.rect.w.to_string(),
            item.rect.h.to_string(),
            item.color.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(tree: &WeightedTree, area: Rect, items: &[TreemapItem]) -> serde_json::Value {
    serde_json::json!({
        "rect": area,
        "total_weight": tree.total_weight(),
        "items": items.iter().map(|item| serde_json::json!({
            "id": item.id.0,
            "path": tree.path_string(item.id).unwrap_or_default(),
            "weight": tree.get(item.id).map(|n| n.weight).unwrap_or_default(),
            "rect": item.rect,
            "color": item.color.to_string(),
        })).collect::<Vec<_>>()
    })
}

/// Attached nodes of the tree in arena order; detached tombstones are left out.
pub fn tree_to_json(tree: &WeightedTree) -> serde_json::Value {
    serde_json::json!({
        "root": tree.root().0,
        "separator": tree.separator(),
        "nodes": tree.nodes.iter()
            .filter(|n| n.id == tree.root() || n.parent.is_some())
            .map(|n| serde_json::json!({
                "id": n.id.0,
                "parent": n.parent.as_ref().map(|p| p.0),
                "value": n.value,
                "weight": n.weight,
                "color": n.color.to_string(),
                "children": n.children.iter().map(|c| c.0).collect::<Vec<_>>()
            })).collect::<Vec<_>>()
    })
}
