//! The bounds recompute pass.
//!
//! Bounds are stored in canvas space. Each pass walks the tree from the root,
//! visiting only dirty items unless a container asked for its whole subtree
//! to be recomputed. Leaves submit their old and new bounds as damage so a
//! geometry change repaints exactly the area it touched.

use std::sync::Arc;

use kurbo::{Affine, Shape};

use super::{canvas::Canvas, item::ItemContext, style::Style};
use crate::{ItemId, geom::Bounds};

/// Run one recompute pass from the root.
pub(crate) fn recompute(canvas: &mut Canvas) {
    let root = canvas.root;
    canvas.need_update = false;
    update_item(canvas, root, false, Affine::IDENTITY, None);
}

/// Recompute the bounds of `id` and, for containers, its dirty descendants.
///
/// `ctm` maps the parent's space to canvas space. Returns the item's bounds
/// after the update.
pub(crate) fn update_item(
    canvas: &mut Canvas,
    id: ItemId,
    entire_tree: bool,
    ctm: Affine,
    parent_style: Option<&Arc<Style>>,
) -> Bounds {
    let Some(node) = canvas.items.get(id) else {
        return Bounds::default();
    };
    if !(entire_tree || node.need_update) {
        return node.bounds;
    }
    if node.is_container() {
        update_group(canvas, id, entire_tree, ctm, parent_style)
    } else {
        update_leaf(canvas, id, ctm, parent_style)
    }
}

/// Containers union the non-empty bounds of their children.
fn update_group(
    canvas: &mut Canvas,
    id: ItemId,
    entire_tree: bool,
    ctm: Affine,
    parent_style: Option<&Arc<Style>>,
) -> Bounds {
    let Some(node) = canvas.items.get_mut(id) else {
        return Bounds::default();
    };
    let entire_tree = entire_tree || node.need_entire_subtree_update;
    node.need_update = false;
    node.need_entire_subtree_update = false;
    node.check_style(parent_style);
    let style = node.effective_style.clone();
    let ctm = ctm * node.props.transform_or_identity();

    let children: Vec<(ItemId, Affine)> = node
        .children
        .iter()
        .map(|&c| (c, ctm * node.item.child_transform(c).unwrap_or(Affine::IDENTITY)))
        .collect();

    let mut bounds: Option<Bounds> = None;
    for (child, child_ctm) in children {
        let b = update_item(canvas, child, entire_tree, child_ctm, style.as_ref());
        if b.is_empty() {
            continue;
        }
        bounds = Some(match bounds {
            Some(acc) => acc.union(&b),
            None => b,
        });
    }

    let bounds = bounds.unwrap_or_default();
    if let Some(node) = canvas.items.get_mut(id) {
        node.bounds = bounds;
    }
    bounds
}

/// Leaves measure their own geometry in local space, clamp it to their clip
/// and map the four corners out to canvas space.
fn update_leaf(
    canvas: &mut Canvas,
    id: ItemId,
    ctm: Affine,
    parent_style: Option<&Arc<Style>>,
) -> Bounds {
    let line_width = canvas.default_line_width();
    let scale = canvas.config.scale;
    let Some(node) = canvas.items.get_mut(id) else {
        return Bounds::default();
    };
    let old = node.bounds;
    node.need_update = false;
    node.need_entire_subtree_update = false;
    node.check_style(parent_style);

    let style = node.effective_style.clone();
    let cx = ItemContext::new(style.as_deref(), line_width, scale);
    let mut local = node.item.update(&cx);
    if let Some(clip) = &node.props.clip_path {
        local = local.clamp_to(&Bounds::from(clip.bounding_box()));
    }
    let bounds = local.transform_envelope(ctm * node.props.transform_or_identity());
    node.bounds = bounds;

    canvas.request_redraw(&old);
    canvas.request_redraw(&bounds);
    bounds
}
