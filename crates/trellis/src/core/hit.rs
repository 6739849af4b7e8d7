//! Point and area queries over the item tree.
//!
//! Both queries prune on the canvas-space bounds computed by the last update
//! pass, so the canvas brings bounds up to date before calling in here.
//! Results are returned topmost first.

use kurbo::{Affine, Point};

use super::{
    canvas::Canvas,
    item::{ItemContext, PointerEvents, in_fill},
};
use crate::{
    ItemId,
    geom::{Bounds, invert},
};

/// Collect the items under a canvas-space point, topmost first.
///
/// In pointer mode items are filtered by their pointer-event policy and
/// visibility. Otherwise every item whose geometry contains the point is
/// reported. Containers are never reported themselves.
pub(crate) fn items_at(canvas: &Canvas, root: ItemId, p: Point, pointer: bool) -> Vec<ItemId> {
    let mut found = Vec::new();
    collect_at(canvas, root, p, Affine::IDENTITY, pointer, true, &mut found);
    found.reverse();
    found
}

/// Recursive step of [`items_at`]. `ctm` maps the parent's space to canvas
/// space. Matches are pushed bottom first.
fn collect_at(
    canvas: &Canvas,
    id: ItemId,
    p: Point,
    ctm: Affine,
    pointer: bool,
    parent_visible: bool,
    found: &mut Vec<ItemId>,
) {
    let Some(node) = canvas.items.get(id) else {
        return;
    };
    if !node.bounds.contains_point(p) {
        return;
    }
    let scale = canvas.config.scale;
    let props = &node.props;
    let visible = parent_visible && props.shown_at(scale);
    let mut events = PointerEvents::ALL;
    if pointer {
        if props.pointer_events == PointerEvents::NONE {
            return;
        }
        if props.pointer_events.contains(PointerEvents::VISIBLE) && !visible {
            return;
        }
        events = props.pointer_events;
    }

    let ctm = ctm * props.transform_or_identity();
    let Some(to_local) = invert(ctm) else {
        return;
    };
    let local = to_local * p;
    if let Some(clip) = &props.clip_path
        && !in_fill(clip, local, props.clip_fill_rule)
    {
        return;
    }

    if node.is_container() {
        for &child in &node.children {
            let child_ctm = match node.item.child_transform(child) {
                Some(extra) => ctm * extra,
                None => ctm,
            };
            collect_at(canvas, child, p, child_ctm, pointer, visible, found);
        }
        return;
    }

    let cx = ItemContext::new(
        node.effective_style.as_deref(),
        canvas.default_line_width(),
        scale,
    );
    if node.item.is_item_at(local, &cx, events) {
        found.push(id);
    }
}

/// Which items an area query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaQuery {
    /// Select items inside the area. When false, select items outside it.
    pub inside: bool,
    /// Also select items that straddle the area's edge.
    pub allow_overlap: bool,
    /// Report containers as well as leaves.
    pub include_containers: bool,
}

impl Default for AreaQuery {
    fn default() -> Self {
        Self {
            inside: true,
            allow_overlap: false,
            include_containers: false,
        }
    }
}

impl AreaQuery {
    /// Items completely inside the area.
    pub fn inside() -> Self {
        Self::default()
    }

    /// Items completely outside the area.
    pub fn outside() -> Self {
        Self {
            inside: false,
            ..Self::default()
        }
    }

    /// Also select items partly inside and partly outside.
    pub fn allow_overlap(mut self) -> Self {
        self.allow_overlap = true;
        self
    }

    /// Report containers too.
    pub fn include_containers(mut self) -> Self {
        self.include_containers = true;
        self
    }

    /// Does an item with `bounds` belong in the result, and should its
    /// children be examined?
    fn classify(&self, bounds: &Bounds, area: &Bounds) -> (bool, bool) {
        let completely_inside = area.contains(bounds);
        let completely_outside = !area.intersects(bounds);
        let (select, descend) = if self.inside {
            (
                completely_inside || (self.allow_overlap && !completely_outside),
                !completely_outside,
            )
        } else {
            (
                completely_outside || (self.allow_overlap && !completely_inside),
                !completely_inside,
            )
        };
        (select, descend)
    }
}

/// Collect the items selected by `query` against a canvas-space area,
/// topmost first.
pub(crate) fn items_in_area(
    canvas: &Canvas,
    root: ItemId,
    area: &Bounds,
    query: AreaQuery,
) -> Vec<ItemId> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = canvas.items.get(id) else {
            continue;
        };
        let (select, descend) = query.classify(&node.bounds, area);
        let container = node.is_container();
        if select && (!container || query.include_containers) {
            found.push(id);
        }
        if descend {
            stack.extend(node.children.iter().rev());
        }
    }
    found.reverse();
    found
}
