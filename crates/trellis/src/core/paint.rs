use kurbo::{Affine, BezPath};
use scopeguard::guard;

use super::{
    canvas::Canvas,
    item::ItemContext,
    style::{FillOptions, FillRule, StrokeOptions},
};
use crate::{ItemId, error::Result, geom::Bounds};

/// The drawing surface the paint pipeline renders into.
///
/// The painter keeps a stack of graphics states: `save` pushes the current
/// transform and clip, `restore` pops it. Transforms compose onto the current
/// one, so the pipeline never needs to know the absolute device transform.
pub trait Painter {
    /// Push the current graphics state.
    fn save(&mut self);
    /// Pop the graphics state pushed by the matching `save`.
    fn restore(&mut self);
    /// Compose `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);
    /// Intersect the clip region with a path.
    fn clip(&mut self, path: &BezPath, rule: FillRule) -> Result<()>;
    /// Fill a path.
    fn fill(&mut self, path: &BezPath, options: &FillOptions) -> Result<()>;
    /// Stroke a path.
    fn stroke(&mut self, path: &BezPath, options: &StrokeOptions) -> Result<()>;
}

/// Paint an item and its subtree.
///
/// `damage` is in canvas space. Items whose bounds miss it, or which are not
/// shown at `scale`, are skipped along with their children.
pub(crate) fn paint_item(
    canvas: &Canvas,
    id: ItemId,
    painter: &mut dyn Painter,
    damage: &Bounds,
    scale: f64,
) -> Result<()> {
    let Some(node) = canvas.items.get(id) else {
        return Ok(());
    };
    let b = &node.bounds;
    if b.x1 > damage.x2 || b.x2 < damage.x1 || b.y1 > damage.y2 || b.y2 < damage.y1 {
        return Ok(());
    }
    if !node.props.shown_at(scale) {
        return Ok(());
    }

    painter.save();
    let mut painter = guard(painter, |p| p.restore());
    if let Some(t) = node.props.transform {
        painter.transform(t);
    }
    if let Some(clip) = &node.props.clip_path {
        painter.clip(clip, node.props.clip_fill_rule)?;
    }

    if node.is_container() {
        for &child in &node.children {
            match node.item.child_transform(child) {
                Some(extra) => {
                    painter.save();
                    let mut inner = guard(&mut **painter, |p| p.restore());
                    inner.transform(extra);
                    paint_item(canvas, child, &mut **inner, damage, scale)?;
                }
                None => paint_item(canvas, child, &mut **painter, damage, scale)?,
            }
        }
    } else {
        let cx = ItemContext::new(
            node.effective_style.as_deref(),
            canvas.default_line_width(),
            scale,
        );
        node.item.paint(&mut **painter, &cx)?;
    }
    Ok(())
}
