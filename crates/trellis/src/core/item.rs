use std::{
    any::{Any, type_name},
    sync::LazyLock,
};

use bitflags::bitflags;
use kurbo::{Affine, BezPath, PathEl, Point, Shape, StrokeOpts};
use serde::{Deserialize, Serialize};

use super::{
    focus::FocusDirection,
    paint::Painter,
    style::{FillRule, Style},
};
use crate::{ItemId, error::Result, geom::Bounds};

/// Flattening tolerance used when stroking paths for extents and hit-tests.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Style used by items that have no style anywhere in their chain.
static EMPTY_STYLE: LazyLock<Style> = LazyLock::new(Style::default);

/// Whether and when an item is drawn.
///
/// Ordered so that everything at or below [`Visibility::Invisible`] is not
/// drawn and not hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Not drawn, and takes no space in layout containers.
    Hidden,
    /// Not drawn, but still takes space.
    Invisible,
    /// Drawn.
    #[default]
    Visible,
    /// Drawn only while the canvas scale is at or above the item's threshold.
    VisibleAboveThreshold,
}

bitflags! {
    /// Which parts of an item respond to pointer hit-tests.
    ///
    /// The low bits are masks: `VISIBLE` requires the item to be visible,
    /// `PAINTED` requires the tested region to actually be painted, `FILL`
    /// and `STROKE` choose the geometry tested. The remaining constants are
    /// the usual combinations.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PointerEvents: u8 {
        /// The item must be visible.
        const VISIBLE = 0b0001;
        /// The region must be painted.
        const PAINTED = 0b0010;
        /// The fill region counts.
        const FILL = 0b0100;
        /// The stroke region counts.
        const STROKE = 0b1000;

        /// Visible and painted fill or stroke.
        const VISIBLE_PAINTED =
            Self::VISIBLE.bits() | Self::PAINTED.bits() | Self::FILL.bits() | Self::STROKE.bits();
        /// Visible fill, painted or not.
        const VISIBLE_FILL = Self::VISIBLE.bits() | Self::FILL.bits();
        /// Visible stroke, painted or not.
        const VISIBLE_STROKE = Self::VISIBLE.bits() | Self::STROKE.bits();
        /// Visible fill or stroke, painted or not.
        const VISIBLE_ALL = Self::VISIBLE.bits() | Self::FILL.bits() | Self::STROKE.bits();
        /// Painted fill or stroke, visible or not.
        const PAINTED_ALL = Self::PAINTED.bits() | Self::FILL.bits() | Self::STROKE.bits();
        /// Fill only, regardless of visibility or paint.
        const FILL_ONLY = Self::FILL.bits();
        /// Stroke only, regardless of visibility or paint.
        const STROKE_ONLY = Self::STROKE.bits();
        /// Fill or stroke, regardless of visibility or paint.
        const ALL = Self::FILL.bits() | Self::STROKE.bits();
    }
}

impl PointerEvents {
    /// Never respond to hit-tests.
    pub const NONE: Self = Self::empty();
}

impl Default for PointerEvents {
    fn default() -> Self {
        Self::VISIBLE_PAINTED
    }
}

/// Per-call context handed to item hooks.
#[derive(Debug, Clone, Copy)]
pub struct ItemContext<'a> {
    /// Effective style, if any style is set in the chain.
    style: Option<&'a Style>,
    /// Line width used when no style sets one.
    pub default_line_width: f64,
    /// Flattening tolerance for curve operations.
    pub tolerance: f64,
    /// Current canvas scale, for items that adapt detail to zoom.
    pub scale: f64,
}

impl<'a> ItemContext<'a> {
    pub(crate) fn new(style: Option<&'a Style>, default_line_width: f64, scale: f64) -> Self {
        Self {
            style,
            default_line_width,
            tolerance: DEFAULT_TOLERANCE,
            scale,
        }
    }

    /// The item's effective style.
    pub fn style(&self) -> &'a Style {
        self.style.unwrap_or_else(|| &*EMPTY_STYLE)
    }
}

/// The contract every canvas item implements.
///
/// Leaf shapes usually only provide [`Item::create_path`]; bounds, painting
/// and hit-testing then all derive from that one path. Items whose geometry
/// is not a static path override the other hooks. Containers return `true`
/// from [`Item::is_container`] and have their children managed by the canvas.
///
/// Paths and bounds are in the item's local space, before its transform.
pub trait Item: Any {
    /// Geometry of the item in local space.
    fn create_path(&self, _cx: &ItemContext) -> BezPath {
        BezPath::new()
    }

    /// Recompute local-space bounds. Called during an update pass.
    fn update(&mut self, cx: &ItemContext) -> Bounds {
        path_bounds(&self.create_path(cx), cx)
    }

    /// Draw the item. The painter is already in the item's local space.
    fn paint(&self, painter: &mut dyn Painter, cx: &ItemContext) -> Result<()> {
        paint_path(&self.create_path(cx), painter, cx)
    }

    /// Does the local-space point hit this item?
    fn is_item_at(&self, p: Point, cx: &ItemContext, events: PointerEvents) -> bool {
        check_in_path(&self.create_path(cx), p, cx, events)
    }

    /// Does this item hold children?
    fn is_container(&self) -> bool {
        false
    }

    /// Extra transform a layout container applies to one of its children,
    /// on top of the container's own transform.
    fn child_transform(&self, _child: ItemId) -> Option<Affine> {
        None
    }

    /// Called when focus navigation lands on this item. Returning `None`
    /// lets the canvas focus the item itself; `Some(found)` reports whether
    /// the item moved focus somewhere on its own.
    fn delegate_focus(&mut self, _direction: FocusDirection) -> Option<bool> {
        None
    }

    /// A short name for debugging output.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// A container that holds an ordered stack of children and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct Group;

impl Item for Group {
    fn is_container(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "group"
    }
}

/// Local-space extents of a path: the fill box united with the stroke box.
///
/// The stroke is always measured, painted or not, so changing only paints
/// never changes bounds. Dash patterns are ignored here.
pub fn path_bounds(path: &BezPath, cx: &ItemContext) -> Bounds {
    if path.elements().is_empty() {
        return Bounds::default();
    }
    let fill = Bounds::from(path.bounding_box());
    let mut stroke = cx.style().stroke_geometry(cx.default_line_width);
    if stroke.width <= 0.0 {
        return fill;
    }
    stroke.dash_pattern = Default::default();
    let outline = kurbo::stroke(path.iter(), &stroke, &StrokeOpts::default(), cx.tolerance);
    if outline.elements().is_empty() {
        return fill;
    }
    fill.union(&Bounds::from(outline.bounding_box()))
}

/// Default leaf painting: fill, then stroke.
pub fn paint_path(path: &BezPath, painter: &mut dyn Painter, cx: &ItemContext) -> Result<()> {
    let style = cx.style();
    if let Some(fill) = style.fill_options() {
        painter.fill(path, &fill)?;
    }
    if let Some(stroke) = style.stroke_options(cx.default_line_width) {
        painter.stroke(path, &stroke)?;
    }
    Ok(())
}

/// Default leaf hit-test against the fill and stroke regions of a path.
pub fn check_in_path(path: &BezPath, p: Point, cx: &ItemContext, events: PointerEvents) -> bool {
    let style = cx.style();
    if events.contains(PointerEvents::FILL)
        && (!events.contains(PointerEvents::PAINTED) || style.has_fill())
        && in_fill(path, p, style.effective_fill_rule())
    {
        return true;
    }
    if events.contains(PointerEvents::STROKE)
        && (!events.contains(PointerEvents::PAINTED) || style.has_stroke())
    {
        let stroke = style.stroke_geometry(cx.default_line_width);
        if stroke.width > 0.0 {
            let outline =
                kurbo::stroke(path.iter(), &stroke, &StrokeOpts::default(), cx.tolerance);
            return outline.winding(p) != 0;
        }
    }
    false
}

/// Is the point inside the path's fill under `rule`? Open subpaths are
/// treated as implicitly closed.
pub fn in_fill(path: &BezPath, p: Point, rule: FillRule) -> bool {
    rule.is_inside(close_subpaths(path).winding(p))
}

/// Copy of `path` with every open subpath closed.
fn close_subpaths(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => {}
        }
        out.push(*el);
    }
    if open {
        out.close_path();
    }
    out
}
