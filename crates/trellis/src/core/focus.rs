//! Directional keyboard focus navigation.
//!
//! A search scores every visible focusable item against the bounds focus is
//! moving away from. Arrow directions prefer items lying along the requested
//! axis; tab directions walk items in reading order.

use kurbo::Point;

use super::{canvas::Canvas, config::TextDirection};
use crate::{ItemId, geom::Bounds};

/// Give up on a focus move after this many delegation retries.
pub const MAX_FOCUS_TRIES: usize = 1000;

/// The direction keyboard focus moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    /// Towards the top.
    Up,
    /// Towards the bottom.
    Down,
    /// Towards the left.
    Left,
    /// Towards the right.
    Right,
    /// Next in reading order.
    TabForward,
    /// Previous in reading order.
    TabBackward,
}

impl FocusDirection {
    /// Where a search starts when nothing is focused, in window pixels of a
    /// viewport `width` by `height`.
    pub fn start_corner(self, text_direction: TextDirection, width: f64, height: f64) -> Point {
        let rtl = text_direction == TextDirection::Rtl;
        match self {
            Self::Down | Self::Right => Point::new(0.0, 0.0),
            Self::Up => Point::new(0.0, height),
            Self::Left => Point::new(width, 0.0),
            Self::TabForward => Point::new(if rtl { width } else { 0.0 }, 0.0),
            Self::TabBackward => Point::new(if rtl { 0.0 } else { width }, height),
        }
    }
}

/// A scored focus candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    /// The item.
    item: ItemId,
    /// Horizontal offset of its centre from the start centre.
    dx: f64,
    /// Vertical offset of its centre from the start centre.
    dy: f64,
    /// Lower is better. Unused by the tab directions.
    score: f64,
}

/// One pass of the focus search.
#[derive(Debug, Clone, Copy)]
pub struct FocusSearch {
    /// Direction of travel.
    direction: FocusDirection,
    /// Reading direction, for the tab directions.
    text_direction: TextDirection,
    /// The item focus is leaving, if any. It is never chosen.
    start_item: Option<ItemId>,
    /// Bounds focus is leaving, in canvas space.
    start: Bounds,
    /// Centre of `start`.
    center: Point,
}

impl FocusSearch {
    /// A search away from `start`.
    pub fn new(
        direction: FocusDirection,
        text_direction: TextDirection,
        start: Bounds,
        start_item: Option<ItemId>,
    ) -> Self {
        Self {
            direction,
            text_direction,
            start_item,
            start,
            center: start.center(),
        }
    }

    /// The best item to focus below `root`, if any.
    pub fn find(&self, canvas: &Canvas, root: ItemId) -> Option<ItemId> {
        let mut best = None;
        self.recurse(canvas, root, &mut best);
        best.map(|c| c.item)
    }

    /// Score `id`, then its children unless the whole subtree can be
    /// ruled out.
    fn recurse(&self, canvas: &Canvas, id: ItemId, best: &mut Option<Candidate>) {
        let Some(node) = canvas.items.get(id) else {
            return;
        };
        let bounds = node.bounds;
        if let Some(candidate) = self.score(id, &bounds, best.as_ref())
            && node.props.can_focus
            && Some(id) != self.start_item
            && canvas.is_visible(id)
        {
            // A focusable container wins over its children.
            *best = Some(candidate);
            return;
        }

        if node.children.is_empty() || self.prune(&bounds) {
            return;
        }
        for &child in &node.children {
            self.recurse(canvas, child, best);
        }
    }

    /// Can no item inside a container with `bounds` lie in the direction of
    /// travel?
    fn prune(&self, bounds: &Bounds) -> bool {
        match self.direction {
            FocusDirection::Up => bounds.y1 > self.start.y2,
            FocusDirection::Down => bounds.y2 < self.start.y1,
            FocusDirection::Left => bounds.x1 > self.start.x2,
            FocusDirection::Right => bounds.x2 < self.start.x1,
            FocusDirection::TabForward | FocusDirection::TabBackward => false,
        }
    }

    /// Score an item with `bounds`. Returns the candidate if it is admissible
    /// and beats `best`.
    fn score(&self, item: ItemId, bounds: &Bounds, best: Option<&Candidate>) -> Option<Candidate> {
        let c = bounds.center();
        let dx = c.x - self.center.x;
        let dy = c.y - self.center.y;

        // Items overlapping the start along an axis have no offset on it.
        let overlaps_x = bounds.x1 <= self.start.x2 && bounds.x2 >= self.start.x1;
        let overlaps_y = bounds.y1 <= self.start.y2 && bounds.y2 >= self.start.y1;
        let ax = if overlaps_x { 0.0 } else { dx.abs() };
        let ay = if overlaps_y { 0.0 } else { dy.abs() };

        let mut candidate = Candidate {
            item,
            dx,
            dy,
            score: 0.0,
        };
        let rtl = self.text_direction == TextDirection::Rtl;
        let better = match self.direction {
            FocusDirection::Up => {
                if dy >= 0.0 || ax > ay {
                    return None;
                }
                candidate.score = ax * 2.0 + ay;
                best.is_none_or(|b| candidate.score < b.score)
            }
            FocusDirection::Down => {
                if dy <= 0.0 || ax > ay {
                    return None;
                }
                candidate.score = ax + ay;
                best.is_none_or(|b| candidate.score < b.score)
            }
            FocusDirection::Left => {
                if dx >= 0.0 || ay > ax {
                    return None;
                }
                candidate.score = ay * 2.0 + ax;
                best.is_none_or(|b| candidate.score < b.score)
            }
            FocusDirection::Right => {
                if dx <= 0.0 || ay > ax {
                    return None;
                }
                candidate.score = ay * 2.0 + ax;
                best.is_none_or(|b| candidate.score < b.score)
            }
            FocusDirection::TabForward => {
                // Reading order: rows downwards, then along the row.
                let backwards_in_row = if rtl { dx > 0.0 } else { dx < 0.0 };
                if dy < 0.0 || (dy == 0.0 && backwards_in_row) {
                    return None;
                }
                best.is_none_or(|b| {
                    dy < b.dy || (dy == b.dy && if rtl { dx > b.dx } else { dx < b.dx })
                })
            }
            FocusDirection::TabBackward => {
                let forwards_in_row = if rtl { dx < 0.0 } else { dx > 0.0 };
                if dy > 0.0 || (dy == 0.0 && forwards_in_row) {
                    return None;
                }
                best.is_none_or(|b| {
                    dy > b.dy || (dy == b.dy && if rtl { dx < b.dx } else { dx > b.dx })
                })
            }
        };
        better.then_some(candidate)
    }
}
