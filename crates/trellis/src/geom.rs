//! Geometry primitives shared by the canvas and its items.
//!
//! Transforms, points and paths come straight from [`kurbo`]; this module adds
//! the axis-aligned [`Bounds`] type that the update, paint and hit-testing
//! pipelines trade in, and the integer [`PixelRect`] used for damage regions.

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

pub use kurbo::{BezPath, Shape};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// An axis-aligned rectangle given by its two corners.
///
/// Bounds are stored in whatever space the caller states: items keep theirs in
/// canvas units, the canvas itself keeps its extent in canvas units. A bounds
/// with `x1 == x2` or `y1 == y2` is degenerate (empty).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl Bounds {
    /// Construct bounds from corner coordinates.
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Zero-size bounds located at a point.
    pub fn at_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Width of the bounds.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height of the bounds.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Does this bounds have zero (or negative) area?
    pub fn is_empty(&self) -> bool {
        !(self.x1 < self.x2 && self.y1 < self.y2)
    }

    /// The smallest bounds enclosing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Do the two bounds touch or overlap? Shared edges count.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.x1 > other.x2 || self.x2 < other.x1 || self.y1 > other.y2 || self.y2 < other.y1)
    }

    /// Is `other` entirely inside `self`? Shared edges count as inside.
    pub fn contains(&self, other: &Self) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// Is the point inside the bounds, edges included?
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// Intersect with `other`, collapsing to a degenerate bounds at the near
    /// edge when the two do not overlap.
    pub fn clamp_to(&self, other: &Self) -> Self {
        let mut out = Self {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if out.x1 > out.x2 {
            out.x2 = out.x1;
        }
        if out.y1 > out.y2 {
            out.y2 = out.y1;
        }
        out
    }

    /// Map all four corners through `affine` and return their axis-aligned
    /// envelope. Unlike mapping two corners this stays correct under rotation
    /// and skew.
    pub fn transform_envelope(&self, affine: Affine) -> Self {
        let corners = [
            affine * Point::new(self.x1, self.y1),
            affine * Point::new(self.x2, self.y1),
            affine * Point::new(self.x1, self.y2),
            affine * Point::new(self.x2, self.y2),
        ];
        let mut out = Self::at_point(corners[0]);
        for c in &corners[1..] {
            out.x1 = out.x1.min(c.x);
            out.y1 = out.y1.min(c.y);
            out.x2 = out.x2.max(c.x);
            out.y2 = out.y2.max(c.y);
        }
        out
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

impl From<Bounds> for Rect {
    fn from(b: Bounds) -> Self {
        Self::new(b.x1, b.y1, b.x2, b.y2)
    }
}

/// An integer rectangle in device pixels, used for damage regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelRect {
    /// Construct a pixel rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// The smallest rectangle enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Does this rectangle fully cover `other`?
    pub fn covers(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Invert an affine transform, returning `None` when it is singular.
pub fn invert(affine: Affine) -> Option<Affine> {
    if affine.determinant().abs() < SINGULAR_EPSILON {
        None
    } else {
        Some(affine.inverse())
    }
}
