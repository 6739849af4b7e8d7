use kurbo::{BezPath, Point, Rect, Shape};

use crate::{
    item::{Item, ItemContext},
    model::ItemModel,
};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectItem {
    /// The rectangle in local space.
    pub rect: Rect,
}

impl RectItem {
    /// A rectangle with its top left corner at `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(x, y, x + width, y + height),
        }
    }
}

impl Item for RectItem {
    fn create_path(&self, _cx: &ItemContext) -> BezPath {
        self.rect.to_path(0.0)
    }

    fn name(&self) -> &'static str {
        "rect"
    }
}

/// An open or closed polyline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolylineItem {
    /// Vertices in local space.
    pub points: Vec<Point>,
    /// Join the last vertex back to the first.
    pub closed: bool,
}

impl PolylineItem {
    /// A polyline through `points`.
    pub fn new(points: impl IntoIterator<Item = Point>, closed: bool) -> Self {
        Self {
            points: points.into_iter().collect(),
            closed,
        }
    }
}

impl Item for PolylineItem {
    fn create_path(&self, _cx: &ItemContext) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            path.move_to(*first);
            for p in points {
                path.line_to(*p);
            }
            if self.closed {
                path.close_path();
            }
        }
        path
    }

    fn name(&self) -> &'static str {
        "polyline"
    }
}

/// Model for a [`RectItem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectModel(pub RectItem);

impl RectModel {
    /// A rectangle model with its top left corner at `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self(RectItem::new(x, y, width, height))
    }
}

impl ItemModel for RectModel {
    fn create_item(&self) -> Box<dyn Item> {
        Box::new(self.0)
    }

    fn name(&self) -> &'static str {
        "rect"
    }
}

/// Model for a [`PolylineItem`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolylineModel(pub PolylineItem);

impl ItemModel for PolylineModel {
    fn create_item(&self) -> Box<dyn Item> {
        Box::new(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "polyline"
    }
}
