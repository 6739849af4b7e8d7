use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape};
use trellis::{
    item::{Item, ItemContext},
    model::ItemModel,
};

/// An axis-aligned ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseItem {
    /// Centre in local space.
    pub center: Point,
    /// Horizontal radius.
    pub rx: f64,
    /// Vertical radius.
    pub ry: f64,
}

impl EllipseItem {
    /// An ellipse centred on `(cx, cy)`.
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self {
            center: Point::new(cx, cy),
            rx,
            ry,
        }
    }
}

impl Item for EllipseItem {
    fn create_path(&self, cx: &ItemContext) -> BezPath {
        Ellipse::new(self.center, (self.rx, self.ry), 0.0).to_path(cx.tolerance)
    }

    fn name(&self) -> &'static str {
        "ellipse"
    }
}

/// A rectangular tile, optionally with rounded corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileItem {
    /// The tile in local space.
    pub rect: Rect,
    /// Corner radius; zero gives square corners.
    pub radius: f64,
}

impl TileItem {
    /// A square-cornered tile with its top left corner at `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(x, y, x + width, y + height),
            radius: 0.0,
        }
    }

    /// Round the corners by `radius`.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

impl Item for TileItem {
    fn create_path(&self, cx: &ItemContext) -> BezPath {
        if self.radius > 0.0 {
            RoundedRect::from_rect(self.rect, self.radius).to_path(cx.tolerance)
        } else {
            self.rect.to_path(0.0)
        }
    }

    fn name(&self) -> &'static str {
        "tile"
    }
}

/// Model for a [`TileItem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileModel(pub TileItem);

impl ItemModel for TileModel {
    fn create_item(&self) -> Box<dyn Item> {
        Box::new(self.0)
    }

    fn name(&self) -> &'static str {
        "tile"
    }
}
