use kurbo::{Affine, BezPath, Point};
use rand::{Rng, SeedableRng, rngs::StdRng};
use trellis::{
    Canvas, ItemId, Result,
    paint::Painter,
    style::{Color, FillOptions, FillRule, StrokeOptions, Style},
};

use crate::shapes::{EllipseItem, TileItem};

/// Fill `canvas` with `count` random rectangles and ellipses inside its
/// bounds. The same seed always builds the same scene.
pub fn build(canvas: &mut Canvas, count: usize, seed: u64) -> Result<Vec<ItemId>> {
    let bounds = canvas.canvas_bounds();
    if bounds.is_empty() {
        return Ok(Vec::new());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let root = canvas.root();
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let x = rng.random_range(bounds.x1..bounds.x2);
        let y = rng.random_range(bounds.y1..bounds.y2);
        let size = rng.random_range(5.0..60.0);
        let color = Color::rgb(rng.random(), rng.random(), rng.random());
        let id = if i % 3 == 0 {
            canvas.add(root, EllipseItem::new(x, y, size / 2.0, size / 3.0))?
        } else {
            canvas.add(root, TileItem::new(x, y, size, size * 0.6))?
        };
        canvas.set_style(id, Some(Style::new().with_fill(color).with_line_width(1.0)))?;
        items.push(id);
    }
    Ok(items)
}

/// Hit-test `samples` random points inside the canvas bounds.
pub fn sample_picks(
    canvas: &mut Canvas,
    samples: usize,
    seed: u64,
) -> Result<Vec<(Point, Option<ItemId>)>> {
    let bounds = canvas.canvas_bounds();
    if bounds.is_empty() {
        return Ok(Vec::new());
    }
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut out = Vec::with_capacity(samples);
    for _ in 0..samples {
        let p = Point::new(
            rng.random_range(bounds.x1..bounds.x2),
            rng.random_range(bounds.y1..bounds.y2),
        );
        out.push((p, canvas.get_item_at(p.x, p.y, true)?));
    }
    Ok(out)
}

/// A painter that only counts what it is asked to draw.
#[derive(Debug, Default)]
pub struct Tally {
    /// Paths filled.
    pub fills: usize,
    /// Paths stroked.
    pub strokes: usize,
    /// Clips applied.
    pub clips: usize,
    /// Open `save` calls.
    pub depth: usize,
}

impl Painter for Tally {
    fn save(&mut self) {
        self.depth += 1;
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn transform(&mut self, _affine: Affine) {}

    fn clip(&mut self, _path: &BezPath, _rule: FillRule) -> Result<()> {
        self.clips += 1;
        Ok(())
    }

    fn fill(&mut self, _path: &BezPath, _options: &FillOptions) -> Result<()> {
        self.fills += 1;
        Ok(())
    }

    fn stroke(&mut self, _path: &BezPath, _options: &StrokeOptions) -> Result<()> {
        self.strokes += 1;
        Ok(())
    }
}
