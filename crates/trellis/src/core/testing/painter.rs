use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kurbo::{Affine, BezPath, Shape};

use crate::{
    error::Result,
    geom::Bounds,
    paint::Painter,
    style::{Color, FillOptions, FillRule, StrokeOptions},
};

/// One recorded painter call. Geometry is recorded in device space, with
/// the transform current at the time of the call applied.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    /// A state push.
    Save,
    /// A state pop.
    Restore,
    /// A transform composed onto the current one.
    Transform(Affine),
    /// A clip, by device-space bounding box.
    Clip(Bounds),
    /// A fill, by device-space bounding box.
    Fill(Bounds, Color),
    /// A stroke, by device-space bounding box of the centreline.
    Stroke(Bounds, Color),
}

/// Everything a [`RecordingPainter`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct PaintLog {
    /// Calls in order.
    pub ops: Vec<PaintOp>,
}

impl PaintLog {
    /// Device-space bounds of every fill, in paint order.
    pub fn fills(&self) -> Vec<Bounds> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Fill(b, _) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Colors of every fill, in paint order.
    pub fn fill_colors(&self) -> Vec<Color> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Fill(_, c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Number of strokes.
    pub fn strokes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, PaintOp::Stroke(..))).count()
    }

    /// Does every save have a matching restore?
    pub fn balanced(&self) -> bool {
        let mut depth = 0i64;
        for op in &self.ops {
            match op {
                PaintOp::Save => depth += 1,
                PaintOp::Restore => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }
}

/// A painter that records calls instead of drawing.
pub struct RecordingPainter {
    /// Shared log of calls.
    pub log: Arc<Mutex<PaintLog>>,
    /// Current transform.
    current: Affine,
    /// Saved transforms.
    stack: Vec<Affine>,
}

impl RecordingPainter {
    /// A painter and a handle on its log that outlives it.
    pub fn create() -> (Arc<Mutex<PaintLog>>, Self) {
        let log = Arc::new(Mutex::new(PaintLog::default()));
        let painter = Self {
            log: log.clone(),
            current: Affine::IDENTITY,
            stack: Vec::new(),
        };
        (log, painter)
    }

    /// A copy of the log so far.
    pub fn log(&self) -> PaintLog {
        self.lock().clone()
    }

    /// Lock the log. A poisoned lock still holds a usable log.
    fn lock(&self) -> MutexGuard<'_, PaintLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Device-space bounding box of a local path.
    fn device_bounds(&self, path: &BezPath) -> Bounds {
        Bounds::from((self.current * path.clone()).bounding_box())
    }

    /// Append a call.
    fn push(&self, op: PaintOp) {
        self.lock().ops.push(op);
    }
}

impl Painter for RecordingPainter {
    fn save(&mut self) {
        self.stack.push(self.current);
        self.push(PaintOp::Save);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
        self.push(PaintOp::Restore);
    }

    fn transform(&mut self, affine: Affine) {
        self.current *= affine;
        self.push(PaintOp::Transform(affine));
    }

    fn clip(&mut self, path: &BezPath, _rule: FillRule) -> Result<()> {
        self.push(PaintOp::Clip(self.device_bounds(path)));
        Ok(())
    }

    fn fill(&mut self, path: &BezPath, options: &FillOptions) -> Result<()> {
        self.push(PaintOp::Fill(self.device_bounds(path), options.color));
        Ok(())
    }

    fn stroke(&mut self, path: &BezPath, options: &StrokeOptions) -> Result<()> {
        self.push(PaintOp::Stroke(self.device_bounds(path), options.color));
        Ok(())
    }
}
