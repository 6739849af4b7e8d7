/// A painter that records what it is asked to draw.
pub mod painter;
/// Event capture for handler tests.
pub mod recorder;
/// Minimal shape items and their models.
pub mod shapes;

use tracing::Level;

pub use painter::{PaintLog, PaintOp, RecordingPainter};
pub use recorder::{EventRecord, EventRecorder};
pub use shapes::{PolylineItem, PolylineModel, RectItem, RectModel};

/// Route `tracing` output through the test harness's captured writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .without_time()
        .compact()
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Canvas,
        error::Result,
        geom::{Bounds, PixelRect},
        style::{Color, Style},
    };

    #[test]
    fn rect_paints_in_device_space() -> Result<()> {
        init_logging();
        let mut canvas = Canvas::new();
        canvas.set_allocation(200, 200);
        let root = canvas.root();
        let r = canvas.add(root, RectItem::new(10.0, 10.0, 20.0, 20.0))?;
        canvas.set_style(r, Some(Style::new().with_fill(Color::RED).with_line_width(0.0)))?;

        let (_, mut painter) = RecordingPainter::create();
        canvas.paint(&mut painter, PixelRect::new(0, 0, 200, 200))?;

        let log = painter.log();
        assert_eq!(log.fills(), vec![Bounds::new(10.0, 10.0, 30.0, 30.0)]);
        assert!(log.balanced());
        Ok(())
    }
}
