use std::{cell::Cell, rc::Rc};

use kurbo::Point;
use tracing::debug;
use trellis::{
    Canvas, ItemId, Result,
    event::{Button, Event, EventOutcome},
    grab::GrabStatus,
};

/// Tracks an item's drag state.
#[derive(Debug, Clone, Default)]
pub struct DragHandle {
    /// Canvas position of the last pointer event while dragging.
    last: Rc<Cell<Option<Point>>>,
}

impl DragHandle {
    /// Is a drag in progress?
    pub fn dragging(&self) -> bool {
        self.last.get().is_some()
    }
}

/// Let the left button drag `item` around.
///
/// Pointer deltas are applied in canvas units, so this suits items whose
/// ancestors are untransformed.
pub fn make_draggable(canvas: &mut Canvas, item: ItemId) -> Result<DragHandle> {
    let handle = DragHandle::default();
    let last = handle.last.clone();
    canvas.connect(item, move |canvas, cx, event| match event {
        Event::ButtonPress(p) if p.button == Some(Button::Left) => {
            let status = canvas.pointer_grab(cx.current, p.time)?;
            if status == GrabStatus::Success {
                debug!(item = ?cx.current, "drag start");
                last.set(Some(p.canvas_position));
            }
            Ok(EventOutcome::Handle)
        }
        Event::Motion(p) => {
            let Some(prev) = last.get() else {
                return Ok(EventOutcome::Ignore);
            };
            let delta = p.canvas_position - prev;
            canvas.translate(cx.current, delta.x, delta.y)?;
            last.set(Some(p.canvas_position));
            Ok(EventOutcome::Handle)
        }
        Event::ButtonRelease(p) if p.button == Some(Button::Left) && last.get().is_some() => {
            last.set(None);
            canvas.pointer_ungrab(cx.current, p.time)?;
            debug!(item = ?cx.current, "drag end");
            Ok(EventOutcome::Handle)
        }
        _ => Ok(EventOutcome::Ignore),
    })?;
    Ok(handle)
}
