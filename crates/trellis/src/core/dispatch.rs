//! Event routing.
//!
//! Events bubble from their target up through its ancestors. Handlers may
//! restructure the tree while an event is in flight, so every step
//! re-checks that the item it is about to visit is still attached.

use std::mem;

use kurbo::Vec2;
use tracing::trace;

use super::{
    canvas::Canvas,
    event::{Event, EventContext, EventOutcome, PointerEvent, PointerInput},
};
use crate::{ItemId, error::Result};

/// The pointer events the canvas synthesizes or forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointerKind {
    /// The pointer entered an item.
    Enter,
    /// The pointer left an item.
    Leave,
    /// The pointer moved.
    Motion,
    /// A button went down.
    Press,
    /// A button came up.
    Release,
}

impl PointerKind {
    /// Is this a crossing event?
    fn is_crossing(self) -> bool {
        matches!(self, Self::Enter | Self::Leave)
    }

    /// Wrap a payload in the matching event.
    fn event(self, p: PointerEvent) -> Event {
        match self {
            Self::Enter => Event::Enter(p),
            Self::Leave => Event::Leave(p),
            Self::Motion => Event::Motion(p),
            Self::Press => Event::ButtonPress(p),
            Self::Release => Event::ButtonRelease(p),
        }
    }
}

/// Deliver `event` to `target` and then its ancestors until one handles it.
///
/// With no target the event goes to the root. Returns true if a handler
/// stopped propagation.
pub(crate) fn propagate(
    canvas: &mut Canvas,
    target: Option<ItemId>,
    event: &Event,
) -> Result<bool> {
    let start = match target {
        Some(item) => {
            if !canvas.is_item_valid(item) {
                trace!(?item, event = event.name(), "dropping event for detached item");
                return Ok(false);
            }
            item
        }
        None => canvas.root,
    };

    let mut current = Some(start);
    while let Some(id) = current {
        if !canvas.is_item_valid(id) {
            trace!(?id, event = event.name(), "ancestor detached mid-emission");
            break;
        }
        if emit(canvas, id, target, event)? == EventOutcome::Handle {
            return Ok(true);
        }
        if !canvas.is_item_valid(id) {
            break;
        }
        current = canvas.items.get(id).and_then(|n| n.parent);
    }
    Ok(false)
}

/// Run the handlers of one item.
///
/// The handlers are taken out of the item for the duration of the call so
/// they can borrow the canvas mutably. Handlers connected during the call
/// are kept, after the existing ones.
fn emit(
    canvas: &mut Canvas,
    id: ItemId,
    target: Option<ItemId>,
    event: &Event,
) -> Result<EventOutcome> {
    let Some(node) = canvas.items.get_mut(id) else {
        return Ok(EventOutcome::Ignore);
    };
    if node.handlers.is_empty() {
        return Ok(EventOutcome::Ignore);
    }
    let mut handlers = mem::take(&mut node.handlers);
    let cx = EventContext { target, current: id };

    let mut result = Ok(EventOutcome::Ignore);
    for handler in &mut handlers {
        match handler(canvas, &cx, event) {
            Ok(EventOutcome::Ignore) => {}
            other => {
                result = other;
                break;
            }
        }
    }

    if let Some(node) = canvas.items.get_mut(id) {
        let added = mem::take(&mut node.handlers);
        handlers.extend(added);
        node.handlers = handlers;
    }
    result
}

/// Send a pointer event to the item under the pointer, or to the grab
/// holder while a grab is active.
pub(crate) fn emit_pointer_event(
    canvas: &mut Canvas,
    kind: PointerKind,
    input: &PointerInput,
) -> Result<bool> {
    let mut target = canvas.interaction.pointer_item;
    if let Some(grab) = canvas.interaction.pointer_grab_item {
        // Only the grab holder sees crossing events while it holds the grab.
        if kind.is_crossing() && canvas.interaction.pointer_item != Some(grab) {
            return Ok(false);
        }
        target = Some(grab);
    }
    if let Some(item) = target
        && !canvas.is_item_valid(item)
    {
        return Ok(false);
    }

    // Sample the centre of the pixel.
    let canvas_position = canvas.from_pixels(input.position + Vec2::new(0.5, 0.5));
    let position = match target {
        Some(item) => match canvas.convert_to_item_space(item, canvas_position) {
            Ok(p) => p,
            Err(e) => {
                trace!(?item, error = %e, "cannot map pointer into item space");
                return Ok(false);
            }
        },
        None => canvas_position,
    };

    let event = kind.event(PointerEvent {
        position,
        canvas_position,
        button: input.button,
        time: input.time,
        mods: input.mods,
    });
    propagate(canvas, target, &event)
}

/// Work out which item is under the pointer and synthesize leave and enter
/// events if it changed.
///
/// `input` records a fresh pointer position. Without one the last known
/// position is reused, which is how the canvas notices items moving under a
/// stationary pointer after an update.
pub(crate) fn update_pointer_item(canvas: &mut Canvas, input: Option<&PointerInput>) -> Result<()> {
    if let Some(input) = input {
        canvas.interaction.crossing = *input;
    }
    let crossing = canvas.interaction.crossing;

    let new_item = if canvas.interaction.pointer_inside {
        canvas.pick(canvas.from_pixels(crossing.position), true)
    } else {
        None
    };

    if new_item == canvas.interaction.pointer_item {
        return Ok(());
    }

    if canvas.interaction.pointer_item.is_some() {
        emit_pointer_event(canvas, PointerKind::Leave, &crossing)?;
    }

    let Some(new_item) = new_item else {
        canvas.interaction.pointer_item = None;
        return Ok(());
    };
    // A leave handler may have removed the new item.
    if !canvas.is_item_valid(new_item) {
        canvas.interaction.pointer_item = None;
        return Ok(());
    }

    trace!(item = ?new_item, "pointer item changed");
    canvas.interaction.pointer_item = Some(new_item);
    emit_pointer_event(canvas, PointerKind::Enter, &crossing)?;
    Ok(())
}
