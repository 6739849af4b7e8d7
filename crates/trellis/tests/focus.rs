use std::{cell::Cell, rc::Rc};

use trellis::{
    Canvas, ItemId, Result,
    event::{EventOutcome, KeyCode, Modifiers},
    focus::{FocusDirection, MAX_FOCUS_TRIES},
    geom::PixelRect,
    item::{Item, Visibility},
    testing::{EventRecorder, RectItem},
};

fn focusable(canvas: &mut Canvas, x: f64, y: f64) -> Result<ItemId> {
    let root = canvas.root();
    let id = canvas.add(root, RectItem::new(x, y, 10.0, 10.0))?;
    canvas.set_can_focus(id, true)?;
    Ok(id)
}

/// `a` at the origin, `b` to its right and `c` below it.
fn grid() -> Result<(Canvas, ItemId, ItemId, ItemId)> {
    let mut canvas = Canvas::new();
    let a = focusable(&mut canvas, 0.0, 0.0)?;
    let b = focusable(&mut canvas, 100.0, 0.0)?;
    let c = focusable(&mut canvas, 0.0, 100.0)?;
    Ok((canvas, a, b, c))
}

#[test]
fn arrows_follow_the_layout() -> Result<()> {
    let (mut canvas, a, b, c) = grid()?;

    assert!(canvas.move_focus(FocusDirection::Right)?);
    assert_eq!(canvas.focused_item(), Some(a));
    assert!(canvas.move_focus(FocusDirection::Right)?);
    assert_eq!(canvas.focused_item(), Some(b));
    assert!(canvas.move_focus(FocusDirection::Down)?);
    assert_eq!(canvas.focused_item(), Some(c));
    assert!(canvas.move_focus(FocusDirection::Up)?);
    assert_eq!(canvas.focused_item(), Some(a));

    // Nothing further up.
    assert!(!canvas.move_focus(FocusDirection::Up)?);
    assert_eq!(canvas.focused_item(), Some(a));
    Ok(())
}

#[test]
fn tab_walks_reading_order() -> Result<()> {
    let (mut canvas, a, b, c) = grid()?;
    let mut order = Vec::new();
    while canvas.move_focus(FocusDirection::TabForward)? {
        order.extend(canvas.focused_item());
    }
    assert_eq!(order, vec![a, b, c]);

    assert!(canvas.move_focus(FocusDirection::TabBackward)?);
    assert_eq!(canvas.focused_item(), Some(b));
    Ok(())
}

#[test]
fn hidden_and_unfocusable_items_are_skipped() -> Result<()> {
    let (mut canvas, a, b, c) = grid()?;
    canvas.grab_focus(a)?;
    canvas.set_visibility(c, Visibility::Hidden)?;
    assert!(!canvas.move_focus(FocusDirection::Down)?);

    canvas.set_can_focus(b, false)?;
    assert!(!canvas.move_focus(FocusDirection::Right)?);
    assert_eq!(canvas.focused_item(), Some(a));
    Ok(())
}

#[test]
fn unhandled_navigation_keys_move_focus() -> Result<()> {
    let (mut canvas, a, b, _) = grid()?;
    let rec = EventRecorder::new();
    rec.attach(&mut canvas, a)?;

    assert!(canvas.key_press(KeyCode::Tab.into(), 0)?);
    assert_eq!(canvas.focused_item(), Some(a));
    assert!(canvas.key_press(KeyCode::Tab.into(), 0)?);
    assert_eq!(canvas.focused_item(), Some(b));
    assert!(canvas.key_press(Modifiers::SHIFT + KeyCode::Tab, 0)?);
    assert_eq!(canvas.focused_item(), Some(a));
    assert_eq!(
        rec.names(),
        vec!["focus-in", "key-press", "focus-out", "focus-in"]
    );

    // Modified arrows are left alone.
    assert!(!canvas.key_press(Modifiers::CTRL + KeyCode::Right, 0)?);
    assert_eq!(canvas.focused_item(), Some(a));

    // A handler that consumes the key keeps focus where it is.
    let (mut canvas, a, _, _) = grid()?;
    EventRecorder::new().attach_with(&mut canvas, a, EventOutcome::Handle)?;
    canvas.grab_focus(a)?;
    assert!(canvas.key_press(KeyCode::Right.into(), 0)?);
    assert_eq!(canvas.focused_item(), Some(a));
    Ok(())
}

#[test]
fn search_starts_from_a_focused_host_widget() -> Result<()> {
    let (mut canvas, _, b, _) = grid()?;
    canvas.set_host_focus_bounds(Some(PixelRect::new(100, 50, 10, 10)));
    assert!(canvas.move_focus(FocusDirection::Up)?);
    assert_eq!(canvas.focused_item(), Some(b));
    Ok(())
}

#[test]
fn focusing_scrolls_the_item_into_view() -> Result<()> {
    let mut canvas = Canvas::new();
    canvas.set_allocation(100, 100);
    let a = focusable(&mut canvas, 0.0, 0.0)?;
    // Stroked, so the bounds are 499..511.
    let far = focusable(&mut canvas, 0.0, 500.0)?;
    canvas.grab_focus(a)?;
    assert!(canvas.move_focus(FocusDirection::Down)?);
    assert_eq!(canvas.focused_item(), Some(far));
    assert_eq!(canvas.viewport().vadjustment.value, 411.0);
    assert_eq!(canvas.viewport().hadjustment.value, 0.0);
    Ok(())
}

/// An item that never accepts focus delegation and has no extent.
struct Stubborn {
    /// Shared count of delegation attempts.
    calls: Rc<Cell<usize>>,
}

impl Item for Stubborn {
    fn delegate_focus(&mut self, _direction: FocusDirection) -> Option<bool> {
        self.calls.set(self.calls.get() + 1);
        Some(false)
    }
}

#[test]
fn search_terminates_when_delegation_always_fails() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let calls = Rc::new(Cell::new(0));
    for _ in 0..3 {
        let id = canvas.add(root, Stubborn { calls: calls.clone() })?;
        canvas.set_can_focus(id, true)?;
    }

    assert!(!canvas.move_focus(FocusDirection::TabForward)?);
    assert_eq!(canvas.focused_item(), None);
    assert_eq!(calls.get(), MAX_FOCUS_TRIES - 1);

    // Zero extent items lie in no arrow direction at all.
    calls.set(0);
    assert!(!canvas.move_focus(FocusDirection::Right)?);
    assert_eq!(calls.get(), 0);
    Ok(())
}
