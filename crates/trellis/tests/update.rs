use std::f64::consts::SQRT_2;

use proptest::prelude::*;

use trellis::{
    Canvas, ItemId, Result,
    geom::{Bounds, PixelRect},
    item::{Group, Visibility},
    scheduler::ManualScheduler,
    style::{Color, Style},
    testing::{RecordingPainter, RectItem, init_logging},
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn assert_bounds(actual: Bounds, expected: Bounds) {
    assert!(
        close(actual.x1, expected.x1)
            && close(actual.y1, expected.y1)
            && close(actual.x2, expected.x2)
            && close(actual.y2, expected.y2),
        "{actual:?} != {expected:?}"
    );
}

fn filled() -> Style {
    Style::new().with_fill(Color::BLUE).with_line_width(0.0)
}

fn rect(canvas: &mut Canvas, parent: ItemId, x: f64, y: f64, w: f64, h: f64) -> Result<ItemId> {
    let id = canvas.add(parent, RectItem::new(x, y, w, h))?;
    canvas.set_style(id, Some(filled()))?;
    Ok(id)
}

/// The pixel rectangle the canvas damages for canvas-space bounds at scale 1
/// with no offsets.
fn damage_for(b: Bounds) -> PixelRect {
    let x = (b.x1 - 1.0) as i32;
    let y = (b.y1 - 1.0) as i32;
    PixelRect::new(x, y, (b.x2 - f64::from(x) + 3.0) as i32, (b.y2 - f64::from(y) + 3.0) as i32)
}

#[test]
fn group_bounds_are_the_union_of_children() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let group = canvas.add(root, Group)?;
    assert!(canvas.bounds(group)?.is_empty());

    rect(&mut canvas, group, 10.0, 10.0, 20.0, 20.0)?;
    rect(&mut canvas, group, 50.0, 0.0, 10.0, 5.0)?;
    // Empty children do not stretch the union.
    let empty = rect(&mut canvas, group, 500.0, 500.0, 0.0, 0.0)?;
    assert!(canvas.bounds(empty)?.is_empty());
    assert_eq!(canvas.bounds(group)?, Bounds::new(10.0, 0.0, 60.0, 30.0));
    assert_eq!(canvas.bounds(root)?, Bounds::new(10.0, 0.0, 60.0, 30.0));

    canvas.translate(group, 100.0, 0.0)?;
    assert_eq!(canvas.bounds(group)?, Bounds::new(110.0, 0.0, 160.0, 30.0));
    Ok(())
}

#[test]
fn stroke_widens_bounds() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let r = canvas.add(root, RectItem::new(10.0, 10.0, 20.0, 20.0))?;
    // Unstyled items stroke with the default two unit line.
    assert_bounds(canvas.bounds(r)?, Bounds::new(9.0, 9.0, 31.0, 31.0));
    canvas.update_style(r, |s| s.line_width = Some(6.0))?;
    assert_bounds(canvas.bounds(r)?, Bounds::new(7.0, 7.0, 33.0, 33.0));
    Ok(())
}

#[test]
fn style_inherits_through_groups() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let group = canvas.add(root, Group)?;
    canvas.set_style(group, Some(Style::new().with_line_width(10.0)))?;
    let r = canvas.add(group, RectItem::new(0.0, 0.0, 10.0, 10.0))?;
    assert_bounds(canvas.bounds(r)?, Bounds::new(-5.0, -5.0, 15.0, 15.0));

    canvas.set_style(group, Some(Style::new().with_line_width(2.0)))?;
    assert_bounds(canvas.bounds(r)?, Bounds::new(-1.0, -1.0, 11.0, 11.0));
    Ok(())
}

#[test]
fn rotation_gives_the_rotated_envelope() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let r = rect(&mut canvas, root, 0.0, 0.0, 100.0, 100.0)?;
    canvas.rotate(r, 45.0, 50.0, 50.0)?;

    let b = canvas.bounds(r)?;
    assert!(close(b.width(), 100.0 * SQRT_2));
    assert!(close(b.height(), 100.0 * SQRT_2));
    assert!(close(b.center().x, 50.0));
    assert!(close(b.center().y, 50.0));
    Ok(())
}

#[test]
fn geometry_changes_damage_old_and_new_areas() -> Result<()> {
    init_logging();
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let r = rect(&mut canvas, root, 10.0, 10.0, 20.0, 20.0)?;
    canvas.update()?;
    canvas.take_damage();

    let steps: [fn(&mut Canvas, ItemId) -> Result<()>; 3] = [
        |c, r| c.translate(r, 5.0, 0.0),
        |c, r| c.scale(r, 2.0, 1.0),
        |c, r| c.with_item::<RectItem, _>(r, |i| i.rect.y1 += 7.0),
    ];
    for step in steps {
        let old = canvas.bounds(r)?;
        canvas.take_damage();
        step(&mut canvas, r)?;
        canvas.update()?;
        let new = canvas.bounds(r)?;
        assert_ne!(old, new);
        assert_eq!(canvas.take_damage(), vec![damage_for(old), damage_for(new)]);
    }
    Ok(())
}

#[test]
fn paint_only_changes_damage_without_recompute() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let r = rect(&mut canvas, root, 10.0, 10.0, 20.0, 20.0)?;
    canvas.update()?;
    canvas.take_damage();

    canvas.set_visibility(r, Visibility::Hidden)?;
    assert!(!canvas.needs_update());
    assert_eq!(canvas.take_damage(), vec![damage_for(Bounds::new(10.0, 10.0, 30.0, 30.0))]);
    Ok(())
}

#[test]
fn updates_coalesce_into_one_scheduled_pass() -> Result<()> {
    let scheduler = ManualScheduler::new();
    let mut canvas = Canvas::new().with_scheduler(scheduler.clone());
    let root = canvas.root();
    let r = rect(&mut canvas, root, 0.0, 0.0, 10.0, 10.0)?;
    canvas.translate(r, 1.0, 1.0)?;
    canvas.scale(r, 2.0, 2.0)?;
    assert_eq!(scheduler.scheduled(), 1);
    assert!(canvas.needs_update());

    canvas.flush()?;
    assert!(!canvas.needs_update());
    assert_eq!(canvas.bounds(r)?, Bounds::new(1.0, 1.0, 21.0, 21.0));

    canvas.translate(r, 1.0, 0.0)?;
    assert_eq!(scheduler.scheduled(), 2);
    Ok(())
}

#[test]
fn paint_walks_bottom_to_top_and_culls() -> Result<()> {
    let mut canvas = Canvas::new();
    canvas.set_allocation(400, 400);
    let root = canvas.root();
    let low = rect(&mut canvas, root, 0.0, 0.0, 50.0, 50.0)?;
    let high = rect(&mut canvas, root, 25.0, 25.0, 50.0, 50.0)?;
    let far = rect(&mut canvas, root, 300.0, 300.0, 10.0, 10.0)?;
    canvas.update_style(low, |s| s.fill = Some(Color::RED.into()))?;
    canvas.update_style(high, |s| s.fill = Some(Color::GREEN.into()))?;
    canvas.update_style(far, |s| s.fill = Some(Color::BLUE.into()))?;

    let (_, mut painter) = RecordingPainter::create();
    canvas.paint(&mut painter, PixelRect::new(0, 0, 100, 100))?;
    let log = painter.log();
    assert_eq!(log.fill_colors(), vec![Color::RED, Color::GREEN]);
    assert!(log.balanced());

    canvas.set_visibility(high, Visibility::VisibleAboveThreshold)?;
    canvas.update_props(high, false, |p| p.visibility_threshold = 2.0)?;
    let (_, mut painter) = RecordingPainter::create();
    canvas.paint(&mut painter, PixelRect::new(0, 0, 400, 400))?;
    assert_eq!(painter.log().fill_colors(), vec![Color::RED, Color::BLUE]);

    canvas.set_scale(2.0)?;
    let (_, mut painter) = RecordingPainter::create();
    canvas.paint(&mut painter, PixelRect::new(0, 0, 800, 800))?;
    let log = painter.log();
    assert_eq!(log.fill_colors(), vec![Color::RED, Color::GREEN, Color::BLUE]);
    // The painter was scaled to device pixels.
    assert_eq!(log.fills()[0], Bounds::new(0.0, 0.0, 100.0, 100.0));
    Ok(())
}

#[test]
fn render_clips_to_the_requested_area() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    rect(&mut canvas, root, 0.0, 0.0, 10.0, 10.0)?;
    rect(&mut canvas, root, 500.0, 500.0, 10.0, 10.0)?;

    let (_, mut painter) = RecordingPainter::create();
    canvas.render(&mut painter, Some(&Bounds::new(0.0, 0.0, 100.0, 100.0)), 1.0)?;
    let log = painter.log();
    assert_eq!(log.fills(), vec![Bounds::new(0.0, 0.0, 10.0, 10.0)]);
    assert!(log.balanced());

    let (_, mut painter) = RecordingPainter::create();
    canvas.render(&mut painter, None, 1.0)?;
    assert_eq!(painter.log().fills().len(), 2);
    Ok(())
}

proptest! {
    #[test]
    fn containers_enclose_exactly_their_children(
        groups in prop::collection::vec(
            (
                -200.0..200.0f64,
                -200.0..200.0f64,
                prop::collection::vec(
                    (0.0..300.0f64, 0.0..300.0f64, 1.0..50.0f64, 1.0..50.0f64),
                    0..6,
                ),
            ),
            1..6,
        ),
    ) {
        let mut canvas = Canvas::new();
        let root = canvas.root();
        let mut ids = Vec::new();
        for (tx, ty, rects) in &groups {
            let group = canvas.add(root, Group).unwrap();
            canvas.translate(group, *tx, *ty).unwrap();
            for &(x, y, w, h) in rects {
                rect(&mut canvas, group, x, y, w, h).unwrap();
            }
            ids.push(group);
        }
        canvas.update().unwrap();

        for group in ids.iter().copied().chain([root]) {
            let children = canvas.children(group).to_vec();
            let mut expected: Option<Bounds> = None;
            for child in children {
                let b = canvas.bounds(child).unwrap();
                if !b.is_empty() {
                    expected = Some(expected.map_or(b, |e| e.union(&b)));
                }
            }
            let actual = canvas.bounds(group).unwrap();
            match expected {
                Some(e) => assert_bounds(actual, e),
                None => prop_assert!(actual.is_empty()),
            }
        }
    }
}
