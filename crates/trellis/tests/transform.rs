use kurbo::Point;
use proptest::prelude::*;
use trellis::{
    Canvas, Error, ItemId, Result,
    config::{Allocation, Anchor, CanvasConfig, Units},
    event::ScrollDirection,
    geom::Bounds,
    item::{Group, Visibility},
    style::{Color, Style},
    testing::RectItem,
};

fn close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn nested_transforms_compose_root_to_leaf() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let group = canvas.add(root, Group)?;
    canvas.translate(group, 100.0, 0.0)?;
    canvas.rotate(group, 90.0, 0.0, 0.0)?;
    let child = canvas.add(group, RectItem::new(0.0, 0.0, 1.0, 1.0))?;
    canvas.translate(child, 10.0, 0.0)?;

    // The child's offset is rotated by the group before the group's
    // translation applies.
    let p = canvas.convert_from_item_space(child, Point::new(1.0, 0.0))?;
    assert!(close(p, Point::new(100.0, 11.0)), "{p:?}");
    let back = canvas.convert_to_item_space(child, p)?;
    assert!(close(back, Point::new(1.0, 0.0)), "{back:?}");
    assert!(close(canvas.item_to_canvas(child)? * Point::ORIGIN, Point::new(100.0, 10.0)));
    Ok(())
}

#[test]
fn simple_and_skew_transforms() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let a = canvas.add(root, Group)?;
    canvas.set_simple_transform(a, 10.0, 20.0, 2.0, 90.0)?;
    let p = canvas.convert_from_item_space(a, Point::new(1.0, 0.0))?;
    assert!(close(p, Point::new(10.0, 22.0)), "{p:?}");

    let b = canvas.add(root, Group)?;
    canvas.skew_x(b, 45.0, 0.0, 0.0)?;
    let p = canvas.convert_from_item_space(b, Point::new(0.0, 10.0))?;
    assert!(close(p, Point::new(10.0, 10.0)), "{p:?}");

    canvas.set_transform(b, None)?;
    assert_eq!(canvas.transform(b)?, None);
    assert_eq!(canvas.convert_from_item_space(b, Point::new(3.0, 4.0))?, Point::new(3.0, 4.0));
    Ok(())
}

#[test]
fn singular_transforms_cannot_be_inverted() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let group = canvas.add(root, Group)?;
    let child = canvas.add(group, Group)?;
    canvas.scale(group, 0.0, 1.0)?;

    assert_eq!(
        canvas.convert_to_item_space(child, Point::new(1.0, 1.0)),
        Err(Error::NotInvertible)
    );
    // The forward direction still works.
    assert_eq!(
        canvas.convert_from_item_space(child, Point::new(5.0, 5.0))?,
        Point::new(0.0, 5.0)
    );
    Ok(())
}

/// Build a chain of nested groups from `(tx, ty, degrees, scale)` steps and
/// return the innermost.
fn chain(canvas: &mut Canvas, steps: &[(f64, f64, f64, f64)]) -> Result<ItemId> {
    let mut parent = canvas.root();
    for &(tx, ty, degrees, s) in steps {
        let item = canvas.add(parent, Group)?;
        canvas.translate(item, tx, ty)?;
        canvas.rotate(item, degrees, 0.0, 0.0)?;
        canvas.scale(item, s, s)?;
        parent = item;
    }
    Ok(parent)
}

proptest! {
    #[test]
    fn item_space_round_trips(
        steps in prop::collection::vec(
            (-500.0..500.0f64, -500.0..500.0f64, -360.0..360.0f64, 0.25..4.0f64),
            1..5,
        ),
        x in -1000.0..1000.0f64,
        y in -1000.0..1000.0f64,
    ) {
        let mut canvas = Canvas::new();
        let leaf = chain(&mut canvas, &steps).unwrap();
        let p = Point::new(x, y);
        let there = canvas.convert_from_item_space(leaf, p).unwrap();
        let back = canvas.convert_to_item_space(leaf, there).unwrap();
        prop_assert!(back.distance(p) < 1e-6, "{:?} -> {:?} -> {:?}", p, there, back);
    }
}

#[test]
fn pixel_conversion_follows_scale_and_units() -> Result<()> {
    let mut canvas = Canvas::new();
    assert_eq!(canvas.to_pixels(Point::new(10.0, 20.0)), Point::new(10.0, 20.0));
    canvas.set_scale(2.0)?;
    assert_eq!(canvas.scale_factor(), 2.0);
    assert_eq!(canvas.to_pixels(Point::new(10.0, 20.0)), Point::new(20.0, 40.0));
    assert_eq!(canvas.from_pixels(Point::new(20.0, 40.0)), Point::new(10.0, 20.0));

    assert!(canvas.set_scale(0.0).is_err());
    assert!(canvas.set_scale(f64::NAN).is_err());
    assert_eq!(canvas.scale_factor(), 2.0);

    let mm = Canvas::with_config(CanvasConfig {
        units: Units::Mm,
        ..CanvasConfig::default()
    })?;
    assert!(close(mm.to_pixels(Point::new(25.4, 0.0)), Point::new(96.0, 0.0)));

    canvas.set_bounds(-50.0, -50.0, 50.0, 50.0);
    assert_eq!(canvas.canvas_bounds(), Bounds::new(-50.0, -50.0, 50.0, 50.0));
    assert_eq!(canvas.to_pixels(Point::ORIGIN), Point::new(100.0, 100.0));
    Ok(())
}

#[test]
fn small_canvases_sit_at_their_anchor() -> Result<()> {
    let canvas = Canvas::with_config(CanvasConfig {
        bounds: Bounds::new(0.0, 0.0, 100.0, 100.0),
        anchor: Anchor::Center,
        allocation: Allocation::new(400, 300),
        ..CanvasConfig::default()
    })?;
    assert_eq!((canvas.viewport().x_offset, canvas.viewport().y_offset), (149, 99));
    assert_eq!(canvas.to_pixels(Point::ORIGIN), Point::new(149.0, 99.0));
    assert_eq!(canvas.from_pixels(Point::new(149.0, 99.0)), Point::ORIGIN);
    Ok(())
}

#[test]
fn damage_includes_anchor_offsets() -> Result<()> {
    let mut canvas = Canvas::with_config(CanvasConfig {
        bounds: Bounds::new(0.0, 0.0, 100.0, 100.0),
        anchor: Anchor::Center,
        allocation: Allocation::new(400, 300),
        ..CanvasConfig::default()
    })?;
    let root = canvas.root();
    let r = canvas.add(root, RectItem::new(10.0, 10.0, 10.0, 10.0))?;
    canvas.set_style(r, Some(Style::new().with_fill(Color::BLUE).with_line_width(0.0)))?;
    canvas.update()?;
    canvas.take_damage();

    canvas.set_visibility(r, Visibility::Hidden)?;
    let damage = canvas.take_damage();
    assert_eq!(damage.len(), 1);
    assert_eq!((damage[0].x, damage[0].y), (149 + 9, 99 + 9));
    Ok(())
}

#[test]
fn scrolling_is_clamped_to_the_canvas() {
    let mut canvas = Canvas::new();
    canvas.set_allocation(100, 100);

    canvas.scroll_to(2000.0, -5.0);
    assert_eq!(canvas.viewport().hadjustment.value, 901.0);
    assert_eq!(canvas.viewport().vadjustment.value, 0.0);

    canvas.scroll_to(100.0, 200.0);
    assert_eq!(canvas.from_window_pixels(Point::ORIGIN), Point::new(100.0, 200.0));
}

#[test]
fn wheel_steps_are_the_page_to_the_two_thirds() {
    let mut canvas = Canvas::new();
    canvas.set_allocation(100, 100);
    let step = 100f64.powf(2.0 / 3.0);

    assert!(canvas.scroll(ScrollDirection::Down));
    assert!((canvas.viewport().vadjustment.value - step).abs() < 1e-9);
    canvas.scroll(ScrollDirection::Up);
    canvas.scroll(ScrollDirection::Up);
    assert_eq!(canvas.viewport().vadjustment.value, 0.0);
    canvas.scroll(ScrollDirection::Right);
    assert!((canvas.viewport().hadjustment.value - step).abs() < 1e-9);
}

#[test]
fn zoom_keeps_the_viewport_centre() -> Result<()> {
    let mut canvas = Canvas::new();
    canvas.set_allocation(100, 100);
    let centre = canvas.from_window_pixels(Point::new(50.0, 50.0));

    canvas.set_scale(2.0)?;
    assert_eq!(canvas.viewport().hadjustment.value, 50.0);
    assert_eq!(canvas.viewport().vadjustment.value, 50.0);
    assert!(close(canvas.from_window_pixels(Point::new(50.0, 50.0)), centre));
    Ok(())
}

#[test]
fn scroll_to_item_moves_minimally() -> Result<()> {
    let mut canvas = Canvas::new();
    canvas.set_allocation(100, 100);
    let root = canvas.root();
    let r = canvas.add(root, RectItem::new(500.0, 20.0, 10.0, 10.0))?;
    canvas.set_style(r, Some(Style::new().with_fill(Color::BLUE).with_line_width(0.0)))?;

    canvas.scroll_to_item(r)?;
    assert_eq!(canvas.viewport().hadjustment.value, 410.0);
    // Already visible vertically.
    assert_eq!(canvas.viewport().vadjustment.value, 0.0);
    Ok(())
}
