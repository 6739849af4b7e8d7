//! Update, hit-test and paint benchmarks over a large scene.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trellis::{
    AreaQuery, Canvas, ItemId,
    geom::{Bounds, PixelRect},
    item::Group,
    style::{Color, Style},
    testing::{RecordingPainter, RectItem},
};

/// Groups along each axis.
const GRID: usize = 20;
/// Rectangles per group.
const PER_GROUP: usize = 25;

/// Build a canvas holding a grid of groups, each a small grid of filled
/// rectangles. Returns the canvas and the groups.
fn scene() -> (Canvas, Vec<ItemId>) {
    let mut canvas = Canvas::new();
    canvas.set_bounds(0.0, 0.0, 2000.0, 2000.0);
    canvas.set_allocation(800, 600);
    let root = canvas.root();
    let style = Style::new().with_fill(Color::BLUE).with_line_width(1.0);
    let mut groups = Vec::new();
    for gy in 0..GRID {
        for gx in 0..GRID {
            let group = canvas.add(root, Group).expect("add group");
            canvas
                .translate(group, gx as f64 * 100.0, gy as f64 * 100.0)
                .expect("translate");
            for i in 0..PER_GROUP {
                let x = (i % 5) as f64 * 20.0;
                let y = (i / 5) as f64 * 20.0;
                let r = canvas
                    .add(group, RectItem::new(x, y, 15.0, 15.0))
                    .expect("add rect");
                canvas.set_style(r, Some(style.clone())).expect("style");
            }
            groups.push(group);
        }
    }
    canvas.update().expect("update");
    (canvas, groups)
}

/// Benchmark recomputing bounds after moving a handful of groups.
fn benchmark_update(c: &mut Criterion) {
    let (mut canvas, groups) = scene();
    c.bench_function("update_after_moves", |b| {
        b.iter(|| {
            for group in groups.iter().step_by(37) {
                canvas.translate(*group, 1.0, 0.0).expect("translate");
            }
            canvas.update().expect("update");
            black_box(canvas.take_damage());
        });
    });

    c.bench_function("root_transform_update", |b| {
        b.iter(|| {
            let root = canvas.root();
            canvas.translate(root, 0.0, 0.0).expect("translate");
            canvas.update().expect("update");
            black_box(canvas.take_damage());
        });
    });
}

/// Benchmark point and area queries.
fn benchmark_queries(c: &mut Criterion) {
    let (mut canvas, _) = scene();
    c.bench_function("get_item_at", |b| {
        let mut n = 0u32;
        b.iter(|| {
            n = n.wrapping_add(7919);
            let x = f64::from(n % 2000);
            let y = f64::from((n / 2000) % 2000);
            black_box(canvas.get_item_at(x, y, true).expect("query"));
        });
    });

    c.bench_function("get_items_in_area", |b| {
        let area = Bounds::new(250.0, 250.0, 750.0, 750.0);
        b.iter(|| {
            black_box(
                canvas
                    .get_items_in_area(&area, AreaQuery::inside().allow_overlap())
                    .expect("query"),
            );
        });
    });
}

/// Benchmark painting one viewport's worth of the scene.
fn benchmark_paint(c: &mut Criterion) {
    let (mut canvas, _) = scene();
    c.bench_function("paint_viewport", |b| {
        b.iter(|| {
            let (log, mut painter) = RecordingPainter::create();
            canvas
                .paint(&mut painter, PixelRect::new(0, 0, 800, 600))
                .expect("paint");
            black_box(log);
        });
    });
}

criterion_group!(benches, benchmark_update, benchmark_queries, benchmark_paint);
criterion_main!(benches);
