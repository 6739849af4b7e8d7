use std::{cell::RefCell, rc::Rc};

use trellis::{
    Canvas, ItemId, ModelId, Result,
    geom::Bounds,
    item::{Group, Visibility},
    model::{ModelTree, SharedModel},
    scheduler::ManualScheduler,
    style::{Color, Style},
    testing::{EventRecorder, RectItem, RectModel},
};

/// A root group holding a rectangle and a group with a second rectangle.
struct Scene {
    tree: SharedModel,
    root: ModelId,
    rect: ModelId,
    group: ModelId,
    inner: ModelId,
}

fn scene() -> Result<Scene> {
    let mut tree = ModelTree::new();
    let root = tree.create_group();
    let rect = tree.create(RectModel::new(0.0, 0.0, 10.0, 10.0));
    let group = tree.create_group();
    let inner = tree.create(RectModel::new(20.0, 20.0, 10.0, 10.0));
    tree.add_child(root, rect, None)?;
    tree.add_child(root, group, None)?;
    tree.add_child(group, inner, None)?;
    Ok(Scene {
        tree: tree.shared(),
        root,
        rect,
        group,
        inner,
    })
}

/// Edit the shared tree.
fn edit<R>(tree: &SharedModel, f: impl FnOnce(&mut ModelTree) -> Result<R>) -> Result<R> {
    f(&mut tree.write().unwrap())
}

fn item(canvas: &Canvas, model: ModelId) -> ItemId {
    canvas.item_for_model(model).unwrap()
}

#[test]
fn a_model_tree_is_materialized_item_by_item() -> Result<()> {
    let s = scene()?;
    let mut canvas = Canvas::new();
    let created = Rc::new(RefCell::new(Vec::new()));
    let log = created.clone();
    canvas.connect_item_created(move |_, item, model| {
        log.borrow_mut().push((item, model));
        Ok(())
    });

    let root = canvas.set_root_item_model(s.tree.clone(), s.root)?;
    assert_eq!(canvas.root(), root);
    assert_eq!(canvas.root_item_model(), Some(s.root));
    assert!(canvas.model_tree().is_some());
    assert_eq!(created.borrow().len(), 4);

    let rect = item(&canvas, s.rect);
    let group = item(&canvas, s.group);
    let inner = item(&canvas, s.inner);
    assert_eq!(canvas.children(root), &[rect, group]);
    assert_eq!(canvas.children(group), &[inner]);
    assert_eq!(canvas.model_for_item(inner), Some(s.inner));
    assert!(canvas.item::<Group>(group).is_some());
    assert_eq!(
        canvas.item::<RectItem>(inner).map(|r| r.rect),
        Some(RectItem::new(20.0, 20.0, 10.0, 10.0).rect)
    );
    assert!(created.borrow().contains(&(inner, s.inner)));
    Ok(())
}

#[test]
fn structural_changes_follow_the_model() -> Result<()> {
    let s = scene()?;
    let mut canvas = Canvas::new();
    let created = Rc::new(RefCell::new(Vec::new()));
    let log = created.clone();
    canvas.connect_item_created(move |_, _, model| {
        log.borrow_mut().push(model);
        Ok(())
    });
    let root = canvas.set_root_item_model(s.tree.clone(), s.root)?;
    created.borrow_mut().clear();

    let extra = edit(&s.tree, |t| {
        let extra = t.create(RectModel::new(40.0, 0.0, 10.0, 10.0));
        t.add_child(s.root, extra, Some(0))?;
        Ok(extra)
    })?;
    canvas.update()?;
    let extra_item = item(&canvas, extra);
    assert_eq!(canvas.children(root)[0], extra_item);
    assert_eq!(*created.borrow(), vec![extra]);

    edit(&s.tree, |t| t.move_child(s.root, 0, 2))?;
    canvas.update()?;
    assert_eq!(
        canvas.children(root),
        &[item(&canvas, s.rect), item(&canvas, s.group), extra_item]
    );

    let group_item = item(&canvas, s.group);
    let inner_item = item(&canvas, s.inner);
    edit(&s.tree, |t| t.delete(s.group))?;
    canvas.update()?;
    assert!(!canvas.contains(group_item));
    assert!(!canvas.contains(inner_item));
    assert_eq!(canvas.item_for_model(s.inner), None);
    assert_eq!(canvas.children(root).len(), 2);
    Ok(())
}

#[test]
fn reparenting_in_one_batch_keeps_the_item() -> Result<()> {
    let s = scene()?;
    let mut canvas = Canvas::new();
    let root = canvas.set_root_item_model(s.tree.clone(), s.root)?;
    let inner = item(&canvas, s.inner);
    let rec = EventRecorder::new();
    rec.attach(&mut canvas, inner)?;

    edit(&s.tree, |t| {
        t.remove(s.inner)?;
        t.add_child(s.root, s.inner, None)
    })?;
    canvas.update()?;
    assert_eq!(item(&canvas, s.inner), inner);
    assert_eq!(canvas.parent(inner), Some(root));
    assert!(canvas.children(item(&canvas, s.group)).is_empty());

    // Handlers survive the move.
    canvas.grab_focus(inner)?;
    assert_eq!(rec.names(), vec!["focus-in"]);
    Ok(())
}

#[test]
fn property_and_data_changes_reach_the_items() -> Result<()> {
    let s = scene()?;
    let mut canvas = Canvas::new();
    canvas.set_root_item_model(s.tree.clone(), s.root)?;
    let rect = item(&canvas, s.rect);
    let group = item(&canvas, s.group);

    edit(&s.tree, |t| {
        t.set_style(s.rect, Some(Style::new().with_fill(Color::RED).with_line_width(0.0)))?;
        t.update_data::<RectModel>(s.rect, |m| m.0.rect.x1 = 50.0)
    })?;
    assert_eq!(canvas.bounds(rect)?, Bounds::new(0.0, 0.0, 50.0, 10.0));

    edit(&s.tree, |t| t.translate(s.group, 100.0, 0.0))?;
    canvas.update()?;
    assert!(canvas.transform(group)?.is_some());
    // The inner rectangle is stroked one unit past its edge.
    assert!((canvas.bounds(group)?.x1 - 119.0).abs() < 1e-9);

    edit(&s.tree, |t| t.set_visibility(s.rect, Visibility::Hidden))?;
    canvas.update()?;
    assert_eq!(canvas.props(rect)?.visibility, Visibility::Hidden);
    assert!(!canvas.is_visible(rect));

    assert!(edit(&s.tree, |t| t.update_data::<RectModel>(s.group, |_| ())).is_err());
    Ok(())
}

#[test]
fn model_edits_schedule_a_deferred_pass() -> Result<()> {
    let s = scene()?;
    let scheduler = ManualScheduler::new();
    let mut canvas = Canvas::new().with_scheduler(scheduler.clone());
    canvas.set_root_item_model(s.tree.clone(), s.root)?;
    canvas.flush()?;
    canvas.take_damage();
    assert!(!canvas.needs_update());
    let before = scheduler.scheduled();

    edit(&s.tree, |t| t.translate(s.rect, 50.0, 50.0))?;
    assert_eq!(scheduler.scheduled(), before + 1);
    assert!(canvas.needs_update());

    edit(&s.tree, |t| t.translate(s.rect, 1.0, 0.0))?;
    assert_eq!(scheduler.scheduled(), before + 1);

    canvas.flush()?;
    assert!(!canvas.needs_update());
    assert!(!canvas.take_damage().is_empty());
    assert_eq!(scheduler.scheduled(), before + 1);

    edit(&s.tree, |t| t.set_visibility(s.inner, Visibility::Hidden))?;
    assert_eq!(scheduler.scheduled(), before + 2);
    Ok(())
}

#[test]
fn the_same_model_drives_several_canvases() -> Result<()> {
    let s = scene()?;
    let mut one = Canvas::new();
    let mut two = Canvas::new();
    one.set_root_item_model(s.tree.clone(), s.root)?;
    two.set_root_item_model(s.tree.clone(), s.root)?;

    edit(&s.tree, |t| t.update_data::<RectModel>(s.rect, |m| m.0.rect.y1 = 30.0))?;
    let in_one = one.bounds(item(&one, s.rect))?;
    let in_two = two.bounds(item(&two, s.rect))?;
    assert_eq!(in_one, in_two);
    assert!(in_one.y2 > 30.0);
    Ok(())
}
