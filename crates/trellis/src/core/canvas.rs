use std::{
    any::{Any, type_name},
    collections::HashMap,
    mem,
    sync::Arc,
};

use kurbo::{Affine, BezPath, Point, Rect, Shape, Vec2};
use scopeguard::guard;
use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use super::{
    config::{Allocation, CanvasConfig},
    dispatch::{self, PointerKind},
    event::{
        Button, Event, EventContext, EventOutcome, Key, KeyCode, KeyEvent, Modifiers,
        PointerInput, ScrollDirection,
    },
    focus::{FocusDirection, FocusSearch, MAX_FOCUS_TRIES},
    grab::{GrabBackend, GrabStatus, HeadlessGrabs},
    hit::{self, AreaQuery},
    item::{Group, Item, PointerEvents, Visibility},
    model::SharedModel,
    node::{ItemNode, ItemProps},
    paint::{Painter, paint_item},
    scheduler::{ManualScheduler, Scheduler, UpdateWaker},
    style::{FillRule, Style},
    sync::{self, ModelBinding},
    transform,
    update,
    viewport::Viewport,
};
use crate::{
    ItemId, ModelId,
    error::{Error, NodeRef, Result},
    geom::{Bounds, PixelRect},
};

/// A hook run for every item the canvas builds from a model.
pub type ItemCreated = Box<dyn FnMut(&mut Canvas, ItemId, ModelId) -> Result<()>>;

/// Pointer and keyboard interaction state.
///
/// Every reference here is weak: it is checked with
/// [`Canvas::is_item_valid`] before use, and cleared when the item it names
/// is removed from the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Interaction {
    /// Topmost item under the pointer.
    pub(crate) pointer_item: Option<ItemId>,
    /// Item holding the pointer grab.
    pub(crate) pointer_grab_item: Option<ItemId>,
    /// The pointer item when the grab started.
    pub(crate) pointer_grab_initial_item: Option<ItemId>,
    /// Button that started an implicit grab.
    pub(crate) pointer_grab_button: Option<Button>,
    /// Item with keyboard focus.
    pub(crate) focused_item: Option<ItemId>,
    /// Item holding the keyboard grab.
    pub(crate) keyboard_grab_item: Option<ItemId>,
    /// Last pointer input, used to recompute the pointer item.
    pub(crate) crossing: PointerInput,
    /// Is the pointer inside the canvas window?
    pub(crate) pointer_inside: bool,
    /// Does the canvas have keyboard focus in its host?
    pub(crate) has_focus: bool,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            pointer_item: None,
            pointer_grab_item: None,
            pointer_grab_initial_item: None,
            pointer_grab_button: None,
            focused_item: None,
            keyboard_grab_item: None,
            crossing: PointerInput::at(0.0, 0.0),
            pointer_inside: false,
            has_focus: false,
        }
    }
}

/// A retained-mode canvas.
///
/// The canvas owns an arena of items arranged in a tree under a root group,
/// the coordinate system mapping canvas units to pixels, and all pointer and
/// keyboard interaction state. Bounds are recomputed lazily: mutations mark
/// items dirty and ask the [`Scheduler`] for one deferred [`Canvas::flush`].
/// Queries that need fresh bounds bring them up to date first.
pub struct Canvas {
    /// Item storage.
    pub(crate) items: SlotMap<ItemId, ItemNode>,
    /// Root item.
    pub(crate) root: ItemId,
    /// Current configuration.
    pub(crate) config: CanvasConfig,
    /// Pixels per canvas unit horizontally.
    scale_x: f64,
    /// Pixels per canvas unit vertically.
    scale_y: f64,
    /// Window layout and scroll state.
    viewport: Viewport,
    /// Some item needs its bounds recomputed.
    pub(crate) need_update: bool,
    /// Runs deferred updates, shared with subscribed model trees.
    pub(crate) waker: UpdateWaker,
    /// An update loop is running and will pick up new dirtiness itself.
    updating: bool,
    /// Host input grabs.
    grabs: Box<dyn GrabBackend>,
    /// Pixel rectangles needing repaint.
    damage: Vec<PixelRect>,
    /// Pointer and focus state.
    pub(crate) interaction: Interaction,
    /// Model tree shown by the canvas, if any.
    pub(crate) models: Option<ModelBinding>,
    /// Items built from models.
    pub(crate) registry: HashMap<ModelId, ItemId>,
    /// Hooks run for each item built from a model.
    item_created: Vec<ItemCreated>,
    /// Window-pixel bounds of a focused widget outside the canvas.
    host_focus_bounds: Option<PixelRect>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// A canvas with the default configuration and an empty root group.
    pub fn new() -> Self {
        Self::build(CanvasConfig::default())
    }

    /// A canvas with the given configuration.
    pub fn with_config(config: CanvasConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Construct from a validated configuration.
    fn build(config: CanvasConfig) -> Self {
        let mut items = SlotMap::with_key();
        let root = items.insert(ItemNode::new(Box::new(Group)));
        let (scale_x, scale_y) = config.scales();
        let viewport = Viewport {
            allocation: config.allocation,
            ..Viewport::default()
        };
        let mut canvas = Self {
            items,
            root,
            config,
            scale_x,
            scale_y,
            viewport,
            need_update: true,
            waker: UpdateWaker::new(Box::new(ManualScheduler::new())),
            updating: false,
            grabs: Box::new(HeadlessGrabs::new()),
            damage: Vec::new(),
            interaction: Interaction::default(),
            models: None,
            registry: HashMap::new(),
            item_created: Vec::new(),
            host_focus_bounds: None,
        };
        canvas.reconfigure();
        canvas
    }

    /// Use `scheduler` to run deferred updates.
    pub fn with_scheduler(self, scheduler: impl Scheduler + 'static) -> Self {
        self.waker.replace(Box::new(scheduler));
        self
    }

    /// Use `grabs` as the host input grab facility.
    pub fn with_grab_backend(mut self, grabs: impl GrabBackend + 'static) -> Self {
        self.grabs = Box::new(grabs);
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Window layout and scroll state.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Line width used by items whose style does not set one.
    pub fn default_line_width(&self) -> f64 {
        self.config.units.default_line_width()
    }

    // Tree structure

    /// The root item.
    pub fn root(&self) -> ItemId {
        self.root
    }

    /// Replace the displayed tree with `item`, which must be detached. The
    /// old tree is destroyed and any model binding dropped.
    pub fn set_root_item(&mut self, item: ItemId) -> Result<()> {
        let node = self.items.get(item).ok_or(Error::ItemNotFound(item))?;
        if item == self.root {
            return Ok(());
        }
        if node.parent.is_some() {
            return Err(Error::AlreadyAttached(NodeRef::Item(item)));
        }
        self.models = None;
        self.registry.clear();
        self.install_root(item);
        Ok(())
    }

    /// Swap in a new root and schedule a full recompute.
    fn install_root(&mut self, item: ItemId) {
        let old = mem::replace(&mut self.root, item);
        self.destroy_subtree(old);
        if let Some(node) = self.items.get_mut(item) {
            node.need_update = true;
            node.need_entire_subtree_update = true;
        }
        self.request_update();
        self.damage_all();
    }

    /// Create a detached item.
    pub fn create(&mut self, item: impl Item) -> ItemId {
        self.create_boxed(Box::new(item))
    }

    /// Create a detached item from a boxed payload.
    pub fn create_boxed(&mut self, item: Box<dyn Item>) -> ItemId {
        self.items.insert(ItemNode::new(item))
    }

    /// Create a detached item with initial properties.
    pub fn create_with(&mut self, item: impl Item, props: ItemProps) -> ItemId {
        let mut node = ItemNode::new(Box::new(item));
        node.props = props;
        self.items.insert(node)
    }

    /// Create a detached group.
    pub fn create_group(&mut self) -> ItemId {
        self.create(Group)
    }

    /// Create an item and put it on top of `parent`'s stack.
    pub fn add(&mut self, parent: ItemId, item: impl Item) -> Result<ItemId> {
        let id = self.create(item);
        self.add_child(parent, id, None)?;
        Ok(id)
    }

    /// Does the arena hold `item`? Detached items count.
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains_key(item)
    }

    /// Is `item` attached to this canvas's tree?
    pub fn is_item_valid(&self, item: ItemId) -> bool {
        let mut cur = item;
        loop {
            if cur == self.root {
                return self.items.contains_key(cur);
            }
            match self.items.get(cur).and_then(|n| n.parent) {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// The parent of `item`.
    pub fn parent(&self, item: ItemId) -> Option<ItemId> {
        self.items.get(item).and_then(|n| n.parent)
    }

    /// Children of `item` in stacking order, bottom first.
    pub fn children(&self, item: ItemId) -> &[ItemId] {
        self.items.get(item).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Position of `child` within `parent`.
    pub fn find_child(&self, parent: ItemId, child: ItemId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Does `item` hold children?
    pub fn is_container(&self, item: ItemId) -> Result<bool> {
        Ok(self.node(item)?.is_container())
    }

    /// Look up a node.
    fn node(&self, item: ItemId) -> Result<&ItemNode> {
        self.items.get(item).ok_or(Error::ItemNotFound(item))
    }

    /// Look up a node for mutation.
    fn node_mut(&mut self, item: ItemId) -> Result<&mut ItemNode> {
        self.items.get_mut(item).ok_or(Error::ItemNotFound(item))
    }

    /// Look up a container for mutation.
    fn container_mut(&mut self, item: ItemId) -> Result<&mut ItemNode> {
        let node = self.node_mut(item)?;
        if !node.is_container() {
            return Err(Error::NotContainer(NodeRef::Item(item)));
        }
        Ok(node)
    }

    /// Insert `child` into `parent` at `position`, or on top when `None`.
    pub fn add_child(
        &mut self,
        parent: ItemId,
        child: ItemId,
        position: Option<usize>,
    ) -> Result<()> {
        let child_node = self.node(child)?;
        if child_node.parent.is_some() || child == self.root {
            return Err(Error::AlreadyAttached(NodeRef::Item(child)));
        }
        let mut cur = Some(parent);
        while let Some(id) = cur {
            if id == child {
                return Err(Error::WouldCreateCycle {
                    parent: parent.into(),
                    child: child.into(),
                });
            }
            cur = self.parent(id);
        }
        let node = self.container_mut(parent)?;
        let len = node.children.len();
        let index = position.unwrap_or(len);
        if index > len {
            return Err(Error::ChildIndex {
                parent: parent.into(),
                index,
                len,
            });
        }
        node.children.insert(index, child);
        let child_node = self.node_mut(child)?;
        child_node.parent = Some(parent);
        child_node.need_entire_subtree_update = true;
        self.mark_needs_update(child);
        Ok(())
    }

    /// Move the child at `old_index` to `new_index`.
    pub fn move_child(&mut self, parent: ItemId, old_index: usize, new_index: usize) -> Result<()> {
        let node = self.container_mut(parent)?;
        let len = node.children.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(Error::ChildIndex {
                    parent: parent.into(),
                    index,
                    len,
                });
            }
        }
        let child = node.children.remove(old_index);
        node.children.insert(new_index, child);
        let bounds = self.node(child)?.bounds;
        self.request_redraw(&bounds);
        self.mark_needs_update(parent);
        Ok(())
    }

    /// Detach the child at `index`. The child stays in the arena and can be
    /// attached again.
    pub fn remove_child(&mut self, parent: ItemId, index: usize) -> Result<ItemId> {
        let node = self.container_mut(parent)?;
        let len = node.children.len();
        if index >= len {
            return Err(Error::ChildIndex {
                parent: parent.into(),
                index,
                len,
            });
        }
        let child = node.children[index];
        self.unlink(child);
        self.forget(child);
        Ok(child)
    }

    /// Detach `item` from its parent, if it has one.
    pub fn remove(&mut self, item: ItemId) -> Result<()> {
        self.node(item)?;
        if let Some(parent) = self.parent(item)
            && let Some(index) = self.find_child(parent, item)
        {
            self.remove_child(parent, index)?;
        }
        Ok(())
    }

    /// Delete `item` and its subtree from the arena.
    pub fn delete(&mut self, item: ItemId) -> Result<()> {
        if item == self.root {
            return Err(Error::Invalid("cannot delete the root item".into()));
        }
        self.remove(item)?;
        self.destroy_subtree(item);
        Ok(())
    }

    /// Raise `item` above `above`, or to the top of its stack when `None`.
    /// Never lowers.
    pub fn raise(&mut self, item: ItemId, above: Option<ItemId>) -> Result<()> {
        let Some(parent) = self.parent(item) else {
            return Ok(());
        };
        let Some(index) = self.find_child(parent, item) else {
            return Ok(());
        };
        let target = match above {
            Some(sibling) => match self.find_child(parent, sibling) {
                Some(i) => i,
                None => return Ok(()),
            },
            None => self.children(parent).len() - 1,
        };
        if target > index {
            self.move_child(parent, index, target)?;
        }
        Ok(())
    }

    /// Lower `item` below `below`, or to the bottom of its stack when
    /// `None`. Never raises.
    pub fn lower(&mut self, item: ItemId, below: Option<ItemId>) -> Result<()> {
        let Some(parent) = self.parent(item) else {
            return Ok(());
        };
        let Some(index) = self.find_child(parent, item) else {
            return Ok(());
        };
        let target = match below {
            Some(sibling) => match self.find_child(parent, sibling) {
                Some(i) => i,
                None => return Ok(()),
            },
            None => 0,
        };
        if target < index {
            self.move_child(parent, index, target)?;
        }
        Ok(())
    }

    /// Take `item` out of its parent's child list, damaging the area it
    /// covered. Interaction state is left alone.
    pub(crate) fn unlink(&mut self, item: ItemId) {
        let Some(parent) = self.parent(item) else {
            return;
        };
        if let Some(node) = self.items.get_mut(parent) {
            node.children.retain(|c| *c != item);
        }
        let mut bounds = None;
        if let Some(node) = self.items.get_mut(item) {
            node.parent = None;
            bounds = Some(node.bounds);
        }
        if let Some(bounds) = bounds {
            self.request_redraw(&bounds);
        }
        self.mark_needs_update(parent);
    }

    /// Every item in the subtree under `item`, pre-order.
    fn subtree(&self, item: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack = vec![item];
        while let Some(id) = stack.pop() {
            let Some(node) = self.items.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Clear interaction references into a subtree that has left the tree,
    /// releasing any host grab it held.
    fn forget(&mut self, item: ItemId) {
        let gone = self.subtree(item);
        let is_gone = |slot: Option<ItemId>| slot.is_some_and(|s| gone.contains(&s));
        let ix = &mut self.interaction;

        if is_gone(ix.pointer_grab_item) {
            debug!(?item, "removed item held the pointer grab");
            ix.pointer_grab_item = None;
            ix.pointer_grab_initial_item = None;
            ix.pointer_grab_button = None;
            if self.grabs.pointer_is_grabbed() {
                self.grabs.pointer_ungrab(0);
            }
        }
        if is_gone(ix.keyboard_grab_item) {
            debug!(?item, "removed item held the keyboard grab");
            ix.keyboard_grab_item = None;
            self.grabs.keyboard_ungrab(0);
        }
        for slot in [
            &mut ix.pointer_item,
            &mut ix.pointer_grab_initial_item,
            &mut ix.focused_item,
        ] {
            if is_gone(*slot) {
                *slot = None;
            }
        }
    }

    /// Remove a detached subtree from the arena.
    pub(crate) fn destroy_subtree(&mut self, item: ItemId) {
        self.forget(item);
        for id in self.subtree(item) {
            if let Some(node) = self.items.remove(id)
                && let Some(model) = node.model
                && self.registry.get(&model) == Some(&id)
            {
                self.registry.remove(&model);
            }
        }
    }

    // Properties

    /// The generic properties of `item`.
    pub fn props(&self, item: ItemId) -> Result<&ItemProps> {
        Ok(&self.node(item)?.props)
    }

    /// Edit the generic properties of `item`. `recompute_bounds` says
    /// whether the edit can change its extent.
    pub fn update_props(
        &mut self,
        item: ItemId,
        recompute_bounds: bool,
        f: impl FnOnce(&mut ItemProps),
    ) -> Result<()> {
        f(&mut self.node_mut(item)?.props);
        self.changed(item, recompute_bounds);
        Ok(())
    }

    /// The payload of `item`, if it is a `T`.
    pub fn item<T: Item>(&self, item: ItemId) -> Option<&T> {
        let node = self.items.get(item)?;
        (node.item.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    /// Edit the payload of `item` as a `T`, then recompute its bounds.
    pub fn with_item<T: Item, R>(
        &mut self,
        item: ItemId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let node = self.node_mut(item)?;
        let payload = (node.item.as_mut() as &mut dyn Any)
            .downcast_mut::<T>()
            .ok_or_else(|| Error::Invalid(format!("{item:?} is not a {}", type_name::<T>())))?;
        let out = f(payload);
        self.changed(item, true);
        Ok(out)
    }

    /// Tell the canvas an item changed. With `recompute_bounds` the item and
    /// its subtree are recomputed in the next update; otherwise its current
    /// area is just repainted.
    pub fn changed(&mut self, item: ItemId, recompute_bounds: bool) {
        let Some(node) = self.items.get_mut(item) else {
            return;
        };
        if recompute_bounds {
            node.need_entire_subtree_update = true;
            self.mark_needs_update(item);
        } else {
            let bounds = node.bounds;
            self.request_redraw(&bounds);
        }
    }

    /// Flag `item` and its ancestors dirty and schedule an update.
    fn mark_needs_update(&mut self, item: ItemId) {
        let mut cur = Some(item);
        while let Some(id) = cur {
            let Some(node) = self.items.get_mut(id) else {
                break;
            };
            if node.need_update && id != item {
                break;
            }
            node.need_update = true;
            cur = node.parent;
        }
        if self.is_item_valid(item) {
            self.request_update();
        }
    }

    /// The transform of `item`, if any.
    pub fn transform(&self, item: ItemId) -> Result<Option<Affine>> {
        Ok(self.node(item)?.props.transform)
    }

    /// Replace the transform of `item`.
    pub fn set_transform(&mut self, item: ItemId, t: Option<Affine>) -> Result<()> {
        self.update_props(item, true, |p| p.transform = t)
    }

    /// Set a transform from an origin, uniform scale and rotation in degrees.
    pub fn set_simple_transform(
        &mut self,
        item: ItemId,
        x: f64,
        y: f64,
        scale: f64,
        rotation: f64,
    ) -> Result<()> {
        self.set_transform(item, Some(transform::simple(x, y, scale, rotation)))
    }

    /// Compose onto the existing transform.
    fn compose(&mut self, item: ItemId, f: impl FnOnce(Affine) -> Affine) -> Result<()> {
        self.update_props(item, true, |p| p.transform = Some(f(p.transform_or_identity())))
    }

    /// Translate `item` in its own space.
    pub fn translate(&mut self, item: ItemId, tx: f64, ty: f64) -> Result<()> {
        self.compose(item, |t| transform::translate(t, tx, ty))
    }

    /// Scale `item` in its own space.
    pub fn scale(&mut self, item: ItemId, sx: f64, sy: f64) -> Result<()> {
        self.compose(item, |t| transform::scale(t, sx, sy))
    }

    /// Rotate `item` about a point in its own space.
    pub fn rotate(&mut self, item: ItemId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(item, |t| transform::rotate(t, degrees, cx, cy))
    }

    /// Skew `item` horizontally about a point in its own space.
    pub fn skew_x(&mut self, item: ItemId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(item, |t| transform::skew_x(t, degrees, cx, cy))
    }

    /// Skew `item` vertically about a point in its own space.
    pub fn skew_y(&mut self, item: ItemId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(item, |t| transform::skew_y(t, degrees, cx, cy))
    }

    /// The style `item` sets itself, if any.
    pub fn style(&self, item: ItemId) -> Result<Option<Arc<Style>>> {
        Ok(self.node(item)?.props.style.clone())
    }

    /// Give `item` its own style, or make it inherit with `None`.
    pub fn set_style(&mut self, item: ItemId, style: Option<Style>) -> Result<()> {
        self.update_props(item, true, |p| p.style = style.map(Arc::new))
    }

    /// Edit the style of `item` in place, starting from an empty style if it
    /// has none of its own.
    pub fn update_style(&mut self, item: ItemId, f: impl FnOnce(&mut Style)) -> Result<()> {
        self.update_props(item, true, |p| {
            let mut style = p.style.as_deref().cloned().unwrap_or_default();
            f(&mut style);
            p.style = Some(Arc::new(style));
        })
    }

    /// Set how `item` is shown.
    pub fn set_visibility(&mut self, item: ItemId, visibility: Visibility) -> Result<()> {
        self.update_props(item, false, |p| p.visibility = visibility)
    }

    /// Set the hit-test policy of `item`.
    pub fn set_pointer_events(&mut self, item: ItemId, events: PointerEvents) -> Result<()> {
        self.update_props(item, false, |p| p.pointer_events = events)
    }

    /// Clip `item` to a path in its own space.
    pub fn set_clip_path(
        &mut self,
        item: ItemId,
        clip: Option<BezPath>,
        rule: FillRule,
    ) -> Result<()> {
        self.update_props(item, true, |p| {
            p.clip_path = clip;
            p.clip_fill_rule = rule;
        })
    }

    /// Allow or forbid keyboard focus on `item`.
    pub fn set_can_focus(&mut self, item: ItemId, can_focus: bool) -> Result<()> {
        self.update_props(item, false, |p| p.can_focus = can_focus)
    }

    /// Is `item` shown, taking its ancestors and the canvas scale into
    /// account?
    pub fn is_visible(&self, item: ItemId) -> bool {
        let mut cur = Some(item);
        while let Some(id) = cur {
            let Some(node) = self.items.get(id) else {
                return false;
            };
            if !node.props.shown_at(self.config.scale) {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// The canvas-space bounds of `item`, bringing them up to date first.
    pub fn bounds(&mut self, item: ItemId) -> Result<Bounds> {
        self.node(item)?;
        self.update()?;
        Ok(self.node(item)?.bounds)
    }

    /// Attach an event handler to `item`. Handlers run in connection order.
    pub fn connect(
        &mut self,
        item: ItemId,
        handler: impl FnMut(&mut Self, &EventContext, &Event) -> Result<EventOutcome> + 'static,
    ) -> Result<()> {
        self.node_mut(item)?.handlers.push(Box::new(handler));
        Ok(())
    }

    // Updates and damage

    /// Is a recompute pending? Unapplied model changes count.
    pub fn needs_update(&self) -> bool {
        self.need_update || self.waker.notified()
    }

    /// Mark the canvas dirty and schedule one deferred flush if none is
    /// pending.
    pub fn request_update(&mut self) {
        self.need_update = true;
        if !self.updating {
            self.waker.schedule();
        }
    }

    /// Run the scheduled update. Hosts call this from the task the
    /// scheduler queued.
    pub fn flush(&mut self) -> Result<()> {
        self.waker.clear_scheduled();
        self.update()
    }

    /// Apply pending model changes and recompute dirty bounds now.
    ///
    /// After each pass the item under the pointer is re-evaluated. Crossing
    /// handlers may dirty the tree again, so passes repeat until it settles
    /// or `max_update_passes` is reached. Whatever is still dirty then waits
    /// for the next request.
    pub fn update(&mut self) -> Result<()> {
        let was_updating = mem::replace(&mut self.updating, true);
        let result = self.run_update_passes();
        self.updating = was_updating;
        result
    }

    /// The pass loop behind [`Canvas::update`].
    fn run_update_passes(&mut self) -> Result<()> {
        let max = self.config.max_update_passes;
        let mut passes = 0;
        loop {
            self.sync_models()?;
            if !self.need_update {
                return Ok(());
            }
            if passes >= max {
                warn!(passes, "update cascade did not settle, giving up");
                self.need_update = false;
                return Ok(());
            }
            passes += 1;
            trace!(pass = passes, "update pass");
            update::recompute(self);
            dispatch::update_pointer_item(self, None)?;
        }
    }

    /// Record the pixel area covered by canvas-space `bounds` as damaged,
    /// with a margin for antialiasing.
    pub fn request_redraw(&mut self, bounds: &Bounds) {
        if bounds.x1 == bounds.x2 {
            return;
        }
        let b = &self.config.bounds;
        let x = ((bounds.x1 - b.x1) * self.scale_x - 1.0) as i32;
        let y = ((bounds.y1 - b.y1) * self.scale_y - 1.0) as i32;
        let width = ((bounds.x2 - b.x1) * self.scale_x - f64::from(x) + 3.0) as i32;
        let height = ((bounds.y2 - b.y1) * self.scale_y - f64::from(y) + 3.0) as i32;
        self.damage.push(PixelRect::new(
            x + self.viewport.x_offset,
            y + self.viewport.y_offset,
            width,
            height,
        ));
    }

    /// Damage the whole canvas window.
    fn damage_all(&mut self) {
        self.damage.push(PixelRect::new(
            0,
            0,
            self.viewport.window_width,
            self.viewport.window_height,
        ));
    }

    /// Take the damage recorded since the last call.
    pub fn take_damage(&mut self) -> Vec<PixelRect> {
        mem::take(&mut self.damage)
    }

    // Coordinates and viewport

    /// Convert canvas units to canvas-window pixels.
    pub fn to_pixels(&self, p: Point) -> Point {
        let b = &self.config.bounds;
        Point::new(
            (p.x - b.x1) * self.scale_x + f64::from(self.viewport.x_offset),
            (p.y - b.y1) * self.scale_y + f64::from(self.viewport.y_offset),
        )
    }

    /// Convert canvas-window pixels to canvas units.
    pub fn from_pixels(&self, p: Point) -> Point {
        let b = &self.config.bounds;
        Point::new(
            (p.x - f64::from(self.viewport.x_offset)) / self.scale_x + b.x1,
            (p.y - f64::from(self.viewport.y_offset)) / self.scale_y + b.y1,
        )
    }

    /// Convert pixels in the visible viewport, which scrolls over the canvas
    /// window, to canvas units.
    pub fn from_window_pixels(&self, p: Point) -> Point {
        let scroll = Vec2::new(self.viewport.hadjustment.value, self.viewport.vadjustment.value);
        self.from_pixels(p + scroll)
    }

    /// Convert a canvas-space point into the local space of `item`.
    pub fn convert_to_item_space(&self, item: ItemId, p: Point) -> Result<Point> {
        Ok(transform::canvas_to_item(self, item)? * p)
    }

    /// Convert a point in the local space of `item` to canvas space.
    pub fn convert_from_item_space(&self, item: ItemId, p: Point) -> Result<Point> {
        Ok(transform::item_to_canvas(self, item)? * p)
    }

    /// The full transform from the local space of `item` to canvas space.
    pub fn item_to_canvas(&self, item: ItemId) -> Result<Affine> {
        transform::item_to_canvas(self, item)
    }

    /// Lay the canvas window out again after a size, scale or bounds change.
    fn reconfigure(&mut self) {
        let b = &mut self.config.bounds;
        b.x2 = b.x2.max(b.x1);
        b.y2 = b.y2.max(b.y1);
        (self.scale_x, self.scale_y) = self.config.scales();
        if self
            .viewport
            .reconfigure(&self.config.bounds, self.scale_x, self.scale_y, self.config.anchor)
        {
            self.damage_all();
        }
    }

    /// The canvas extent, in canvas units.
    pub fn canvas_bounds(&self) -> Bounds {
        self.config.bounds
    }

    /// Set the canvas extent. Inverted edges collapse to zero size.
    pub fn set_bounds(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.config.bounds = Bounds::new(x1, y1, x2, y2);
        self.reconfigure();
    }

    /// The zoom factor.
    pub fn scale_factor(&self) -> f64 {
        self.config.scale
    }

    /// Zoom, keeping the point at the centre of the viewport fixed.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Invalid(format!("scale must be positive, got {scale}")));
        }
        let h = self.viewport.hadjustment;
        let v = self.viewport.vadjustment;
        let centre = self.from_pixels(Point::new(
            h.value + h.page_size / 2.0,
            v.value + v.page_size / 2.0,
        ));

        self.config.scale = scale;
        self.reconfigure();

        let x = centre.x - self.viewport.hadjustment.page_size / self.scale_x / 2.0;
        let y = centre.y - self.viewport.vadjustment.page_size / self.scale_y / 2.0;
        self.scroll_to(x, y);
        self.damage_all();
        Ok(())
    }

    /// Set the size of the viewport the host gives the canvas.
    pub fn set_allocation(&mut self, width: i32, height: i32) {
        let allocation = Allocation::new(width, height);
        self.config.allocation = allocation;
        self.viewport.allocation = allocation;
        self.reconfigure();
    }

    /// Scroll so the canvas-space point is as close to the top left of the
    /// viewport as the scroll range allows.
    pub fn scroll_to(&mut self, left: f64, top: f64) {
        let p = self.to_pixels(Point::new(left, top));
        self.viewport.hadjustment.set_value(p.x);
        self.viewport.vadjustment.set_value(p.y);
    }

    /// Scroll the minimum needed to show `item`.
    pub fn scroll_to_item(&mut self, item: ItemId) -> Result<()> {
        let b = self.bounds(item)?;
        let p1 = self.to_pixels(Point::new(b.x1, b.y1));
        let p2 = self.to_pixels(Point::new(b.x2, b.y2));
        self.viewport.hadjustment.clamp_page(p1.x, p2.x);
        self.viewport.vadjustment.clamp_page(p1.y, p2.y);
        Ok(())
    }

    /// Scroll one wheel step. The step is the page size to the power 2/3.
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        let adj = match direction {
            ScrollDirection::Up | ScrollDirection::Down => &mut self.viewport.vadjustment,
            ScrollDirection::Left | ScrollDirection::Right => &mut self.viewport.hadjustment,
        };
        let mut delta = adj.page_size.powf(2.0 / 3.0);
        if matches!(direction, ScrollDirection::Up | ScrollDirection::Left) {
            delta = -delta;
        }
        adj.scroll_by(delta);
        true
    }

    // Queries

    /// The topmost item under the pointer at a pixel position, without
    /// updating first.
    pub(crate) fn pick(&self, p: Point, pointer: bool) -> Option<ItemId> {
        hit::items_at(self, self.root, p, pointer).into_iter().next()
    }

    /// The topmost item at a canvas-space point. In pointer mode items are
    /// filtered by their pointer-event policy.
    pub fn get_item_at(&mut self, x: f64, y: f64, pointer: bool) -> Result<Option<ItemId>> {
        Ok(self.get_items_at(x, y, pointer)?.into_iter().next())
    }

    /// Every item at a canvas-space point, topmost first.
    pub fn get_items_at(&mut self, x: f64, y: f64, pointer: bool) -> Result<Vec<ItemId>> {
        self.update()?;
        Ok(hit::items_at(self, self.root, Point::new(x, y), pointer))
    }

    /// Items selected by `query` against a canvas-space area, topmost first
    /// (the reverse of paint order).
    pub fn get_items_in_area(&mut self, area: &Bounds, query: AreaQuery) -> Result<Vec<ItemId>> {
        self.update()?;
        Ok(hit::items_in_area(self, self.root, area, query))
    }

    // Painting

    /// Paint the part of the tree under a damaged canvas-window rectangle.
    /// The painter starts in canvas-window pixels.
    pub fn paint(&mut self, painter: &mut dyn Painter, area: PixelRect) -> Result<()> {
        self.update()?;
        let b = self.config.bounds;
        let (sx, sy) = (self.scale_x, self.scale_y);
        let xoff = f64::from(self.viewport.x_offset);
        let yoff = f64::from(self.viewport.y_offset);
        let x1 = (f64::from(area.x) - xoff) / sx + b.x1;
        let y1 = (f64::from(area.y) - yoff) / sy + b.y1;
        let damage = Bounds::new(
            x1,
            y1,
            f64::from(area.width) / sx + x1,
            f64::from(area.height) / sy + y1,
        );

        painter.save();
        let mut painter = guard(painter, |p| p.restore());
        painter.transform(
            Affine::translate((xoff, yoff))
                * Affine::scale_non_uniform(sx, sy)
                * Affine::translate((-b.x1, -b.y1)),
        );
        paint_item(self, self.root, &mut **painter, &damage, self.config.scale)
    }

    /// Paint the tree onto a painter already in canvas units, for printing
    /// or export. `bounds` limits and clips the area painted; `scale` is
    /// compared against visibility thresholds.
    pub fn render(
        &mut self,
        painter: &mut dyn Painter,
        bounds: Option<&Bounds>,
        scale: f64,
    ) -> Result<()> {
        self.update()?;
        match bounds {
            Some(b) => {
                painter.save();
                let mut painter = guard(painter, |p| p.restore());
                painter.clip(&Rect::from(*b).into_path(0.0), FillRule::NonZero)?;
                paint_item(self, self.root, &mut **painter, b, scale)
            }
            None => {
                let b = self.config.bounds;
                paint_item(self, self.root, painter, &b, scale)
            }
        }
    }

    // Input

    /// The pointer entered the canvas window.
    pub fn enter_notify(&mut self, input: PointerInput) -> Result<()> {
        self.interaction.pointer_inside = true;
        dispatch::update_pointer_item(self, Some(&input))
    }

    /// The pointer left the canvas window.
    pub fn leave_notify(&mut self, input: PointerInput) -> Result<()> {
        self.interaction.pointer_inside = false;
        dispatch::update_pointer_item(self, Some(&input))
    }

    /// The pointer moved. Returns true if a handler consumed the event.
    pub fn motion(&mut self, input: PointerInput) -> Result<bool> {
        self.interaction.pointer_inside = true;
        dispatch::update_pointer_item(self, Some(&input))?;
        dispatch::emit_pointer_event(self, PointerKind::Motion, &input)
    }

    /// A button went down. Unless a grab is already active, the item under
    /// the pointer takes an implicit grab until the same button is released.
    pub fn button_press(&mut self, input: PointerInput) -> Result<bool> {
        self.interaction.pointer_inside = true;
        dispatch::update_pointer_item(self, Some(&input))?;
        if self.interaction.pointer_grab_item.is_none() && !self.grabs.pointer_is_grabbed() {
            let ix = &mut self.interaction;
            ix.pointer_grab_initial_item = ix.pointer_item;
            ix.pointer_grab_item = ix.pointer_item;
            ix.pointer_grab_button = input.button;
        }
        dispatch::emit_pointer_event(self, PointerKind::Press, &input)
    }

    /// A button came up. Releasing the button that started an implicit grab
    /// ends it.
    pub fn button_release(&mut self, input: PointerInput) -> Result<bool> {
        self.interaction.pointer_inside = true;
        dispatch::update_pointer_item(self, Some(&input))?;
        let handled = dispatch::emit_pointer_event(self, PointerKind::Release, &input)?;

        if self.interaction.pointer_grab_item.is_some()
            && input.button == self.interaction.pointer_grab_button
            && !self.grabs.pointer_is_grabbed()
        {
            self.end_pointer_grab();
            dispatch::update_pointer_item(self, Some(&input))?;
        }
        Ok(handled)
    }

    /// Restore the pre-grab pointer item and clear the grab, so the next
    /// pointer update synthesizes crossings from where the grab began.
    fn end_pointer_grab(&mut self) {
        let initial = self
            .interaction
            .pointer_grab_initial_item
            .filter(|i| self.is_item_valid(*i));
        let ix = &mut self.interaction;
        ix.pointer_item = initial;
        ix.pointer_grab_item = None;
        ix.pointer_grab_initial_item = None;
        ix.pointer_grab_button = None;
    }

    /// Where key events start: the keyboard grab holder, else the focused
    /// item.
    fn key_target(&self) -> Option<ItemId> {
        self.interaction
            .keyboard_grab_item
            .or(self.interaction.focused_item)
            .filter(|i| self.is_item_valid(*i))
    }

    /// A key went down. Unhandled navigation keys move focus.
    pub fn key_press(&mut self, key: Key, time: u32) -> Result<bool> {
        if let Some(target) = self.key_target()
            && dispatch::propagate(self, Some(target), &Event::KeyPress(KeyEvent { key, time }))?
        {
            return Ok(true);
        }
        let direction = match (key.mods, key.code) {
            (m, KeyCode::Tab) if m == Modifiers::SHIFT => FocusDirection::TabBackward,
            (m, KeyCode::Tab) if m.is_empty() => FocusDirection::TabForward,
            (m, KeyCode::Up) if m.is_empty() => FocusDirection::Up,
            (m, KeyCode::Down) if m.is_empty() => FocusDirection::Down,
            (m, KeyCode::Left) if m.is_empty() => FocusDirection::Left,
            (m, KeyCode::Right) if m.is_empty() => FocusDirection::Right,
            _ => return Ok(false),
        };
        self.move_focus(direction)
    }

    /// A key came up.
    pub fn key_release(&mut self, key: Key, time: u32) -> Result<bool> {
        match self.key_target() {
            Some(target) => {
                dispatch::propagate(self, Some(target), &Event::KeyRelease(KeyEvent { key, time }))
            }
            None => Ok(false),
        }
    }

    /// The canvas gained focus in its host.
    pub fn focus_in(&mut self) -> Result<bool> {
        self.interaction.has_focus = true;
        match self.interaction.focused_item {
            Some(item) => dispatch::propagate(self, Some(item), &Event::FocusIn),
            None => Ok(false),
        }
    }

    /// The canvas lost focus in its host.
    pub fn focus_out(&mut self) -> Result<bool> {
        self.interaction.has_focus = false;
        match self.interaction.focused_item {
            Some(item) => dispatch::propagate(self, Some(item), &Event::FocusOut),
            None => Ok(false),
        }
    }

    /// Does the canvas have focus in its host?
    pub fn has_focus(&self) -> bool {
        self.interaction.has_focus
    }

    /// The host took a grab away from the canvas.
    pub fn grab_broken(&mut self, keyboard: bool) -> Result<()> {
        let slot = if keyboard {
            self.interaction.keyboard_grab_item.take()
        } else {
            self.interaction.pointer_grab_item.take()
        };
        if let Some(item) = slot {
            debug!(?item, keyboard, "host broke grab");
            dispatch::propagate(self, Some(item), &Event::GrabBroken { keyboard })?;
        }
        Ok(())
    }

    // Interaction state

    /// The topmost item under the pointer.
    pub fn pointer_item(&self) -> Option<ItemId> {
        self.interaction.pointer_item
    }

    /// The item holding the pointer grab.
    pub fn pointer_grab_item(&self) -> Option<ItemId> {
        self.interaction.pointer_grab_item
    }

    /// The item holding the keyboard grab.
    pub fn keyboard_grab_item(&self) -> Option<ItemId> {
        self.interaction.keyboard_grab_item
    }

    /// The item with keyboard focus.
    pub fn focused_item(&self) -> Option<ItemId> {
        self.interaction.focused_item
    }

    // Grabs

    /// Route all pointer events to `item`. Breaks any grab another item
    /// holds.
    pub fn pointer_grab(&mut self, item: ItemId, time: u32) -> Result<GrabStatus> {
        self.node(item)?;
        if let Some(holder) = self.interaction.pointer_grab_item
            && holder != item
        {
            debug!(?holder, ?item, "pointer grab taken over");
            dispatch::propagate(self, Some(holder), &Event::GrabBroken { keyboard: false })?;
            self.interaction.pointer_grab_item = None;
        }
        let status = self.grabs.pointer_grab(time);
        if status.is_success() {
            self.interaction.pointer_grab_initial_item = self.interaction.pointer_item;
            self.interaction.pointer_grab_item = Some(item);
        }
        Ok(status)
    }

    /// Release a pointer grab held by `item`. Does nothing if `item` does
    /// not hold it.
    pub fn pointer_ungrab(&mut self, item: ItemId, time: u32) -> Result<()> {
        if self.interaction.pointer_grab_item != Some(item) {
            return Ok(());
        }
        if self.grabs.pointer_is_grabbed() {
            self.grabs.pointer_ungrab(time);
        }
        debug!(?item, "pointer ungrab");
        self.end_pointer_grab();
        dispatch::update_pointer_item(self, None)
    }

    /// Route all keyboard events to `item`. Breaks any grab another item
    /// holds.
    pub fn keyboard_grab(
        &mut self,
        item: ItemId,
        owner_events: bool,
        time: u32,
    ) -> Result<GrabStatus> {
        self.node(item)?;
        if self.interaction.keyboard_grab_item == Some(item) {
            return Ok(GrabStatus::AlreadyGrabbed);
        }
        if let Some(holder) = self.interaction.keyboard_grab_item {
            debug!(?holder, ?item, "keyboard grab taken over");
            dispatch::propagate(self, Some(holder), &Event::GrabBroken { keyboard: true })?;
            self.interaction.keyboard_grab_item = None;
        }
        let status = self.grabs.keyboard_grab(owner_events, time);
        if status.is_success() {
            self.interaction.keyboard_grab_item = Some(item);
        }
        Ok(status)
    }

    /// Release a keyboard grab held by `item`. Does nothing if `item` does
    /// not hold it.
    pub fn keyboard_ungrab(&mut self, item: ItemId, time: u32) {
        if self.interaction.keyboard_grab_item != Some(item) {
            return;
        }
        self.interaction.keyboard_grab_item = None;
        self.grabs.keyboard_ungrab(time);
    }

    // Focus

    /// Give keyboard focus to `item`, sending focus-out to the previous
    /// holder and focus-in to the new one.
    pub fn grab_focus(&mut self, item: ItemId) -> Result<()> {
        if !self.config.can_focus {
            return Err(Error::Invalid("the canvas cannot take focus".into()));
        }
        self.node(item)?;
        if let Some(old) = self.interaction.focused_item {
            dispatch::propagate(self, Some(old), &Event::FocusOut)?;
        }
        self.interaction.focused_item = Some(item);
        self.interaction.has_focus = true;
        dispatch::propagate(self, Some(item), &Event::FocusIn)?;
        Ok(())
    }

    /// Record the window-pixel bounds of a widget outside the canvas that
    /// holds focus. Focus navigation starts from there when no item is
    /// focused.
    pub fn set_host_focus_bounds(&mut self, bounds: Option<PixelRect>) {
        self.host_focus_bounds = bounds;
    }

    /// Where a focus move starts when no item is focused.
    fn focus_start_bounds(&self, direction: FocusDirection) -> Bounds {
        if let Some(r) = self.host_focus_bounds {
            let p1 = self.from_window_pixels(Point::new(f64::from(r.x), f64::from(r.y)));
            let p2 =
                self.from_window_pixels(Point::new(f64::from(r.right()), f64::from(r.bottom())));
            return Bounds::new(p1.x, p1.y, p2.x, p2.y);
        }
        let alloc = self.viewport.allocation;
        let corner = direction.start_corner(
            self.config.text_direction,
            f64::from(alloc.width),
            f64::from(alloc.height),
        );
        Bounds::at_point(self.from_window_pixels(corner))
    }

    /// Move keyboard focus to the best item in `direction`. Returns true if
    /// focus moved.
    pub fn move_focus(&mut self, direction: FocusDirection) -> Result<bool> {
        if !self.config.can_focus {
            return Ok(false);
        }
        self.update()?;

        let mut start_item = if self.interaction.has_focus {
            self.interaction.focused_item.filter(|i| self.is_item_valid(*i))
        } else {
            None
        };

        for attempt in 1..MAX_FOCUS_TRIES {
            let start = match start_item.and_then(|i| self.items.get(i)) {
                Some(node) => node.bounds,
                None => self.focus_start_bounds(direction),
            };
            let search = FocusSearch::new(direction, self.config.text_direction, start, start_item);
            let Some(best) = search.find(self, self.root) else {
                break;
            };

            let delegated = self
                .items
                .get_mut(best)
                .and_then(|n| n.item.delegate_focus(direction));
            let found = match delegated {
                Some(found) => found,
                None => {
                    self.grab_focus(best)?;
                    true
                }
            };
            if found {
                self.scroll_to_item(best)?;
                return Ok(true);
            }
            debug!(attempt, item = ?best, "focus delegation failed, retrying");
            start_item = Some(best);
        }
        Ok(false)
    }

    // Model/view

    /// Show a model tree, building one item per model. The old tree is
    /// destroyed. Returns the root item.
    pub fn set_root_item_model(&mut self, tree: SharedModel, root: ModelId) -> Result<ItemId> {
        self.models = None;
        self.registry.clear();
        let (item, binding, created) = sync::bind(self, tree, root)?;
        self.models = Some(binding);
        self.install_root(item);
        self.run_item_created(&created)?;
        Ok(item)
    }

    /// The model shown at the root, if the canvas shows a model tree.
    pub fn root_item_model(&self) -> Option<ModelId> {
        self.models.as_ref().map(|m| m.root)
    }

    /// The model tree shown, if any.
    pub fn model_tree(&self) -> Option<&SharedModel> {
        self.models.as_ref().map(|m| &m.tree)
    }

    /// Run `hook` for every item built from a model from now on.
    pub fn connect_item_created(
        &mut self,
        hook: impl FnMut(&mut Self, ItemId, ModelId) -> Result<()> + 'static,
    ) {
        self.item_created.push(Box::new(hook));
    }

    /// Run the item-created hooks.
    fn run_item_created(&mut self, created: &[(ItemId, ModelId)]) -> Result<()> {
        if created.is_empty() || self.item_created.is_empty() {
            return Ok(());
        }
        let mut hooks = mem::take(&mut self.item_created);
        let mut result = Ok(());
        'outer: for &(item, model) in created {
            for hook in &mut hooks {
                if let Err(e) = hook(self, item, model) {
                    result = Err(e);
                    break 'outer;
                }
            }
        }
        let added = mem::take(&mut self.item_created);
        hooks.extend(added);
        self.item_created = hooks;
        result
    }

    /// The item built for `model`.
    pub fn item_for_model(&self, model: ModelId) -> Option<ItemId> {
        self.registry
            .get(&model)
            .copied()
            .filter(|i| self.items.contains_key(*i))
    }

    /// The model `item` was built from.
    pub fn model_for_item(&self, item: ItemId) -> Option<ModelId> {
        self.items.get(item).and_then(|n| n.model)
    }

    /// Apply pending model notifications to the view tree.
    pub fn sync_models(&mut self) -> Result<()> {
        self.waker.clear_notified();
        let created = sync::sync(self)?;
        self.run_item_created(&created)
    }
}
