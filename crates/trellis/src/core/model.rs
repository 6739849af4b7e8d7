//! Data-only item models.
//!
//! A [`ModelTree`] holds a tree of item descriptions that can exist without
//! any canvas. A canvas shown a model tree materializes one item per model
//! node and keeps the two in step by draining the tree's [`ModelChange`]
//! notifications before each update pass.

use std::{
    any::{Any, type_name},
    fmt,
    sync::{
        Arc, RwLock,
        mpsc::{Receiver, Sender, channel},
    },
};

use kurbo::{Affine, BezPath};
use slotmap::SlotMap;
use tracing::trace;

use super::{
    item::{Group, Item, PointerEvents, Visibility},
    node::ItemProps,
    style::{FillRule, Style},
    transform,
};
use crate::{
    ModelId,
    error::{Error, NodeRef, Result},
};

/// A model tree shared between the code that edits it and the canvases that
/// display it.
pub type SharedModel = Arc<RwLock<ModelTree>>;

/// The data half of an item.
pub trait ItemModel: Any + Send + Sync {
    /// Build a view item for this model.
    fn create_item(&self) -> Box<dyn Item>;

    /// Does this model hold children?
    fn is_container(&self) -> bool {
        false
    }

    /// A short name for debugging output.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Model for a plain [`Group`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupModel;

impl ItemModel for GroupModel {
    fn create_item(&self) -> Box<dyn Item> {
        Box::new(Group)
    }

    fn is_container(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "group"
    }
}

/// A structural or property change in a model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChange {
    /// A child was inserted at `index`.
    ChildAdded {
        /// Containing model.
        parent: ModelId,
        /// Position of the new child.
        index: usize,
    },
    /// A child moved within its container.
    ChildMoved {
        /// Containing model.
        parent: ModelId,
        /// Previous position.
        old_index: usize,
        /// New position.
        new_index: usize,
    },
    /// A child was removed from `index`.
    ChildRemoved {
        /// Containing model.
        parent: ModelId,
        /// Position the child was removed from.
        index: usize,
    },
    /// A model's properties or data changed.
    Changed {
        /// The changed model.
        model: ModelId,
        /// Can the change affect bounds?
        recompute_bounds: bool,
    },
}

/// A node in a model tree.
pub struct ModelNode {
    /// Payload.
    pub(crate) model: Box<dyn ItemModel>,
    /// Containing model, if attached.
    pub(crate) parent: Option<ModelId>,
    /// Children in stacking order, bottom first.
    pub(crate) children: Vec<ModelId>,
    /// Generic item properties.
    pub(crate) props: ItemProps,
}

impl fmt::Debug for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelNode")
            .field("model", &self.model.name())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// An arena of item models with change notification.
#[derive(Default)]
pub struct ModelTree {
    /// Model storage.
    nodes: SlotMap<ModelId, ModelNode>,
    /// Live notification channels.
    subscribers: Vec<Subscriber>,
}

/// One notification channel, with an optional wake-up for its reader.
struct Subscriber {
    /// Change channel.
    tx: Sender<ModelChange>,
    /// Called after each change is queued.
    wake: Option<Box<dyn Fn() + Send + Sync>>,
}

impl fmt::Debug for ModelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTree")
            .field("nodes", &self.nodes.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ModelTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the tree for sharing with canvases.
    pub fn shared(self) -> SharedModel {
        Arc::new(RwLock::new(self))
    }

    /// Receive every future change to this tree.
    pub fn subscribe(&mut self) -> Receiver<ModelChange> {
        let (tx, rx) = channel();
        self.subscribers.push(Subscriber { tx, wake: None });
        rx
    }

    /// Like [`ModelTree::subscribe`], calling `wake` after every change is
    /// queued so the reader can schedule a drain.
    pub fn subscribe_with(
        &mut self,
        wake: impl Fn() + Send + Sync + 'static,
    ) -> Receiver<ModelChange> {
        let (tx, rx) = channel();
        self.subscribers.push(Subscriber {
            tx,
            wake: Some(Box::new(wake)),
        });
        rx
    }

    /// Deliver a change to subscribers, dropping any that have gone away.
    fn emit(&mut self, change: ModelChange) {
        trace!(?change, "model change");
        self.subscribers.retain(|s| {
            let alive = s.tx.send(change).is_ok();
            if alive && let Some(wake) = &s.wake {
                wake();
            }
            alive
        });
    }

    /// Add a detached model to the arena.
    pub fn create(&mut self, model: impl ItemModel) -> ModelId {
        self.create_boxed(Box::new(model))
    }

    /// Add a detached, already boxed model to the arena.
    pub fn create_boxed(&mut self, model: Box<dyn ItemModel>) -> ModelId {
        self.nodes.insert(ModelNode {
            model,
            parent: None,
            children: Vec::new(),
            props: ItemProps::default(),
        })
    }

    /// Add a detached group model.
    pub fn create_group(&mut self) -> ModelId {
        self.create(GroupModel)
    }

    /// Does the model exist?
    pub fn contains(&self, id: ModelId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node.
    pub(crate) fn node(&self, id: ModelId) -> Result<&ModelNode> {
        self.nodes.get(id).ok_or(Error::ModelNotFound(id))
    }

    /// Look up a node mutably.
    fn node_mut(&mut self, id: ModelId) -> Result<&mut ModelNode> {
        self.nodes.get_mut(id).ok_or(Error::ModelNotFound(id))
    }

    /// Look up a container, failing for leaves.
    fn container_mut(&mut self, id: ModelId) -> Result<&mut ModelNode> {
        let node = self.node_mut(id)?;
        if !node.model.is_container() {
            return Err(Error::NotContainer(NodeRef::Model(id)));
        }
        Ok(node)
    }

    /// Parent of a model.
    pub fn parent(&self, id: ModelId) -> Option<ModelId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a model, bottom first.
    pub fn children(&self, id: ModelId) -> &[ModelId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Properties of a model.
    pub fn props(&self, id: ModelId) -> Result<&ItemProps> {
        Ok(&self.node(id)?.props)
    }

    /// Borrow a model's payload as a concrete type.
    pub fn data<T: ItemModel>(&self, id: ModelId) -> Option<&T> {
        let node = self.nodes.get(id)?;
        (node.model.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    /// Insert `child` into `parent` at `position`, or on top when `None`.
    pub fn add_child(
        &mut self,
        parent: ModelId,
        child: ModelId,
        position: Option<usize>,
    ) -> Result<()> {
        let child_node = self.node(child)?;
        if child_node.parent.is_some() {
            return Err(Error::AlreadyAttached(NodeRef::Model(child)));
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
        self.node_mut(child)?.parent = Some(parent);
        self.emit(ModelChange::ChildAdded { parent, index });
        Ok(())
    }

    /// Move the child at `old_index` to `new_index`.
    pub fn move_child(
        &mut self,
        parent: ModelId,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
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
        self.emit(ModelChange::ChildMoved {
            parent,
            old_index,
            new_index,
        });
        Ok(())
    }

    /// Detach the child at `index`. The child stays in the arena and can be
    /// re-attached.
    pub fn remove_child(&mut self, parent: ModelId, index: usize) -> Result<ModelId> {
        let node = self.container_mut(parent)?;
        let len = node.children.len();
        if index >= len {
            return Err(Error::ChildIndex {
                parent: parent.into(),
                index,
                len,
            });
        }
        let child = node.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.emit(ModelChange::ChildRemoved { parent, index });
        Ok(child)
    }

    /// Detach a model from its parent, if it has one.
    pub fn remove(&mut self, id: ModelId) -> Result<()> {
        if let Some(parent) = self.parent(id)
            && let Some(index) = self.find_child(parent, id)
        {
            self.remove_child(parent, index)?;
        }
        Ok(())
    }

    /// Delete a model and its whole subtree from the arena.
    pub fn delete(&mut self, id: ModelId) -> Result<()> {
        self.remove(id)?;
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(cur) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Position of `child` within `parent`.
    pub fn find_child(&self, parent: ModelId, child: ModelId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Raise a model above `above`, or to the top of its stack when `None`.
    /// Never lowers.
    pub fn raise(&mut self, id: ModelId, above: Option<ModelId>) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let Some(index) = self.find_child(parent, id) else {
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

    /// Lower a model below `below`, or to the bottom of its stack when
    /// `None`. Never raises.
    pub fn lower(&mut self, id: ModelId, below: Option<ModelId>) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let Some(index) = self.find_child(parent, id) else {
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

    /// Edit a model's properties and notify subscribers.
    pub fn update_props(
        &mut self,
        id: ModelId,
        recompute_bounds: bool,
        f: impl FnOnce(&mut ItemProps),
    ) -> Result<()> {
        f(&mut self.node_mut(id)?.props);
        self.emit(ModelChange::Changed {
            model: id,
            recompute_bounds,
        });
        Ok(())
    }

    /// Edit a model's payload as its concrete type and notify subscribers.
    pub fn update_data<T: ItemModel>(&mut self, id: ModelId, f: impl FnOnce(&mut T)) -> Result<()> {
        let node = self.node_mut(id)?;
        let data = (node.model.as_mut() as &mut dyn Any)
            .downcast_mut::<T>()
            .ok_or_else(|| Error::Invalid(format!("model {id:?} is not a {}", type_name::<T>())))?;
        f(data);
        self.emit(ModelChange::Changed {
            model: id,
            recompute_bounds: true,
        });
        Ok(())
    }

    /// Replace a model's transform.
    pub fn set_transform(&mut self, id: ModelId, t: Option<Affine>) -> Result<()> {
        self.update_props(id, true, |p| p.transform = t)
    }

    /// Replace a model's transform with origin, scale and rotation.
    pub fn set_simple_transform(
        &mut self,
        id: ModelId,
        x: f64,
        y: f64,
        scale: f64,
        rotation: f64,
    ) -> Result<()> {
        self.set_transform(id, Some(transform::simple(x, y, scale, rotation)))
    }

    /// Edit a model's transform in place.
    fn compose(&mut self, id: ModelId, f: impl FnOnce(Affine) -> Affine) -> Result<()> {
        self.update_props(id, true, |p| p.transform = Some(f(p.transform_or_identity())))
    }

    /// Translate a model.
    pub fn translate(&mut self, id: ModelId, tx: f64, ty: f64) -> Result<()> {
        self.compose(id, |t| transform::translate(t, tx, ty))
    }

    /// Scale a model.
    pub fn scale(&mut self, id: ModelId, sx: f64, sy: f64) -> Result<()> {
        self.compose(id, |t| transform::scale(t, sx, sy))
    }

    /// Rotate a model about a point.
    pub fn rotate(&mut self, id: ModelId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(id, |t| transform::rotate(t, degrees, cx, cy))
    }

    /// Skew a model horizontally about a point.
    pub fn skew_x(&mut self, id: ModelId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(id, |t| transform::skew_x(t, degrees, cx, cy))
    }

    /// Skew a model vertically about a point.
    pub fn skew_y(&mut self, id: ModelId, degrees: f64, cx: f64, cy: f64) -> Result<()> {
        self.compose(id, |t| transform::skew_y(t, degrees, cx, cy))
    }

    /// Replace a model's own style.
    pub fn set_style(&mut self, id: ModelId, style: Option<Style>) -> Result<()> {
        self.update_props(id, true, |p| p.style = style.map(Arc::new))
    }

    /// Set how a model's item is shown.
    pub fn set_visibility(&mut self, id: ModelId, visibility: Visibility) -> Result<()> {
        self.update_props(id, false, |p| p.visibility = visibility)
    }

    /// Set a model's hit-test policy.
    pub fn set_pointer_events(&mut self, id: ModelId, events: PointerEvents) -> Result<()> {
        self.update_props(id, false, |p| p.pointer_events = events)
    }

    /// Clip a model's item to a local-space path.
    pub fn set_clip_path(
        &mut self,
        id: ModelId,
        clip: Option<BezPath>,
        rule: FillRule,
    ) -> Result<()> {
        self.update_props(id, true, |p| {
            p.clip_path = clip;
            p.clip_fill_rule = rule;
        })
    }

    /// Allow or forbid keyboard focus on a model's item.
    pub fn set_can_focus(&mut self, id: ModelId, can_focus: bool) -> Result<()> {
        self.update_props(id, false, |p| p.can_focus = can_focus)
    }
}
