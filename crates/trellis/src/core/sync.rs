//! Keeping a view tree in step with a model tree.
//!
//! The canvas subscribes to its model tree, which schedules an update pass
//! on every change, and drains the notifications before every update.
//! Structural notifications are not replayed one by one: each affected
//! container is reconciled against the model's current child list, which
//! makes the sync idempotent however the notifications were batched.

use std::{
    collections::HashMap,
    mem,
    sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard, mpsc::Receiver},
};

use tracing::trace;

use super::{
    canvas::Canvas,
    model::{ModelChange, ModelTree, SharedModel},
    node::ItemNode,
};
use crate::{ItemId, ModelId, error::Result};

/// A canvas's link to the model tree it displays.
#[derive(Debug)]
pub(crate) struct ModelBinding {
    /// The shared model tree.
    pub(crate) tree: SharedModel,
    /// Change notifications from the tree.
    changes: Receiver<ModelChange>,
    /// The model shown at the canvas root.
    pub(crate) root: ModelId,
}

/// Read access to a model tree. A poisoned lock still holds a usable tree.
fn read(tree: &SharedModel) -> RwLockReadGuard<'_, ModelTree> {
    tree.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access to a model tree.
fn write(tree: &SharedModel) -> RwLockWriteGuard<'_, ModelTree> {
    tree.write().unwrap_or_else(PoisonError::into_inner)
}

/// Materialize the tree under `root` into detached items and subscribe to
/// its changes. Returns the root item, the binding and every item created.
pub(crate) fn bind(
    canvas: &mut Canvas,
    tree: SharedModel,
    root: ModelId,
) -> Result<(ItemId, ModelBinding, Vec<(ItemId, ModelId)>)> {
    let waker = canvas.waker.clone();
    let changes = write(&tree).subscribe_with(move || waker.notify());
    let mut created = Vec::new();
    let root_item = {
        let guard = read(&tree);
        item_for(canvas, &guard, root, &mut created)?
    };
    let binding = ModelBinding {
        tree,
        changes,
        root,
    };
    Ok((root_item, binding, created))
}

/// Drain pending model notifications and apply them to the view tree.
/// Returns the items created along the way.
pub(crate) fn sync(canvas: &mut Canvas) -> Result<Vec<(ItemId, ModelId)>> {
    let Some(binding) = &canvas.models else {
        return Ok(Vec::new());
    };
    let pending: Vec<ModelChange> = binding.changes.try_iter().collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }
    let tree = binding.tree.clone();
    trace!(count = pending.len(), "syncing model notifications");

    let mut parents: Vec<ModelId> = Vec::new();
    let mut changed: HashMap<ModelId, bool> = HashMap::new();
    let mut changed_order: Vec<ModelId> = Vec::new();
    for change in pending {
        match change {
            ModelChange::ChildAdded { parent, .. }
            | ModelChange::ChildMoved { parent, .. }
            | ModelChange::ChildRemoved { parent, .. } => {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
            ModelChange::Changed {
                model,
                recompute_bounds,
            } => {
                let entry = changed.entry(model).or_insert_with(|| {
                    changed_order.push(model);
                    false
                });
                *entry |= recompute_bounds;
            }
        }
    }

    let guard = read(&tree);
    let mut created = Vec::new();
    let mut orphans = Vec::new();
    for parent in parents {
        reconcile(canvas, &guard, parent, &mut created, &mut orphans)?;
    }
    for model in changed_order {
        let recompute = changed.get(&model).copied().unwrap_or(true);
        refresh(canvas, &guard, model, recompute)?;
    }
    drop(guard);

    for orphan in orphans {
        let detached = canvas.items.get(orphan).is_some_and(|n| n.parent.is_none());
        if detached && orphan != canvas.root {
            canvas.destroy_subtree(orphan);
        }
    }
    Ok(created)
}

/// The item mirroring `model`. An existing item is detached from wherever
/// it is and reused; otherwise a new item is built for the whole subtree.
fn item_for(
    canvas: &mut Canvas,
    tree: &ModelTree,
    model: ModelId,
    created: &mut Vec<(ItemId, ModelId)>,
) -> Result<ItemId> {
    if let Some(&existing) = canvas.registry.get(&model)
        && canvas.items.contains_key(existing)
    {
        canvas.unlink(existing);
        return Ok(existing);
    }

    let node = tree.node(model)?;
    let mut item = ItemNode::new(node.model.create_item());
    item.props = node.props.clone();
    item.model = Some(model);
    let id = canvas.items.insert(item);
    canvas.registry.insert(model, id);
    created.push((id, model));

    for &child_model in &node.children {
        let child = item_for(canvas, tree, child_model, created)?;
        if let Some(child_node) = canvas.items.get_mut(child) {
            child_node.parent = Some(id);
        }
        if let Some(parent_node) = canvas.items.get_mut(id) {
            parent_node.children.push(child);
        }
    }
    Ok(id)
}

/// Make the children of the item mirroring `parent` match the model's
/// current children. Items dropped from the list are collected in
/// `orphans`; they are destroyed later unless another container claims
/// them first.
fn reconcile(
    canvas: &mut Canvas,
    tree: &ModelTree,
    parent: ModelId,
    created: &mut Vec<(ItemId, ModelId)>,
    orphans: &mut Vec<ItemId>,
) -> Result<()> {
    let Some(&parent_item) = canvas.registry.get(&parent) else {
        return Ok(());
    };
    if !canvas.items.contains_key(parent_item) || !tree.contains(parent) {
        return Ok(());
    }

    let models = tree.children(parent).to_vec();
    let mut desired = Vec::with_capacity(models.len());
    for model in models {
        desired.push(item_for(canvas, tree, model, created)?);
    }

    let Some(node) = canvas.items.get_mut(parent_item) else {
        return Ok(());
    };
    if node.children == desired {
        return Ok(());
    }
    let old = mem::replace(&mut node.children, desired.clone());
    let bounds = node.bounds;

    for &child in &desired {
        if let Some(c) = canvas.items.get_mut(child) {
            c.parent = Some(parent_item);
        }
    }
    for child in old {
        if desired.contains(&child) {
            continue;
        }
        if let Some(c) = canvas.items.get_mut(child)
            && c.parent == Some(parent_item)
        {
            c.parent = None;
            orphans.push(child);
        }
    }

    trace!(?parent, item = ?parent_item, "reconciled children");
    canvas.request_redraw(&bounds);
    canvas.changed(parent_item, true);
    Ok(())
}

/// Copy a changed model's properties and payload onto its item.
fn refresh(canvas: &mut Canvas, tree: &ModelTree, model: ModelId, recompute: bool) -> Result<()> {
    let Some(&item) = canvas.registry.get(&model) else {
        return Ok(());
    };
    let Ok(node) = tree.node(model) else {
        return Ok(());
    };
    let Some(view) = canvas.items.get_mut(item) else {
        return Ok(());
    };
    view.props = node.props.clone();
    if !view.is_container() {
        view.item = node.model.create_item();
    }
    canvas.changed(item, recompute);
    Ok(())
}
