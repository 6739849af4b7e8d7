use std::{fmt, sync::Arc};

use kurbo::{Affine, BezPath};

use super::{
    event::Handler,
    item::{Item, PointerEvents, Visibility},
    style::{FillRule, Style},
};
use crate::{ItemId, ModelId, geom::Bounds};

/// The generic properties every item carries, independent of its payload.
///
/// Models carry the same set, so a model-backed item is refreshed by
/// copying these across.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemProps {
    /// Transform into the parent's space. `None` is the identity.
    pub transform: Option<Affine>,
    /// The item's own style, if it overrides its parent.
    pub style: Option<Arc<Style>>,
    /// Visibility mode.
    pub visibility: Visibility,
    /// Scale threshold for [`Visibility::VisibleAboveThreshold`].
    pub visibility_threshold: f64,
    /// Hit-test policy.
    pub pointer_events: PointerEvents,
    /// Clip path in local space.
    pub clip_path: Option<BezPath>,
    /// Fill rule for the clip path.
    pub clip_fill_rule: FillRule,
    /// Can keyboard focus land here?
    pub can_focus: bool,
    /// Short accessible title.
    pub title: Option<String>,
    /// Longer accessible description.
    pub description: Option<String>,
}

impl Default for ItemProps {
    fn default() -> Self {
        Self {
            transform: None,
            style: None,
            visibility: Visibility::Visible,
            visibility_threshold: 0.0,
            pointer_events: PointerEvents::default(),
            clip_path: None,
            clip_fill_rule: FillRule::default(),
            can_focus: false,
            title: None,
            description: None,
        }
    }
}

impl ItemProps {
    /// The transform, or identity when unset.
    pub fn transform_or_identity(&self) -> Affine {
        self.transform.unwrap_or(Affine::IDENTITY)
    }

    /// Is the item drawn at canvas scale `scale`?
    pub fn shown_at(&self, scale: f64) -> bool {
        !(self.visibility <= Visibility::Invisible
            || (self.visibility == Visibility::VisibleAboveThreshold
                && scale < self.visibility_threshold))
    }
}

/// An item as stored in the canvas arena.
pub(crate) struct ItemNode {
    /// Payload implementing the item contract.
    pub(crate) item: Box<dyn Item>,
    /// Containing item, if attached.
    pub(crate) parent: Option<ItemId>,
    /// Children in stacking order, bottom first.
    pub(crate) children: Vec<ItemId>,
    /// Generic properties.
    pub(crate) props: ItemProps,
    /// Style resolved against the parent chain during the last update.
    pub(crate) effective_style: Option<Arc<Style>>,
    /// Bounds in canvas space as of the last update.
    pub(crate) bounds: Bounds,
    /// This item needs its bounds recomputed.
    pub(crate) need_update: bool,
    /// Every descendant needs its bounds recomputed too.
    pub(crate) need_entire_subtree_update: bool,
    /// Model this item mirrors, in model/view mode.
    pub(crate) model: Option<ModelId>,
    /// Event handlers, in connection order.
    pub(crate) handlers: Vec<Handler>,
}

impl ItemNode {
    pub(crate) fn new(item: Box<dyn Item>) -> Self {
        Self {
            item,
            parent: None,
            children: Vec::new(),
            props: ItemProps::default(),
            effective_style: None,
            bounds: Bounds::default(),
            need_update: true,
            need_entire_subtree_update: true,
            model: None,
            handlers: Vec::new(),
        }
    }

    /// Does the payload hold children?
    pub(crate) fn is_container(&self) -> bool {
        self.item.is_container()
    }

    /// Resolve the effective style from the parent's effective style.
    pub(crate) fn check_style(&mut self, parent: Option<&Arc<Style>>) {
        self.effective_style = match &self.props.style {
            Some(own) => Some(Arc::new(own.with_parent(parent.cloned()))),
            None => parent.cloned(),
        };
    }
}

impl fmt::Debug for ItemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemNode")
            .field("item", &self.item.name())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("bounds", &self.bounds)
            .field("need_update", &self.need_update)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{item::Group, style::Color};

    #[test]
    fn thresholds() {
        let mut props = ItemProps {
            visibility: Visibility::VisibleAboveThreshold,
            visibility_threshold: 2.0,
            ..ItemProps::default()
        };
        assert!(!props.shown_at(1.0));
        assert!(props.shown_at(2.0));
        props.visibility = Visibility::Invisible;
        assert!(!props.shown_at(10.0));
    }

    #[test]
    fn style_borrowed_or_owned() {
        let parent = Arc::new(Style::new().with_fill(Color::RED));
        let mut node = ItemNode::new(Box::new(Group));

        node.check_style(Some(&parent));
        assert!(node.effective_style.as_ref().is_some_and(|s| Arc::ptr_eq(s, &parent)));

        node.props.style = Some(Arc::new(Style::new().with_line_width(3.0)));
        node.check_style(Some(&parent));
        let eff = node.effective_style.as_ref().map(|s| (s.has_fill(), s.line_width));
        assert_eq!(eff, Some((true, Some(3.0))));
    }
}
