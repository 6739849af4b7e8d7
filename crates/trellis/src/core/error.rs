use std::{fmt, result::Result as StdResult};

use thiserror::Error;

use crate::{ItemId, ModelId};

/// Result type for trellis operations.
pub type Result<T> = StdResult<T, Error>;

/// A reference to either a view item or a model node, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    /// A view item.
    Item(ItemId),
    /// A model node.
    Model(ModelId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(id) => write!(f, "item {id:?}"),
            Self::Model(id) => write!(f, "model {id:?}"),
        }
    }
}

impl From<ItemId> for NodeRef {
    fn from(id: ItemId) -> Self {
        Self::Item(id)
    }
}

impl From<ModelId> for NodeRef {
    fn from(id: ModelId) -> Self {
        Self::Model(id)
    }
}

/// Core error type.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// Item not present in the canvas arena.
    #[error("item not found: {0:?}")]
    ItemNotFound(ItemId),
    /// Model not present in the model tree.
    #[error("model not found: {0:?}")]
    ModelNotFound(ModelId),
    /// A container-only operation was applied to a leaf.
    #[error("not a container: {0}")]
    NotContainer(NodeRef),
    /// A child index was out of range for its container.
    #[error("child index {index} out of range for {parent} with {len} children")]
    ChildIndex {
        /// Container the index was applied to.
        parent: NodeRef,
        /// Offending index.
        index: usize,
        /// Number of children in the container.
        len: usize,
    },
    /// Attempted to attach a node that already has a parent.
    #[error("already attached: {0}")]
    AlreadyAttached(NodeRef),
    /// Attempted to attach a node underneath itself.
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCreateCycle {
        /// Proposed parent.
        parent: NodeRef,
        /// Proposed child.
        child: NodeRef,
    },
    /// A transform chain could not be inverted.
    #[error("transform is not invertible")]
    NotInvertible,
    /// Configuration could not be loaded.
    #[error("config: {0}")]
    Config(String),
    /// Invalid input error.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
