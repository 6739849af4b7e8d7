//! Trellis: a headless retained-mode canvas.
//!
//! Trellis keeps a tree of 2D items, each with its own transform, style and
//! geometry, and does the bookkeeping a canvas widget needs around it:
//! incremental bounds recomputation, damage tracking, painting through a
//! pluggable [`Painter`](paint::Painter), hit-testing, pointer and keyboard
//! event routing with grabs, and directional focus navigation. It draws
//! nothing itself and owns no window; a host feeds it input and paints the
//! damage it reports.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Canvas`] - The item arena, coordinate system and input state
//! - [`Item`](item::Item) - The trait implemented by all items
//! - [`ModelTree`](model::ModelTree) - A data-only tree a canvas can mirror
//!
//! # Module Organization
//!
//! - [`geom`] - Bounds and pixel rectangles on top of `kurbo`
//! - [`item`] - The item contract and path helpers
//! - [`event`] - Input and handler event types

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod geom;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
// Re-export core types
pub use core::{AreaQuery, Canvas, ItemCreated, ItemId, ModelId};
pub use core::{
    config, error, event, focus, grab, hit, item, model, node, paint, scheduler, style,
    transform, viewport,
};

pub use error::{Error, Result};
