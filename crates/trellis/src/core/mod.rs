//! Scene graph core: the item tree, the canvas that owns it, and the update,
//! paint, query and input pipelines that run over it.

// Public modules
/// Canvas configuration and units.
pub mod config;
/// Core error types.
pub mod error;
/// Input and item event types.
pub mod event;
/// Directional focus navigation.
pub mod focus;
/// Host input grab interface.
pub mod grab;
/// Item and model identifiers.
pub mod id;
/// The item contract and the stock group container.
pub mod item;
/// Model trees and change notification.
pub mod model;
/// Per-item properties and arena nodes.
pub mod node;
/// The painter interface and paint traversal.
pub mod paint;
/// Deferred update scheduling.
pub mod scheduler;
/// Styles, paints and colors.
pub mod style;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// Transform composition helpers.
pub mod transform;
/// Scroll and window layout state.
pub mod viewport;

// Internal modules
/// The canvas.
pub mod canvas;
/// Event propagation and pointer tracking.
mod dispatch;
/// Point and area queries.
pub mod hit;
/// Model to view synchronization.
mod sync;
/// Bounds recomputation.
mod update;

pub use canvas::{Canvas, ItemCreated};
pub use hit::AreaQuery;
pub use id::{ItemId, ModelId};
