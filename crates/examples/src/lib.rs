//! Example scenes used by trellis demos.

use std::io;

use tracing::Level;

/// Drag and drop with pointer grabs.
pub mod drag;
/// Keyboard focus navigation over a grid of tiles.
pub mod focusgrid;
/// One model tree shown on several canvases.
pub mod modelview;
/// Random scenes for hit-testing.
pub mod scatter;
/// Shapes implemented outside the core crate.
pub mod shapes;

#[cfg(test)]
mod tests;

/// Send demo logs to stderr.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .try_init()
    {
        eprintln!("logging not installed: {e}");
    }
}
