use anyhow::Result;
use clap::Parser;
use trellis::Canvas;
use trellis_examples::{init_tracing, modelview::Board};

/// Show one model on two canvases at different zoom levels
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Rows of rectangles
    #[clap(short, long, default_value_t = 3)]
    rows: usize,

    /// Rectangles per row
    #[clap(short, long, default_value_t = 5)]
    cols: usize,

    /// Zoom factor of the second canvas
    #[clap(short, long, default_value_t = 2.0)]
    zoom: f64,

    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

/// Print and clear the damage a canvas has collected.
fn report(name: &str, canvas: &mut Canvas) {
    let damage = canvas.take_damage();
    println!("{name}: {} damaged rects", damage.len());
    for rect in damage {
        println!("  {rect:?}");
    }
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let board = Board::new(args.rows, args.cols)?;
    let mut normal = Canvas::new();
    let mut zoomed = Canvas::new();
    normal.set_allocation(400, 300);
    zoomed.set_allocation(400, 300);
    zoomed.set_scale(args.zoom)?;
    for canvas in [&mut normal, &mut zoomed] {
        canvas.set_root_item_model(board.tree.clone(), board.root)?;
        canvas.update()?;
        canvas.take_damage();
    }

    if let Some(moved) = board.hop(0, args.rows.saturating_sub(1))? {
        println!("moved {moved:?} to the last row");
    }
    board.rotate_rows()?;
    for (name, canvas) in [("normal", &mut normal), ("zoomed", &mut zoomed)] {
        canvas.update()?;
        report(name, canvas);
    }
    Ok(())
}
