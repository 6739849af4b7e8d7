use anyhow::Result;
use clap::Parser;
use trellis::{
    Canvas,
    event::{Button, PointerInput},
    style::{Color, Style},
};
use trellis_examples::{drag::make_draggable, init_tracing, shapes::TileItem};

/// Drag a square across the canvas and report the damage
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Horizontal distance to drag
    #[clap(short, long, default_value_t = 100.0)]
    dx: f64,

    /// Vertical distance to drag
    #[clap(short = 'y', long, default_value_t = 40.0)]
    dy: f64,

    /// Number of motion steps
    #[clap(short, long, default_value_t = 4)]
    steps: u32,

    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut canvas = Canvas::new();
    canvas.set_allocation(400, 300);
    let root = canvas.root();
    let square = canvas.add(root, TileItem::new(10.0, 10.0, 40.0, 40.0))?;
    canvas.set_style(square, Some(Style::new().with_fill(Color::BLUE).with_stroke(Color::BLACK)))?;
    make_draggable(&mut canvas, square)?;
    canvas.update()?;
    canvas.take_damage();

    let start = (30.0, 30.0);
    canvas.button_press(PointerInput::at(start.0, start.1).with_button(Button::Left))?;
    let steps = args.steps.max(1);
    let (mut x, mut y) = start;
    for i in 1..=steps {
        let t = f64::from(i) / f64::from(steps);
        x = start.0 + args.dx * t;
        y = start.1 + args.dy * t;
        canvas.motion(PointerInput::at(x, y))?;
        canvas.update()?;
        println!("step {i}: bounds {:?}", canvas.bounds(square)?);
        for rect in canvas.take_damage() {
            println!("  damage {rect:?}");
        }
    }
    canvas.button_release(PointerInput::at(x, y).with_button(Button::Left))?;
    Ok(())
}
