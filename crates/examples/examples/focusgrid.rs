use anyhow::Result;
use clap::Parser;
use trellis::Canvas;
use trellis_examples::{focusgrid, init_tracing};

/// Walk keyboard focus across a grid of tiles
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Grid columns
    #[clap(short, long, default_value_t = 4)]
    cols: usize,

    /// Grid rows
    #[clap(short, long, default_value_t = 3)]
    rows: usize,

    /// Navigation keys: tab, shift-tab, left, right, up, down
    #[clap(default_value = "tab right right down left shift-tab")]
    script: String,

    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let keys = focusgrid::parse_keys(&args.script)?;
    let mut canvas = Canvas::new();
    let tiles = focusgrid::build(&mut canvas, args.cols, args.rows)?;
    for (word, key) in args.script.split_whitespace().zip(keys) {
        let moved = canvas.key_press(key, 0)?;
        let at = canvas
            .focused_item()
            .and_then(|f| tiles.iter().position(|t| *t == f))
            .map(|i| (i / args.cols.max(1), i % args.cols.max(1)));
        match (moved, at) {
            (true, Some((row, col))) => println!("{word}: row {row}, col {col}"),
            (_, Some((row, col))) => println!("{word}: stays at row {row}, col {col}"),
            (_, None) => println!("{word}: nothing focused"),
        }
    }
    Ok(())
}
