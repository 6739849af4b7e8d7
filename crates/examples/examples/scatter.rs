use anyhow::Result;
use clap::Parser;
use trellis::{Canvas, geom::PixelRect};
use trellis_examples::{
    init_tracing,
    scatter::{self, Tally},
};

/// Build a random scene, sample picks across it and paint it
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of shapes
    #[clap(short, long, default_value_t = 200)]
    count: usize,

    /// Random seed
    #[clap(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of sample points
    #[clap(short = 'n', long, default_value_t = 10)]
    samples: usize,

    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut canvas = Canvas::new();
    canvas.set_allocation(800, 600);
    scatter::build(&mut canvas, args.count, args.seed)?;
    for (p, hit) in scatter::sample_picks(&mut canvas, args.samples, args.seed)? {
        match hit {
            Some(id) => println!("({:.1}, {:.1}) -> {id:?} {:?}", p.x, p.y, canvas.bounds(id)?),
            None => println!("({:.1}, {:.1}) -> nothing", p.x, p.y),
        }
    }

    let mut tally = Tally::default();
    canvas.paint(&mut tally, PixelRect::new(0, 0, 800, 600))?;
    println!("painted {} fills and {} strokes", tally.fills, tally.strokes);
    Ok(())
}
