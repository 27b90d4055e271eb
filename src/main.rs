use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use brushlayer::Painting;
use brushlayer::logging::{LoggingConfig, init_logging};
use clap::Parser;
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[clap(about = "Generate layered brushstrokes from an image")]
struct Args {
    /// Source image
    image: PathBuf,

    /// JSON style file (canvasScale + per-layer brush parameters)
    style: PathBuf,

    /// Where to write the canvas, defaults to <image stem>.canvas.json
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Seed for reproducible output
    #[clap(short, long)]
    seed: Option<u64>,

    /// Print per-layer diagnostics
    #[clap(short, long)]
    verbose: bool,
}

fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "canvas".to_string());
    PathBuf::from(format!("{stem}.canvas.json"))
}

fn run(args: &Args) -> brushlayer::Result<()> {
    let mut painting = Painting::load(&args.image, &args.style)?;

    let mut rng = match args.seed {
        Some(seed) => {
            info!("seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    painting.process(&mut rng);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.image));
    painting.save(&output)?;

    info!(
        "wrote {} strokes in {} layers to {}",
        painting.canvas().stroke_count(),
        painting.canvas().layers.len(),
        output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(LoggingConfig::verbose(args.verbose));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("[{}] {err}", err.error_code());
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
