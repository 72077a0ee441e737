use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use crossterm::style::{Color, Stylize};
use serde::Serialize;
use top_colors::{ExtractOptions, Palette, Swatch, try_extract_top_colors};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

/// Print the dominant colors of images as hex-coded swatches.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths (PNG, JPEG, BMP, GIF, ...)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of dominant colors to extract
    #[arg(short = 'k', long, default_value_t = 10)]
    n_colors: usize,

    /// Width and height are divided by this before clustering
    #[arg(short, long, default_value_t = 10)]
    factor: u32,

    /// Seed for k-means initialisation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum k-means iterations
    #[arg(long, default_value_t = 300)]
    max_iter: usize,

    /// Print a JSON report instead of colored swatches
    #[arg(long)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    path: &'a PathBuf,
    swatches: &'a Palette,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO })
        .init();

    run(&args, &mut std::io::stdout().lock())
}

/// Extract every input and print the results to `out`. A failed image is
/// logged and skipped; the error is returned once all inputs are done.
fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let options = ExtractOptions::default()
        .with_n_colors(args.n_colors)
        .with_downsample_factor(args.factor)
        .with_seed(args.seed)
        .with_max_iter(args.max_iter);
    options.validate()?;

    let mut palettes = Vec::with_capacity(args.inputs.len());
    let mut failed = 0usize;
    for input in &args.inputs {
        match try_extract_top_colors(input, &options) {
            Ok(palette) => palettes.push((input, palette)),
            Err(e) => {
                failed += 1;
                error!(path = %input.display(), "Error processing the image: {e}");
                if e.is_input_error() {
                    info!("choose a different file and try again");
                }
            }
        }
    }

    if args.json {
        let reports: Vec<Report> = palettes
            .iter()
            .map(|(path, palette)| Report { path: *path, swatches: palette })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?;
    } else {
        for (path, palette) in &palettes {
            writeln!(out, "{}", path.display())?;
            for swatch in palette.swatches() {
                writeln!(out, "{}", swatch_line(swatch))?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} images could not be processed", args.inputs.len());
    }
    Ok(())
}

fn swatch_line(swatch: &Swatch) -> String {
    let block = "      ".on(Color::Rgb {
        r: swatch.color.r,
        g: swatch.color.g,
        b: swatch.color.b,
    });
    format!("  {block}  {}  {:>5.1}%", swatch.hex, swatch.share * 100.0)
}
