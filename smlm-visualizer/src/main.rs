use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use plotters::prelude::*;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input localization table (.csv) produced by the engine
    #[arg(short, long)]
    input: PathBuf,

    /// Output image file path (.png)
    #[arg(short, long, default_value = "localizations.png")]
    output: PathBuf,

    /// Width of the output image in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Height of the output image in pixels (calculated from the frame aspect ratio if not provided)
    #[arg(long)]
    height: Option<u32>,

    /// Frame width in nanometers
    #[arg(long, default_value_t = 22272.0)]
    frame_width_nm: f64,

    /// Frame height in nanometers
    #[arg(long, default_value_t = 22272.0)]
    frame_height_nm: f64,

    /// Marker radius in pixels
    #[arg(long, default_value_t = 1)]
    point_size: i32,
}

/// One row of the localization table. Columns the renderer does not need are
/// ignored by name.
#[derive(Debug, Deserialize)]
struct LocalizationRow {
    #[serde(rename = "y [nm]")]
    y: f64,
    #[serde(rename = "x [nm]")]
    x: f64,
    /// Empty for background noise.
    #[serde(rename = "particle id")]
    particle_id: Option<u32>,
}

/// Pixel height that keeps the nm-per-pixel scale equal on both axes.
fn derived_height(width: u32, frame_width_nm: f64, frame_height_nm: f64) -> u32 {
    ((width as f64) * frame_height_nm / frame_width_nm).round().max(1.0) as u32
}

fn run_with_args(args: Args) -> Result<()> {
    let mut reader = csv::Reader::from_path(&args.input)
        .with_context(|| format!("Failed to open localization table '{}'", args.input.display()))?;
    let rows: Vec<LocalizationRow> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Failed to parse '{}'", args.input.display()))?;
    info!("Loaded {} localizations from {}", rows.len(), args.input.display());

    let height = args
        .height
        .unwrap_or_else(|| derived_height(args.width, args.frame_width_nm, args.frame_height_nm));

    let root = BitMapBackend::new(&args.output, (args.width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..args.frame_width_nm, 0.0..args.frame_height_nm)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("X (nm)")
        .y_desc("Y (nm)")
        .draw()?;

    // Particle-bound detections in blue, background noise in translucent red.
    chart.draw_series(
        rows.iter()
            .filter(|r| r.particle_id.is_some())
            .map(|r| Circle::new((r.x, r.y), args.point_size, BLUE.filled())),
    )?;
    chart.draw_series(
        rows.iter()
            .filter(|r| r.particle_id.is_none())
            .map(|r| Circle::new((r.x, r.y), args.point_size, RED.mix(0.6).filled())),
    )?;

    root.present()?;
    info!("Output saved to: {}", args.output.display());

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run_with_args(args)
}
