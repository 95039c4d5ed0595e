//! Render random observations to a PNG file.
//!
//! Usage:
//!   cargo run --package heatmap --example render_snapshot -- --points 2000 --output heatmap.png
//!   cargo run --package heatmap --example render_snapshot -- --config heatmap.json --log-level debug

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use heatmap::{Heatmap, HeatmapConfig};
use test_utils::random_points;

#[derive(Parser, Debug)]
#[command(name = "render_snapshot")]
#[command(about = "Render random observations into a heatmap PNG")]
struct Args {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface width, overrides the configuration
    #[arg(long, default_value = "800")]
    width: u32,

    /// Surface height, overrides the configuration
    #[arg(long, default_value = "600")]
    height: u32,

    /// Number of random observations
    #[arg(long, default_value = "1000")]
    points: usize,

    /// Largest observation value
    #[arg(long, default_value = "10")]
    max_value: u32,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output PNG path
    #[arg(short, long, default_value = "heatmap.png")]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => HeatmapConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HeatmapConfig::default(),
    };
    config.width = args.width;
    config.height = args.height;

    let mut map = Heatmap::new(config)?;
    map.on_extrema_change(|change| {
        info!(min = change.min, max = change.max, "Extrema changed");
    });

    let points = random_points(args.seed, args.points, args.width, args.height, args.max_value);
    map.add_data(points)?;

    let png = map.get_image_png()?;
    std::fs::write(&args.output, &png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let data = map.get_data();
    info!(
        cells = data.data.len(),
        max = data.max,
        bytes = png.len(),
        output = %args.output.display(),
        "Wrote heatmap"
    );

    Ok(())
}
