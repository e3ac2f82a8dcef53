use anyhow::{Context, Result};
use clap::Parser;
use kmz_tiler::{build_overlay, GdalBackend, OverlayConfig};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input raster file (ex.: map.tif)
    #[arg(value_name = "SRC")]
    input: PathBuf,

    /// Output KMZ file (ex.: map.kmz)
    #[arg(value_name = "TRG")]
    output: PathBuf,

    /// JPEG quality of each tile (0-100)
    #[arg(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Maximum tile width in pixels
    #[arg(long, default_value_t = 1024)]
    max_width: usize,

    /// Maximum tile height in pixels
    #[arg(long, default_value_t = 1024)]
    max_height: usize,

    /// Warn when more tiles than this are produced
    #[arg(long, default_value_t = 100)]
    max_tiles: usize,

    /// Target spatial reference system
    #[arg(long, default_value = "EPSG:4326")]
    t_srs: String,

    /// Store world/aux files in the package
    #[arg(long)]
    keep_sidecars: bool,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Extract tiles one at a time
    #[arg(long)]
    sequential: bool,

    /// Path to the gdalwarp executable
    #[arg(long, default_value = "gdalwarp")]
    gdalwarp: PathBuf,

    /// Path to the gdal_translate executable
    #[arg(long, default_value = "gdal_translate")]
    gdal_translate: PathBuf,

    /// Show debug output (-vv for trace); otherwise RUST_LOG or "info"
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log filter for the given `-v` count; `None` defers to `RUST_LOG`.
fn verbosity_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbosity_filter(verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    // Command-line arguments
    let args = Args::parse();

    // Logging
    init_logging(args.verbose);

    // Worker pool for tile extraction
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    // Overlay settings and GDAL tools
    let config = OverlayConfig {
        quality: args.quality,
        max_tile_width: args.max_width,
        max_tile_height: args.max_height,
        max_tile_count_warning: args.max_tiles,
        target_srs: args.t_srs.clone(),
        keep_sidecars: args.keep_sidecars,
        parallel: !args.sequential,
        ..Default::default()
    };
    let backend = GdalBackend::with_programs(&args.gdalwarp, &args.gdal_translate);

    info!("Processing {:?} -> {:?}", args.input, args.output);
    match build_overlay(&args.input, &args.output, &config, &backend) {
        Ok(summary) => {
            info!(
                "Created {:?} with {} tiles ({}x{})",
                summary.output, summary.tile_count, summary.cols, summary.rows
            );
            Ok(())
        }
        Err(e) => {
            error!("{}: {}", e.category(), e);
            Err(e.into())
        }
    }
}
