use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::backend::RasterBackend;
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::extractor::TileExtractor;
use crate::grid::plan_with_config;
use crate::kml::DescriptorBuilder;
use crate::package::{PackageAssembler, WorkDir};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySummary {
    pub rows: usize,
    pub cols: usize,
    pub tile_count: usize,
    pub output: PathBuf,
}

/// Convert the raster at `input` into a KMZ ground overlay at `output`.
///
/// Nothing is written to `output` unless every step succeeds, and the
/// working directory is removed on every exit path.
pub fn build_overlay<B: RasterBackend + ?Sized>(
    input: &Path,
    output: &Path,
    config: &OverlayConfig,
    backend: &B,
) -> Result<OverlaySummary> {
    let start_time = Instant::now();
    config.validate()?;

    // Document name and working directory prefix come from the output file
    let name = output
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            OverlayError::Configuration(format!("output path {:?} has no file name", output))
        })?
        .to_string();

    // Input may be any path the backend can open, including GDAL virtual paths
    let source_info = backend.read_info(input).map_err(|e| match e {
        e @ OverlayError::RasterRead { .. } => e,
        other => OverlayError::raster_read(input, other),
    })?;
    if source_info.width == 0 || source_info.height == 0 {
        return Err(OverlayError::raster_read(
            input,
            format!(
                "raster has no pixels ({}x{})",
                source_info.width, source_info.height
            ),
        ));
    }
    info!(
        "Read {:?}: {}x{} pixels",
        input, source_info.width, source_info.height
    );

    let prefix = format!("{}_", name);
    let work_dir = match &config.work_root {
        Some(root) => WorkDir::create_in(root, &prefix)?,
        None => WorkDir::create(&prefix)?,
    };

    // Reproject into a virtual raster inside the working directory
    let reprojected = work_dir.path().join(format!("{}.vrt", name));
    info!("Reprojecting to {}", config.target_srs);
    backend
        .reproject(input, &config.target_srs, &reprojected)
        .map_err(|e| match e {
            e @ OverlayError::Reprojection { .. } => e,
            other => OverlayError::reprojection(input, other),
        })?;
    let reprojected_info = backend
        .read_info(&reprojected)
        .map_err(|e| OverlayError::reprojection(&reprojected, e))?;
    if reprojected_info.width == 0 || reprojected_info.height == 0 {
        return Err(OverlayError::reprojection(
            &reprojected,
            format!(
                "reprojected raster has no pixels ({}x{})",
                reprojected_info.width, reprojected_info.height
            ),
        ));
    }

    let grid = plan_with_config(reprojected_info.width, reprojected_info.height, config)?;

    let extractor = TileExtractor::new(
        backend,
        &reprojected,
        &reprojected_info,
        work_dir.path(),
        config.quality,
    );
    let tiles = extractor.extract_all(&grid, config.parallel)?;

    // Tiles no longer need the reprojected raster
    if reprojected.exists() {
        fs::remove_file(&reprojected)?;
    }

    info!("Building KML...");
    let document = DescriptorBuilder::new()
        .with_draw_order(config.draw_order)
        .build(&name, &tiles)?;

    // Archive everything and release the working directory
    PackageAssembler::new(config.keep_sidecars).assemble(output, &document, &tiles, work_dir)?;

    info!(
        "Wrote {:?} ({} tiles) in {:?}",
        output,
        grid.tile_count(),
        start_time.elapsed()
    );

    Ok(OverlaySummary {
        rows: grid.rows,
        cols: grid.cols,
        tile_count: grid.tile_count(),
        output: output.to_path_buf(),
    })
}
