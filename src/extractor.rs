use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::backend::RasterBackend;
use crate::error::{OverlayError, Result};
use crate::grid::TileGrid;
use crate::model::{ExtractedTile, RasterInfo, TileSpec};

/// Crops tiles out of one reprojected raster into a working directory.
pub struct TileExtractor<'a, B: RasterBackend + ?Sized> {
    backend: &'a B,
    source: &'a Path,
    source_info: &'a RasterInfo,
    output_dir: &'a Path,
    quality: u8,
}

impl<'a, B: RasterBackend + ?Sized> TileExtractor<'a, B> {
    pub fn new(
        backend: &'a B,
        source: &'a Path,
        source_info: &'a RasterInfo,
        output_dir: &'a Path,
        quality: u8,
    ) -> Self {
        Self {
            backend,
            source,
            source_info,
            output_dir,
            quality,
        }
    }

    /// Write the image for `spec` and read its bounding box back from the output.
    pub fn extract(&self, spec: &TileSpec) -> Result<ExtractedTile> {
        let window = spec
            .window()
            .clamped(self.source_info.width, self.source_info.height);
        if window.is_empty() {
            return Err(OverlayError::extraction(
                &spec.name,
                format!(
                    "window {:?} lies outside the {}x{} raster",
                    spec.window(),
                    self.source_info.width,
                    self.source_info.height
                ),
            ));
        }

        let image_path = self
            .output_dir
            .join(format!("{}.{}", spec.name, self.backend.tile_extension()));
        debug!("Extracting tile {} from window {:?}", spec.name, window);

        self.backend
            .crop_and_encode(self.source, &window, self.quality, &image_path)
            .map_err(|e| as_extraction_error(&spec.name, e))?;

        if !image_path.is_file() {
            return Err(OverlayError::extraction(
                &spec.name,
                format!("no image written to {:?}", image_path),
            ));
        }

        let info = self
            .backend
            .read_info(&image_path)
            .map_err(|e| as_extraction_error(&spec.name, e))?;

        Ok(ExtractedTile {
            spec: spec.clone(),
            sidecars: sidecar_files(&image_path),
            image_path,
            bbox: info.bounds,
        })
    }

    /// Extract every tile of `grid`, in grid order.
    ///
    /// The first failure aborts the batch; tiles already written stay in the
    /// working directory for its owner to remove.
    pub fn extract_all(&self, grid: &TileGrid, parallel: bool) -> Result<Vec<ExtractedTile>> {
        info!("Extracting {} tiles", grid.tile_count());

        if parallel {
            grid.tiles()
                .par_iter()
                .map(|spec| self.extract(spec))
                .collect()
        } else {
            grid.iter().map(|spec| self.extract(spec)).collect()
        }
    }
}

fn as_extraction_error(tile: &str, err: OverlayError) -> OverlayError {
    match err {
        e @ OverlayError::Extraction { .. } => e,
        other => OverlayError::extraction(tile, other),
    }
}

/// World and aux files GDAL writes next to `image`, if present.
pub fn sidecar_files(image: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![image.with_extension("wld")];
    let mut aux = image.as_os_str().to_owned();
    aux.push(".aux.xml");
    candidates.push(PathBuf::from(aux));

    candidates.into_iter().filter(|p| p.is_file()).collect()
}
