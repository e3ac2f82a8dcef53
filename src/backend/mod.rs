//! Raster operations the tiler delegates to an external library.
//!
//! The planner, extractor and packager only talk to [`RasterBackend`], so
//! a backend can shell out to the GDAL command-line tools
//! ([`GdalBackend`]) or be replaced by an in-memory fake in tests.

mod gdal_tools;

use std::path::Path;

use crate::error::Result;
use crate::model::{PixelWindow, RasterInfo};

pub use gdal_tools::GdalBackend;

pub trait RasterBackend: Send + Sync {
    /// Read pixel size and geographic extent of the raster at `path`.
    fn read_info(&self, path: &Path) -> Result<RasterInfo>;

    /// Reproject `src` into `target_srs`, writing the result to `dst`.
    fn reproject(&self, src: &Path, target_srs: &str, dst: &Path) -> Result<()>;

    /// Crop `window` out of `src` and encode it with lossy `quality` to `dst`.
    ///
    /// `window` is always within the bounds of `src`.
    fn crop_and_encode(
        &self,
        src: &Path,
        window: &PixelWindow,
        quality: u8,
        dst: &Path,
    ) -> Result<()>;

    /// File extension of the images written by [`RasterBackend::crop_and_encode`].
    fn tile_extension(&self) -> &str {
        "jpg"
    }
}
