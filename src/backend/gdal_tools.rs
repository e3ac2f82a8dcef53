use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use gdal::Dataset;
use tracing::debug;

use super::RasterBackend;
use crate::error::{OverlayError, Result};
use crate::model::{BoundingBox, PixelWindow, RasterInfo};

/// Backend that reads metadata through the GDAL bindings and runs
/// `gdalwarp` / `gdal_translate` for reprojection and cropping.
#[derive(Debug, Clone)]
pub struct GdalBackend {
    gdalwarp: PathBuf,
    gdal_translate: PathBuf,
}

impl Default for GdalBackend {
    fn default() -> Self {
        Self {
            gdalwarp: PathBuf::from("gdalwarp"),
            gdal_translate: PathBuf::from("gdal_translate"),
        }
    }
}

impl GdalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit paths for the GDAL command-line tools.
    pub fn with_programs(gdalwarp: impl Into<PathBuf>, gdal_translate: impl Into<PathBuf>) -> Self {
        Self {
            gdalwarp: gdalwarp.into(),
            gdal_translate: gdal_translate.into(),
        }
    }
}

impl RasterBackend for GdalBackend {
    fn read_info(&self, path: &Path) -> Result<RasterInfo> {
        let dataset = Dataset::open(path).map_err(|e| OverlayError::raster_read(path, e))?;

        let (width, height) = dataset.raster_size();
        if width == 0 || height == 0 {
            return Err(OverlayError::raster_read(
                path,
                format!("raster has no pixels ({}x{})", width, height),
            ));
        }

        let geo_transform = dataset
            .geo_transform()
            .map_err(|e| OverlayError::raster_read(path, format!("no geotransform: {}", e)))?;

        Ok(RasterInfo {
            width,
            height,
            bounds: BoundingBox::from_geo_transform(width, height, &geo_transform),
        })
    }

    fn reproject(&self, src: &Path, target_srs: &str, dst: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            "-of".into(),
            "VRT".into(),
            "-t_srs".into(),
            target_srs.into(),
            src.into(),
            dst.into(),
        ];
        run_tool(&self.gdalwarp, &args).map_err(|message| OverlayError::reprojection(src, message))
    }

    fn crop_and_encode(
        &self,
        src: &Path,
        window: &PixelWindow,
        quality: u8,
        dst: &Path,
    ) -> Result<()> {
        let args: Vec<OsString> = vec![
            "-of".into(),
            "JPEG".into(),
            "-co".into(),
            "WORLDFILE=YES".into(),
            "-co".into(),
            format!("QUALITY={}", quality).into(),
            "-srcwin".into(),
            window.x_offset.to_string().into(),
            window.y_offset.to_string().into(),
            window.width.to_string().into(),
            window.height.to_string().into(),
            src.into(),
            dst.into(),
        ];
        run_tool(&self.gdal_translate, &args).map_err(|message| {
            let tile = dst
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            OverlayError::extraction(tile, message)
        })
    }
}

fn run_tool(program: &Path, args: &[OsString]) -> std::result::Result<(), String> {
    debug!("Running {:?} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run {}: {}", program.display(), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::DriverManager;
    use tempfile::TempDir;

    fn gtiff_available() -> bool {
        DriverManager::get_driver_by_name("GTiff").is_ok()
    }

    #[test]
    fn test_read_info() {
        if !gtiff_available() {
            eprintln!("Skipping test: GTiff driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("source.tif");

        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<u8, _>(&path, 40, 20, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[-50.0, 0.25, 0.0, -20.0, 0.0, -0.25])
            .unwrap();
        drop(dataset);

        let info = GdalBackend::new().read_info(&path).unwrap();
        assert_eq!((info.width, info.height), (40, 20));
        assert_eq!(info.bounds.west, -50.0);
        assert_eq!(info.bounds.east, -40.0);
        assert_eq!(info.bounds.north, -20.0);
        assert_eq!(info.bounds.south, -25.0);
    }

    #[test]
    fn test_read_info_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = GdalBackend::new()
            .read_info(&temp_dir.path().join("missing.tif"))
            .unwrap_err();
        assert_eq!(err.category(), "RasterReadError");
    }

    #[test]
    fn test_missing_tool_is_reprojection_error() {
        let temp_dir = TempDir::new().unwrap();
        let backend = GdalBackend::with_programs(
            temp_dir.path().join("no-such-gdalwarp"),
            temp_dir.path().join("no-such-gdal_translate"),
        );

        let err = backend
            .reproject(
                &temp_dir.path().join("in.tif"),
                "EPSG:4326",
                &temp_dir.path().join("out.vrt"),
            )
            .unwrap_err();
        assert_eq!(err.category(), "ReprojectionError");

        let window = PixelWindow {
            x_offset: 0,
            y_offset: 0,
            width: 1,
            height: 1,
        };
        let err = backend
            .crop_and_encode(
                &temp_dir.path().join("in.vrt"),
                &window,
                75,
                &temp_dir.path().join("0101.jpg"),
            )
            .unwrap_err();
        assert!(matches!(err, OverlayError::Extraction { ref tile, .. } if tile == "0101"));
    }
}
