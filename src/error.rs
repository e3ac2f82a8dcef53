use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to read raster {path:?}: {message}")]
    RasterRead { path: PathBuf, message: String },

    #[error("failed to reproject {path:?}: {message}")]
    Reprojection { path: PathBuf, message: String },

    #[error("failed to extract tile {tile}: {message}")]
    Extraction { tile: String, message: String },

    #[error("failed to write package {path:?}: {message}")]
    Packaging { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

impl OverlayError {
    /// Short category name used in log output.
    pub fn category(&self) -> &'static str {
        match self {
            OverlayError::Configuration(_) => "ConfigurationError",
            OverlayError::RasterRead { .. } | OverlayError::Gdal(_) => "RasterReadError",
            OverlayError::Reprojection { .. } => "ReprojectionError",
            OverlayError::Extraction { .. } => "ExtractionError",
            OverlayError::Packaging { .. } | OverlayError::Io(_) => "PackagingError",
        }
    }

    pub(crate) fn raster_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        OverlayError::RasterRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn reprojection(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        OverlayError::Reprojection {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn extraction(tile: impl Into<String>, message: impl ToString) -> Self {
        OverlayError::Extraction {
            tile: tile.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn packaging(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        OverlayError::Packaging {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
