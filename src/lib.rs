pub mod backend;
pub mod config;
pub mod error;
pub mod extractor;
pub mod grid;
pub mod kml;
pub mod model;
pub mod package;
pub mod pipeline;

pub use backend::{GdalBackend, RasterBackend};
pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use extractor::TileExtractor;
pub use grid::{plan, TileGrid};
pub use kml::DescriptorBuilder;
pub use model::{BoundingBox, ExtractedTile, PixelWindow, RasterInfo, TileSpec};
pub use package::{PackageAssembler, WorkDir};
pub use pipeline::{build_overlay, OverlaySummary};
