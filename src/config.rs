use std::path::PathBuf;

use crate::error::{OverlayError, Result};

pub const DEFAULT_QUALITY: u8 = 75;
pub const DEFAULT_MAX_TILE_SIZE: usize = 1024;
/// KML viewers start to struggle past this many ground overlays.
pub const DEFAULT_MAX_TILE_COUNT_WARNING: usize = 100;
pub const DEFAULT_TARGET_SRS: &str = "EPSG:4326";
pub const DEFAULT_DRAW_ORDER: i32 = 30;

/// Settings shared by the grid planner, the tile extractor and the packager.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Lossy encoding quality of each tile image (0..=100).
    pub quality: u8,
    pub max_tile_width: usize,
    pub max_tile_height: usize,
    /// Tile counts above this only produce a warning.
    pub max_tile_count_warning: usize,
    pub target_srs: String,
    pub draw_order: i32,
    /// Archive world/aux files next to their images instead of discarding them.
    pub keep_sidecars: bool,
    pub parallel: bool,
    /// Parent of the per-run working directory; the system temp dir if unset.
    pub work_root: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_tile_width: DEFAULT_MAX_TILE_SIZE,
            max_tile_height: DEFAULT_MAX_TILE_SIZE,
            max_tile_count_warning: DEFAULT_MAX_TILE_COUNT_WARNING,
            target_srs: DEFAULT_TARGET_SRS.to_string(),
            draw_order: DEFAULT_DRAW_ORDER,
            keep_sidecars: false,
            parallel: true,
            work_root: None,
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(OverlayError::Configuration(format!(
                "quality must be within 0..=100, got {}",
                self.quality
            )));
        }
        if self.max_tile_width == 0 || self.max_tile_height == 0 {
            return Err(OverlayError::Configuration(format!(
                "maximum tile size must be positive, got {}x{}",
                self.max_tile_width, self.max_tile_height
            )));
        }
        if self.target_srs.trim().is_empty() {
            return Err(OverlayError::Configuration(
                "target SRS must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
