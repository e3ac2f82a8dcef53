use tracing::{info, warn};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::model::TileSpec;

/// Row-major grid of equally sized tiles covering one raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    pub rows: usize,
    pub cols: usize,
    pub tile_width: usize,
    pub tile_height: usize,
    tiles: Vec<TileSpec>,
}

impl TileGrid {
    pub fn tile_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn tiles(&self) -> &[TileSpec] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileSpec> {
        self.tiles.iter()
    }
}

impl<'a> IntoIterator for &'a TileGrid {
    type Item = &'a TileSpec;
    type IntoIter = std::slice::Iter<'a, TileSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Split a `width` x `height` raster into the fewest columns and rows whose
/// tiles fit within `max_tile_width` x `max_tile_height`.
///
/// Every tile gets the same pixel size, so the last column and row may
/// reach past the raster edge; the extractor clamps those windows.
pub fn plan(
    width: usize,
    height: usize,
    max_tile_width: usize,
    max_tile_height: usize,
) -> Result<TileGrid> {
    if width == 0 || height == 0 {
        return Err(OverlayError::Configuration(format!(
            "raster size must be positive, got {}x{}",
            width, height
        )));
    }
    if max_tile_width == 0 || max_tile_height == 0 {
        return Err(OverlayError::Configuration(format!(
            "maximum tile size must be positive, got {}x{}",
            max_tile_width, max_tile_height
        )));
    }

    let cols = width.div_ceil(max_tile_width);
    let rows = height.div_ceil(max_tile_height);
    let tile_width = width.div_ceil(cols);
    let tile_height = height.div_ceil(rows);

    let digits = name_digits(rows, cols);
    let tiles = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| TileSpec {
            row,
            col,
            pixel_width: tile_width,
            pixel_height: tile_height,
            name: tile_name(row, col, digits),
        })
        .collect();

    Ok(TileGrid {
        rows,
        cols,
        tile_width,
        tile_height,
        tiles,
    })
}

/// [`plan`] with the limits of `config`, logging the resulting layout.
pub fn plan_with_config(width: usize, height: usize, config: &OverlayConfig) -> Result<TileGrid> {
    let grid = plan(width, height, config.max_tile_width, config.max_tile_height)?;

    if grid.tile_count() > config.max_tile_count_warning {
        warn!(
            "KML can handle a maximum of {} tiles (asking for {}).",
            config.max_tile_count_warning,
            grid.tile_count()
        );
    }
    info!(
        "Creating {} tiles ({}x{}) of {}x{} pixels.",
        grid.tile_count(),
        grid.cols,
        grid.rows,
        grid.tile_width,
        grid.tile_height
    );

    Ok(grid)
}

// Two digits per index, widened when the grid outgrows them so names stay unique.
fn name_digits(rows: usize, cols: usize) -> usize {
    let largest = rows.max(cols) - 1;
    largest.to_string().len().max(2)
}

fn tile_name(row: usize, col: usize, digits: usize) -> String {
    format!("{:0width$}{:0width$}", row, col, width = digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn names(grid: &TileGrid) -> Vec<String> {
        grid.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_exact_fit_is_single_tile() {
        let grid = plan(1024, 1024, 1024, 1024).unwrap();
        assert_eq!((grid.rows, grid.cols), (1, 1));
        assert_eq!(grid.tile_count(), 1);
        assert_eq!((grid.tile_width, grid.tile_height), (1024, 1024));
        assert_eq!(names(&grid), vec!["0000"]);
    }

    #[test]
    fn test_wide_raster() {
        let grid = plan(2000, 1000, 1024, 1024).unwrap();
        assert_eq!(grid.cols, 2);
        assert_eq!(grid.rows, 1);
        assert_eq!(grid.tile_count(), 2);
        assert_eq!(grid.tile_width, 1000);
        assert_eq!(grid.tile_height, 1000);
    }

    #[test]
    fn test_square_grid_is_row_major() {
        let grid = plan(2048, 2048, 1024, 1024).unwrap();
        assert_eq!(names(&grid), vec!["0000", "0001", "0100", "0101"]);

        let positions: Vec<(usize, usize)> = grid.iter().map(|t| (t.row, t.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_uneven_split_uses_uniform_tiles() {
        let grid = plan(2049, 1000, 1024, 1024).unwrap();
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.tile_width, 683);
        assert!(grid.iter().all(|t| t.pixel_width == 683));
        assert_eq!(grid.tile_width * grid.cols, 2049);

        // Last column reaches past the raster edge
        let grid = plan(2050, 1000, 1024, 1024).unwrap();
        assert_eq!(grid.tile_width, 684);
        assert!(grid.tile_width * grid.cols > 2050);
    }

    #[test]
    fn test_counts_match_ceiling_division() {
        for &(w, h, mw, mh) in &[
            (1, 1, 1, 1),
            (7, 3, 2, 2),
            (1000, 1, 999, 1),
            (5000, 3000, 1024, 512),
            (10, 10, 100, 100),
            (4097, 4096, 1024, 1024),
        ] {
            let grid = plan(w, h, mw, mh).unwrap();
            assert_eq!(grid.cols, (w + mw - 1) / mw, "cols for {}x{}", w, h);
            assert_eq!(grid.rows, (h + mh - 1) / mh, "rows for {}x{}", w, h);
            assert_eq!(grid.tile_count(), grid.rows * grid.cols);
            assert_eq!(grid.tiles().len(), grid.tile_count());
            assert!(grid.tile_width <= mw);
            assert!(grid.tile_height <= mh);
        }
    }

    #[test]
    fn test_names_are_unique_and_deterministic() {
        let first = plan(5000, 3000, 1024, 512).unwrap();
        let second = plan(5000, 3000, 1024, 512).unwrap();
        assert_eq!(names(&first), names(&second));

        let unique: HashSet<String> = names(&first).into_iter().collect();
        assert_eq!(unique.len(), first.tile_count());
    }

    #[test]
    fn test_large_grid_widens_names() {
        let grid = plan(101, 11, 1, 1).unwrap();
        assert_eq!(grid.cols, 101);
        assert_eq!(grid.iter().next().unwrap().name, "000000");
        assert_eq!(grid.iter().last().unwrap().name, "010100");

        let unique: HashSet<String> = names(&grid).into_iter().collect();
        assert_eq!(unique.len(), grid.tile_count());

        let mut sorted = names(&grid);
        sorted.sort();
        assert_eq!(sorted, names(&grid));
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(plan(0, 10, 10, 10).is_err());
        assert!(plan(10, 10, 0, 10).is_err());
    }

    /// Run `f` with a subscriber that records formatted events.
    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, logs)
    }

    #[test]
    fn test_tile_count_warning_is_advisory() {
        let config = OverlayConfig {
            max_tile_width: 10,
            max_tile_height: 10,
            max_tile_count_warning: 4,
            ..Default::default()
        };

        let (grid, logs) = capture_logs(|| plan_with_config(100, 100, &config));
        assert_eq!(grid.unwrap().tile_count(), 100);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("KML can handle a maximum of 4 tiles (asking for 100)."));
    }

    #[test]
    fn test_no_warning_at_tile_count_limit() {
        let config = OverlayConfig {
            max_tile_width: 50,
            max_tile_height: 50,
            max_tile_count_warning: 4,
            ..Default::default()
        };

        let (grid, logs) = capture_logs(|| plan_with_config(100, 100, &config));
        assert_eq!(grid.unwrap().tile_count(), 4);
        assert!(!logs.contains("KML can handle a maximum"));
        assert!(logs.contains("Creating 4 tiles (2x2) of 50x50 pixels."));
    }
}
