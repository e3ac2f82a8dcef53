use std::path::PathBuf;

/// Edges of a raster or tile in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Bounding box of a `width` x `height` raster under a GDAL-style
    /// geotransform `[origin_x, px_w, rot_x, origin_y, rot_y, px_h]`.
    ///
    /// All four corners are transformed so that rotated or south-up
    /// rasters still produce `north >= south` and `east >= west`.
    pub fn from_geo_transform(width: usize, height: usize, gt: &[f64; 6]) -> Self {
        let corner = |px: f64, py: f64| {
            (
                gt[0] + px * gt[1] + py * gt[2],
                gt[3] + px * gt[4] + py * gt[5],
            )
        };
        let (w, h) = (width as f64, height as f64);
        let corners = [corner(0.0, 0.0), corner(w, 0.0), corner(0.0, h), corner(w, h)];

        let mut bbox = BoundingBox {
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
        };
        for (x, y) in corners {
            bbox.west = bbox.west.min(x);
            bbox.east = bbox.east.max(x);
            bbox.south = bbox.south.min(y);
            bbox.north = bbox.north.max(y);
        }
        bbox
    }
}

/// Size and extent of a raster, read once per file.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bounds: BoundingBox,
}

/// Source pixel window handed to the cropping operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x_offset: usize,
    pub y_offset: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    /// Trim the window so it never reaches past a `width` x `height` raster.
    pub fn clamped(&self, width: usize, height: usize) -> PixelWindow {
        let x_offset = self.x_offset.min(width);
        let y_offset = self.y_offset.min(height);
        PixelWindow {
            x_offset,
            y_offset,
            width: self.width.min(width - x_offset),
            height: self.height.min(height - y_offset),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Identity and geometry of one tile in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpec {
    pub row: usize,
    pub col: usize,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub name: String,
}

impl TileSpec {
    /// Window of the source raster covered by this tile, before clamping.
    pub fn window(&self) -> PixelWindow {
        PixelWindow {
            x_offset: self.col * self.pixel_width,
            y_offset: self.row * self.pixel_height,
            width: self.pixel_width,
            height: self.pixel_height,
        }
    }
}

/// A tile after its image has been written to the working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTile {
    pub spec: TileSpec,
    pub image_path: PathBuf,
    /// World/aux files the encoder may have produced next to the image.
    pub sidecars: Vec<PathBuf>,
    pub bbox: BoundingBox,
}

impl ExtractedTile {
    /// File name of the image inside the package.
    pub fn image_file_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.spec.name.clone())
    }
}
