//! Rendered overlay and its anchoring metadata.

use crate::Result;
use avaraster_common::{Bounds, GeoPoint};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// An RGBA raster anchored to a lon/lat box.
///
/// Row 0 is the northern edge and column 0 the western edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Pixel buffer, `width x height`.
    pub image: RgbaImage,
    /// Box the raster covers.
    pub bounds: Bounds,
}

/// JSON description written next to an overlay PNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySidecar {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Box the raster covers.
    pub bounds: Bounds,
    /// `[lng, lat]` of the top-left, top-right, bottom-right and bottom-left
    /// corners.
    pub coordinates: [[f64; 2]; 4],
    /// Suggested layer opacity.
    pub opacity: f64,
}

impl Overlay {
    /// Wrap a finished pixel buffer.
    pub fn new(image: RgbaImage, bounds: Bounds) -> Self {
        Self { image, bounds }
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [GeoPoint; 4] {
        self.bounds.corners()
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|pixel| pixel.0[3] != 0).count()
    }

    /// Metadata for anchoring the image on a map.
    pub fn sidecar(&self, opacity: f64) -> OverlaySidecar {
        OverlaySidecar {
            width: self.width(),
            height: self.height(),
            bounds: self.bounds,
            coordinates: self.corners().map(|corner| [corner.lng, corner.lat]),
            opacity,
        }
    }

    /// Encode the raster as PNG.
    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }

    /// Write the PNG and a `<path>.json` sidecar. Returns the sidecar path.
    pub fn write_with_sidecar(&self, path: impl AsRef<Path>, opacity: f64) -> Result<PathBuf> {
        let path = path.as_ref();
        self.write_png(path)?;

        let mut sidecar_path = path.as_os_str().to_owned();
        sidecar_path.push(".json");
        let sidecar_path = PathBuf::from(sidecar_path);
        std::fs::write(&sidecar_path, serde_json::to_string_pretty(&self.sidecar(opacity))?)?;

        info!(
            path = %path.display(),
            width = self.width(),
            height = self.height(),
            "Wrote overlay"
        );
        Ok(sidecar_path)
    }
}
