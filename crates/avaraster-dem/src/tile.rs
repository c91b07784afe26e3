//! Decoded elevation grids.

use crate::{DemError, Result};
use image::{ImageFormat, Rgb, RgbImage};

/// A square block of decoded elevations.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    /// Elevation data in row-major order (north to south, west to east).
    data: Vec<f64>,
    /// Width of the grid in pixels.
    width: u32,
    /// Height of the grid in pixels.
    height: u32,
}

/// Decode one terrain-RGB texel into meters.
pub fn decode_terrain_rgb(r: u8, g: u8, b: u8) -> f64 {
    let value = u32::from(r) * 65536 + u32::from(g) * 256 + u32::from(b);
    -10000.0 + f64::from(value) * 0.1
}

/// Encode meters as a terrain-RGB texel (0.1 m resolution).
///
/// Values outside the representable range saturate.
pub fn encode_terrain_rgb(elevation: f64) -> [u8; 3] {
    let value = ((elevation + 10000.0) * 10.0).round().clamp(0.0, f64::from(0xFF_FFFFu32)) as u32;
    let [_, r, g, b] = value.to_be_bytes();
    [r, g, b]
}

impl ElevationGrid {
    /// Wrap an existing row-major buffer.
    pub fn new(width: u32, height: u32, data: Vec<f64>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(DemError::InvalidGridLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Build a grid by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { data, width, height }
    }

    /// A `size`x`size` grid with the same elevation everywhere.
    pub fn constant(size: u32, elevation: f64) -> Self {
        Self::from_fn(size, size, |_, _| elevation)
    }

    /// Decode a terrain-RGB image, requiring `expected_size` square pixels.
    pub fn from_rgb_image(image: &RgbImage, expected_size: u32) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width != expected_size || height != expected_size {
            return Err(DemError::InvalidTileSize {
                expected: expected_size,
                width,
                height,
            });
        }

        let data = image
            .pixels()
            .map(|Rgb([r, g, b])| decode_terrain_rgb(*r, *g, *b))
            .collect();
        Ok(Self { data, width, height })
    }

    /// Decode PNG bytes as returned by the tile server.
    pub fn from_png_bytes(bytes: &[u8], expected_size: u32) -> Result<Self> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgb8();
        Self::from_rgb_image(&image, expected_size)
    }

    /// Encode this grid as terrain-RGB. Used to produce tile fixtures.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let elevation = self.data[(y * self.width + x) as usize];
            Rgb(encode_terrain_rgb(elevation))
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Elevation at integer pixel coordinates, `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }
}
