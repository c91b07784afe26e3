//! Error types for the DEM crate.

use thiserror::Error;

/// Errors that can occur when fetching or decoding elevation tiles.
#[derive(Debug, Error)]
pub enum DemError {
    /// HTTP request error when fetching tiles.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The tile payload is not a decodable image.
    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Failed to download tile from remote server.
    #[error("Failed to download tile z={z} x={x} y={y}: {reason}")]
    TileDownloadFailed {
        /// Zoom level.
        z: u8,
        /// X tile coordinate.
        x: i32,
        /// Y tile coordinate.
        y: i32,
        /// Reason for failure.
        reason: String,
    },

    /// Decoded tile does not have the expected square dimensions.
    #[error("Tile is {width}x{height}, expected {expected}x{expected}")]
    InvalidTileSize {
        /// Expected edge length in pixels.
        expected: u32,
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
    },

    /// Elevation buffer length does not match the grid dimensions.
    #[error("Elevation grid needs {expected} samples, got {actual}")]
    InvalidGridLength {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Invalid zoom level.
    #[error("Invalid zoom level {0} (must be 0-22)")]
    InvalidZoomLevel(u8),
}
