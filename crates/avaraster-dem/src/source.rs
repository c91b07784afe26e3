//! Tile sources.
//!
//! [`TileSource`] is the seam between the provider's cache and wherever tiles
//! come from. [`HttpTileSource`] downloads terrain-RGB PNGs with a blocking
//! reqwest client; tests substitute in-memory sources.

use crate::{DemError, ElevationGrid, Result, TileKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Mapbox terrain-RGB tileset base URL.
pub const MAPBOX_TERRAIN_RGB_URL: &str = "https://api.mapbox.com/v4/mapbox.terrain-rgb";

/// Something that can produce the elevation grid for a tile.
///
/// Implementations are called concurrently from rayon worker threads.
pub trait TileSource: Send + Sync {
    /// Fetch and decode one tile.
    fn fetch(&self, key: TileKey) -> Result<ElevationGrid>;
}

impl<S: TileSource + ?Sized> TileSource for Arc<S> {
    fn fetch(&self, key: TileKey) -> Result<ElevationGrid> {
        (**self).fetch(key)
    }
}

impl<S: TileSource + ?Sized> TileSource for Box<S> {
    fn fetch(&self, key: TileKey) -> Result<ElevationGrid> {
        (**self).fetch(key)
    }
}

/// Tile source and tiling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSourceConfig {
    /// Tileset URL without the `/{z}/{x}/{y}` suffix.
    pub base_url: String,
    /// Access token appended as `?access_token=`.
    pub access_token: Option<String>,
    /// Decoded tile edge length in pixels.
    pub tile_size: u32,
    /// Highest tile zoom ever requested.
    pub max_tile_zoom: u8,
    /// Tile zoom = floor(map zoom) + offset.
    pub zoom_offset: u8,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Most tiles one `prepare()` may cover. Larger viewports are prepared
    /// at a coarser zoom.
    pub max_tiles_per_prepare: usize,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            base_url: MAPBOX_TERRAIN_RGB_URL.to_string(),
            access_token: None,
            tile_size: 512,
            max_tile_zoom: 12,
            zoom_offset: 2,
            timeout_secs: 30,
            max_tiles_per_prepare: 256,
        }
    }
}

/// Downloads `@2x` terrain-RGB PNG tiles over HTTP.
pub struct HttpTileSource {
    client: reqwest::blocking::Client,
    base_url: String,
    access_token: Option<String>,
    tile_size: u32,
}

impl std::fmt::Debug for HttpTileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTileSource")
            .field("base_url", &self.base_url)
            .field("tile_size", &self.tile_size)
            .finish()
    }
}

impl HttpTileSource {
    /// Create a source with a client bounded by `config.timeout_secs`.
    pub fn new(config: &TileSourceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            tile_size: config.tile_size,
        })
    }

    /// Get the URL for a tile.
    pub fn tile_url(&self, key: TileKey) -> String {
        let url = format!("{}/{}/{}/{}@2x.pngraw", self.base_url, key.z, key.x, key.y);
        match &self.access_token {
            Some(token) => format!("{url}?access_token={token}"),
            None => url,
        }
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, key: TileKey) -> Result<ElevationGrid> {
        debug!(tile = %key, "Fetching elevation tile");

        let response = self.client.get(self.tile_url(key)).send()?;
        if !response.status().is_success() {
            return Err(DemError::TileDownloadFailed {
                z: key.z,
                x: key.x,
                y: key.y,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes()?;
        ElevationGrid::from_png_bytes(&bytes, self.tile_size)
    }
}
