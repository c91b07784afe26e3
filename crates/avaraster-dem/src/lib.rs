//! # avaraster-dem
//!
//! Terrain-RGB elevation tiles, bilinear point sampling and slope/aspect
//! metrics.
//!
//! ## Overview
//!
//! Elevation comes from 512x512 terrain-RGB raster tiles (Mapbox `@2x`
//! `pngraw` variant) addressed with the OpenStreetMap Slippy Map convention.
//! Each texel encodes height as
//! `elevation = -10000 + (R * 65536 + G * 256 + B) * 0.1` meters.
//!
//! [`TerrainRgbProvider::prepare`] fetches every tile covering a viewport in
//! parallel and caches it for the provider's lifetime. A tile whose fetch or
//! decode fails is cached as unavailable and never retried.
//! [`TerrainRgbProvider::get_elevation`] then answers point queries from the
//! cache with bilinear interpolation, borrowing texels from neighboring tiles
//! at tile edges.
//!
//! [`calculate_terrain_metrics`] derives slope and an 8-sector [`Aspect`]
//! from four elevation samples around a point.
//!
//! ## Example
//!
//! ```no_run
//! use avaraster_common::{Bounds, GeoPoint};
//! use avaraster_dem::{calculate_terrain_metrics, HttpTileSource, TerrainRgbProvider, TileSourceConfig};
//!
//! let config = TileSourceConfig {
//!     access_token: Some("pk.example".to_string()),
//!     ..TileSourceConfig::default()
//! };
//! let provider = TerrainRgbProvider::new(HttpTileSource::new(&config)?, &config)?;
//!
//! let point = GeoPoint::new(11.77, 47.26);
//! provider.prepare(&Bounds::around(point, 0.001), 14.0);
//!
//! if let Some(elevation) = provider.get_elevation(point) {
//!     println!("Elevation: {elevation:.0} m");
//! }
//! if let Some(sample) = calculate_terrain_metrics(point, |p| provider.get_elevation(p)) {
//!     println!("Slope {:.1}°, facing {}", sample.slope_deg, sample.aspect);
//! }
//! # Ok::<(), avaraster_dem::DemError>(())
//! ```

mod error;
mod provider;
mod source;
mod synthetic;
mod terrain;
mod tile;
mod tiles;

pub use avaraster_common::Aspect;
pub use error::DemError;
pub use provider::{ElevationQuery, PrepareSummary, TerrainRgbProvider, TileEntry};
pub use source::{HttpTileSource, TileSource, TileSourceConfig, MAPBOX_TERRAIN_RGB_URL};
pub use synthetic::SyntheticTerrain;
pub use terrain::{calculate_terrain_metrics, TerrainSample};
pub use tile::{decode_terrain_rgb, encode_terrain_rgb, ElevationGrid};
pub use tiles::{tile_position, TileKey, MAX_LATITUDE, MAX_ZOOM};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
