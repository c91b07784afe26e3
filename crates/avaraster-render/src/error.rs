//! Error types for rendering and the CLI.

use thiserror::Error;

/// Errors that can occur while loading inputs or writing an overlay.
#[derive(Debug, Error)]
pub enum RenderError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Elevation provider setup error.
    #[error("Elevation error: {0}")]
    Dem(#[from] avaraster_dem::DemError),

    /// Bulletin or region document error.
    #[error("Bulletin error: {0}")]
    Bulletin(#[from] avaraster_bulletin::BulletinError),

    /// A background render did not report back in time.
    #[error("Render {generation} did not finish within {seconds}s")]
    Timeout { generation: u64, seconds: u64 },

    /// Malformed command-line value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
