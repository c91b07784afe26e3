//! Error types for the bulletin crate.

use thiserror::Error;

/// Errors that can occur when loading bulletin or region documents.
#[derive(Debug, Error)]
pub enum BulletinError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
