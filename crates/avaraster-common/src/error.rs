//! Error types for the common crate.

use thiserror::Error;

/// Errors that can occur when parsing shared types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    /// Color string is not `#RRGGBB` or `#AARRGGBB`.
    #[error("Invalid color '{0}' (expected #RRGGBB or #AARRGGBB)")]
    InvalidColor(String),
}
