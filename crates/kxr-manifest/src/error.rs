//! Error types for manifest loading.

use thiserror::Error;

/// Errors that can occur while loading a `pkg.json` manifest.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON or is missing required keys.
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;
