//! Error types for kxr-common.

use thiserror::Error;

/// Common error type for KXR operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of stream: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A byte range does not fit inside the buffer it was carved from.
    #[error("range {offset}+{length} exceeds buffer of {available} bytes")]
    RangeOutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// Compressed data could not be fully decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Decoded output grew past the allowed size.
    #[error("decompressed size exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { limit: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the data simply ran out.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::UnexpectedEof { .. } | Error::RangeOutOfBounds { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
