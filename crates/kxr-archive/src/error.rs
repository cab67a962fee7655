//! Error types for the KXR archive crate.

use thiserror::Error;

/// Errors that can occur when working with KXR containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (end of stream, bad range, decompression).
    #[error("{0}")]
    Common(#[from] kxr_common::Error),

    /// The file does not start with the container identifier.
    #[error("invalid container magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    /// A TOC entry carries a type tag this reader does not know.
    #[error("unknown TOC entry type {kind} for {name:?}")]
    UnknownEntryType { name: String, kind: u32 },

    /// The TOC nests directories deeper than allowed.
    #[error("TOC nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// A payload was requested for an entry that has none.
    #[error("{name:?} is a directory and has no payload")]
    NotAFile { name: String },
}

impl Error {
    /// Whether this error means the TOC or a payload ran past its buffer.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_end_of_stream())
    }

    /// Whether this error means the container is structurally invalid.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMagic { .. } | Error::UnknownEntryType { .. } | Error::DepthExceeded { .. }
        )
    }
}

/// Result type for KXR archive operations.
pub type Result<T> = std::result::Result<T, Error>;
