//! Common utilities for KXR tools.
//!
//! This crate provides the low-level building blocks used by the other KXR crates:
//!
//! - [`ByteCursor`] - Owned byte buffer with big-endian field reads
//! - [`crypto`] - The keyed XOR stream cipher protecting TOCs and payloads
//! - [`zlib`] - zlib-wrapped DEFLATE compression and strict decompression
//!
//! None of these know anything about the container layout itself.

mod error;
mod reader;

pub mod crypto;
pub mod zlib;

pub use error::{Error, Result};
pub use reader::ByteCursor;

/// Re-export zerocopy traits and big-endian field types for convenience
pub use zerocopy::byteorder::{BigEndian, U16, U32};
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
