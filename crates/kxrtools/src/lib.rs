//! KXR tools - asset container extraction library.
//!
//! This crate provides a unified interface to the KXR crates.
//!
//! # Crates
//!
//! - [`kxr_common`] - Byte cursor, stream cipher and zlib helpers
//! - [`kxr_archive`] - Container parsing, TOC walking and extraction
//! - [`kxr_manifest`] - `pkg.json` entry id to path resolution
//!
//! # Example
//!
//! ```no_run
//! use kxrtools::prelude::*;
//!
//! let manifest = ManifestResolver::from_path("pkg.json").unwrap_or_default();
//! let mut extractor = Extractor::to_directory("output", &manifest)?;
//!
//! let summary = extractor.extract_file("ui-1a2b.kxr")?;
//! println!("{} files, {} failures", summary.extracted.len(), summary.failures.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use kxr_archive as archive;
pub use kxr_common as common;
pub use kxr_manifest as manifest;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use kxr_archive::{
        ContainerHeader, DirectorySink, EntryKind, ExtractOptions, ExtractSummary, Extractor,
        FileEntry, KxrContainer, OutputSink, TocItem,
    };
    pub use kxr_common::{crypto, zlib, ByteCursor};
    pub use kxr_manifest::ManifestResolver;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
