//! KXR container reader and extractor.
//!
//! A KXR container bundles a directory tree of asset files:
//!
//! - a 16-byte big-endian header (`kxrf` magic, TOC offset and length)
//! - payloads, each either XOR stream-ciphered or zlib-compressed
//! - a table of contents, stream-ciphered with its own offset as the key
//!
//! Files whose TOC name is a bare number are named through the `pkg.json`
//! manifest (see [`kxr_manifest`]).
//!
//! # Example
//!
//! ```no_run
//! use kxr_archive::{Extractor, KxrContainer, TocItem};
//! use kxr_manifest::ManifestResolver;
//!
//! // Inspect a container
//! let container = KxrContainer::open("ui-1a2b.kxr")?;
//! for item in container.walk() {
//!     if let TocItem::File(entry) = item? {
//!         println!("{} ({} bytes)", entry.path().display(), entry.length);
//!     }
//! }
//!
//! // Extract it, naming numeric entries through the manifest
//! let manifest = ManifestResolver::from_path("pkg.json")?;
//! let mut extractor = Extractor::to_directory("output", &manifest)?;
//! let summary = extractor.extract_container(&container);
//! println!("{} files extracted", summary.extracted.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod container;
mod error;
mod extract;
mod header;
mod sink;
mod toc;

pub use container::{base_name, KxrContainer, DEFAULT_MAX_ENTRY_SIZE};
pub use error::{Error, Result};
pub use extract::{EntryFailure, ExtractOptions, ExtractSummary, Extractor};
pub use header::ContainerHeader;
pub use sink::{sanitize_path, DirectorySink, OutputSink};
pub use toc::{EntryHeader, EntryKind, FileEntry, TocItem, TocWalker, DEFAULT_MAX_DEPTH};
