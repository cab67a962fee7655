//! `pkg.json` manifest support for KXR containers.
//!
//! Entries inside a container are often stored under bare numeric ids. The
//! manifest shipped alongside the containers lists every container by name
//! and describes a folder/file tree whose files name their container and
//! entry id. [`ManifestResolver`] turns that tree into lookup tables.
//!
//! # Example
//!
//! ```
//! use kxr_manifest::ManifestResolver;
//!
//! let json = br#"{
//!     "kxrlist": [ { "kxrname": "ui" } ],
//!     "entries": [ { "name": "icons", "list": [ { "name": "app.png", "kxr": 0, "eid": 0 } ] } ]
//! }"#;
//!
//! let resolver = ManifestResolver::from_slice(json)?;
//! assert_eq!(resolver.resolve("ui", 0), std::path::PathBuf::from("icons/app.png"));
//! assert_eq!(resolver.resolve("ui", 9), std::path::PathBuf::from("ui/9.bin"));
//! # Ok::<(), kxr_manifest::Error>(())
//! ```

mod error;
mod resolver;
pub mod schema;

pub use error::{Error, Result};
pub use resolver::{fallback_path, find_entry, ManifestEntry, ManifestResolver};
