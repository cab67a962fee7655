//! Entry id to file path resolution.
//!
//! Key structures:
//! - FxHashMap from container base name to container index
//! - FxHashMap from container index to entries in declaration order
//!
//! Both tables are built once by [`ManifestResolver::load`] and only read
//! afterwards, so one resolver can be shared by reference across every
//! container extraction.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::schema::{Node, PackageDocument};
use crate::Result;

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// One file declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Index of the owning container in `kxrlist`.
    pub container: u32,
    /// Entry id inside that container.
    pub eid: u32,
    /// Logical path relative to the output root.
    pub path: PathBuf,
}

#[derive(Debug, Default)]
struct Tables {
    containers: FxHashMap<String, u32>,
    entries: FxHashMap<u32, Vec<ManifestEntry>>,
}

/// Maps `(container base name, entry id)` to logical file paths.
///
/// A resolver that has never loaded successfully still answers every query
/// with a synthesized `"{container}/{eid}.bin"` path.
#[derive(Debug, Default)]
pub struct ManifestResolver {
    tables: Option<Tables>,
}

impl ManifestResolver {
    /// Create a resolver with no manifest loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest and build a ready resolver.
    pub fn from_slice(manifest: &[u8]) -> Result<Self> {
        let mut resolver = Self::new();
        resolver.load(manifest)?;
        Ok(resolver)
    }

    /// Read and parse a manifest file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut resolver = Self::new();
        resolver.load_file(path)?;
        Ok(resolver)
    }

    /// Read a manifest file and load it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.tables = None;
        let data = fs::read(path.as_ref())?;
        self.load(&data)
    }

    /// Replace the lookup tables with the ones described by `manifest`.
    ///
    /// On failure the resolver is left not ready and every lookup falls back
    /// to the synthesized name.
    pub fn load(&mut self, manifest: &[u8]) -> Result<()> {
        self.tables = None;

        let document: PackageDocument = serde_json::from_slice(manifest)?;
        let tables = Tables::build(&document);

        tracing::debug!(
            containers = tables.containers.len(),
            entries = tables.entries.values().map(Vec::len).sum::<usize>(),
            "manifest loaded"
        );

        self.tables = Some(tables);
        Ok(())
    }

    /// Whether a manifest has been loaded successfully.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.tables.is_some()
    }

    /// Index of a container in `kxrlist`.
    pub fn container_index(&self, container: &str) -> Option<u32> {
        self.tables.as_ref()?.containers.get(container).copied()
    }

    /// All container names with their indices, in no particular order.
    pub fn container_names(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.tables
            .iter()
            .flat_map(|t| t.containers.iter().map(|(name, &index)| (name.as_str(), index)))
    }

    /// Number of entries declared for a container.
    pub fn entry_count(&self, container: &str) -> usize {
        self.container_entries(container).map_or(0, <[_]>::len)
    }

    /// Find the declared path of an entry, if the manifest knows it.
    pub fn lookup(&self, container: &str, eid: u32) -> Option<&Path> {
        let entries = self.container_entries(container)?;
        find_entry(entries, eid).map(|entry| entry.path.as_path())
    }

    /// Resolve an entry id to a path relative to the output root.
    ///
    /// Unknown containers and ids yield `"{container}/{eid}.bin"`.
    pub fn resolve(&self, container: &str, eid: u32) -> PathBuf {
        match self.lookup(container, eid) {
            Some(path) => path.to_path_buf(),
            None => fallback_path(container, eid),
        }
    }

    fn container_entries(&self, container: &str) -> Option<&[ManifestEntry]> {
        let tables = self.tables.as_ref()?;
        let index = tables.containers.get(container)?;
        tables.entries.get(index).map(Vec::as_slice)
    }
}

/// Find the entry carrying `eid` in one container's entry list.
///
/// Manifests normally declare ids densely and in order, so the entry at
/// position `eid` is checked first. When that position is missing or holds a
/// different id the whole list is scanned.
pub fn find_entry(entries: &[ManifestEntry], eid: u32) -> Option<&ManifestEntry> {
    if let Some(entry) = entries.get(eid as usize) {
        if entry.eid == eid {
            return Some(entry);
        }
    }

    entries.iter().find(|entry| entry.eid == eid)
}

/// Name used for entries the manifest cannot resolve.
pub fn fallback_path(container: &str, eid: u32) -> PathBuf {
    PathBuf::from(format!("{}/{}.bin", container, eid))
}

impl Tables {
    fn build(document: &PackageDocument) -> Self {
        let mut tables = Tables::default();

        for (index, container) in document.kxrlist.iter().enumerate() {
            // Later duplicates win, matching a plain map insert.
            tables.containers.insert(container.kxrname.clone(), index as u32);
        }

        let mut path = PathBuf::new();
        tables.collect(&document.entries, &mut path);
        tables
    }

    fn collect(&mut self, nodes: &[Node], path: &mut PathBuf) {
        for node in nodes {
            match node {
                Node::Folder { name, list } => {
                    path.push(name);
                    self.collect(list, path);
                    path.pop();
                }
                Node::File { name, kxr, eid } => {
                    self.entries.entry(*kxr).or_default().push(ManifestEntry {
                        container: *kxr,
                        eid: *eid,
                        path: path.join(name),
                    });
                }
            }
        }
    }
}
