//! Container extraction.
//!
//! [`Extractor`] drives one container at a time: open (header + TOC), walk,
//! decode each payload, name it and hand it to an [`OutputSink`]. Failures are
//! contained as narrowly as the format allows:
//!
//! - a bad header or unreadable file fails the whole file,
//! - a malformed or truncated TOC stops the walk but keeps what was written,
//! - a bad payload range, decode error or write error skips only that entry.

use std::path::{Path, PathBuf};

use kxr_manifest::ManifestResolver;

use crate::container::{KxrContainer, DEFAULT_MAX_ENTRY_SIZE};
use crate::sink::{DirectorySink, OutputSink};
use crate::toc::{FileEntry, TocItem, DEFAULT_MAX_DEPTH};
use crate::{Error, Result};

/// Extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Deepest directory nesting accepted from a TOC.
    pub max_depth: usize,
    /// Largest decoded size accepted for one compressed entry.
    pub max_entry_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

/// An entry that could not be extracted.
#[derive(Debug)]
pub struct EntryFailure {
    /// Path of the entry inside the container tree.
    pub entry: PathBuf,
    pub error: Error,
}

/// Outcome of extracting one container.
#[derive(Debug, Default)]
pub struct ExtractSummary {
    /// Output paths written, relative to the sink root.
    pub extracted: Vec<PathBuf>,
    /// Directories encountered in the TOC.
    pub directories: usize,
    /// Entries that were skipped.
    pub failures: Vec<EntryFailure>,
    /// Why the TOC walk stopped early, if it did.
    pub toc_error: Option<Error>,
}

impl ExtractSummary {
    /// Whether every entry in the TOC was extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.toc_error.is_none()
    }
}

/// Extracts containers into an output sink.
///
/// The manifest is borrowed, so a single resolver serves every container of
/// a run.
pub struct Extractor<'m, S> {
    manifest: &'m ManifestResolver,
    sink: S,
    options: ExtractOptions,
}

impl<'m> Extractor<'m, DirectorySink> {
    /// Extract into a directory on disk, creating it if needed.
    pub fn to_directory<P: Into<PathBuf>>(root: P, manifest: &'m ManifestResolver) -> Result<Self> {
        Ok(Self::new(DirectorySink::create(root)?, manifest))
    }
}

impl<'m, S: OutputSink> Extractor<'m, S> {
    /// Create an extractor writing into `sink`.
    pub fn new(sink: S, manifest: &'m ManifestResolver) -> Self {
        Self {
            manifest,
            sink,
            options: ExtractOptions::default(),
        }
    }

    /// Replace the extraction settings.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the output sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the extractor and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Get the manifest used for naming entries.
    #[inline]
    pub fn manifest(&self) -> &'m ManifestResolver {
        self.manifest
    }

    /// Open and extract a container file.
    ///
    /// Returns an error only when the file itself cannot be used (I/O error,
    /// bad header, TOC outside the file). Problems inside the TOC are
    /// reported in the summary.
    pub fn extract_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ExtractSummary> {
        let container = KxrContainer::open(path.as_ref())?;
        Ok(self.extract_container(&container))
    }

    /// Extract every file entry of an opened container.
    pub fn extract_container(&mut self, container: &KxrContainer) -> ExtractSummary {
        let mut summary = ExtractSummary::default();

        for item in container.walk_with_max_depth(self.options.max_depth) {
            match item {
                Ok(TocItem::Directory { path, children }) => {
                    tracing::trace!(path = %path.display(), children, "directory");
                    summary.directories += 1;
                }
                Ok(TocItem::File(entry)) => match self.extract_entry(container, &entry) {
                    Ok(output) => summary.extracted.push(output),
                    Err(error) => {
                        tracing::warn!(
                            container = container.name(),
                            entry = %entry.path().display(),
                            %error,
                            "skipping entry"
                        );
                        summary.failures.push(EntryFailure {
                            entry: entry.path(),
                            error,
                        });
                    }
                },
                Err(error) => {
                    tracing::warn!(
                        container = container.name(),
                        %error,
                        "table of contents ended early"
                    );
                    summary.toc_error = Some(error);
                }
            }
        }

        tracing::debug!(
            container = container.name(),
            extracted = summary.extracted.len(),
            failed = summary.failures.len(),
            "container done"
        );

        summary
    }

    /// Where an entry of `container` is written, relative to the sink root.
    ///
    /// Entries stored under a bare numeric id are named by the manifest;
    /// everything else keeps its place in the container tree.
    pub fn output_path(&self, container: &KxrContainer, entry: &FileEntry) -> PathBuf {
        match entry.entry_id() {
            Some(eid) => self.manifest.resolve(container.base_name(), eid),
            None => entry.path(),
        }
    }

    fn extract_entry(&mut self, container: &KxrContainer, entry: &FileEntry) -> Result<PathBuf> {
        let data = container.read_with_limit(entry, self.options.max_entry_size)?;
        let output = self.output_path(container, entry);

        self.sink.write(&output, &data)?;
        tracing::debug!(path = %output.display(), bytes = data.len(), "extracted");

        Ok(output)
    }
}
