//! Table of contents parsing.
//!
//! The decrypted TOC is a pre-order serialization of the container's tree:
//! one root entry, with every directory followed by its child count and then
//! its children. [`TocWalker`] flattens that tree with an explicit stack so
//! that a hostile nesting depth cannot overflow the call stack.

use std::path::{Path, PathBuf};

use kxr_common::ByteCursor;

use crate::{Error, Result};

/// Default limit on directory nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// TOC entry type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EntryKind {
    /// Payload is protected with the stream cipher.
    Encrypted = 0,
    /// Directory with nested entries.
    Directory = 1,
    /// Payload is a zlib stream.
    Compressed = 4,
}

impl TryFrom<u32> for EntryKind {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Encrypted),
            1 => Ok(Self::Directory),
            4 => Ok(Self::Compressed),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Encrypted => "crypt",
            Self::Directory => "dir",
            Self::Compressed => "zlib",
        })
    }
}

/// Common prefix of every TOC entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub flag: u8,
    pub reserved: u32,
    pub kind: EntryKind,
}

impl EntryHeader {
    /// Read an entry prefix.
    ///
    /// On failure the cursor is rewound to where the entry started.
    pub fn read(toc: &mut ByteCursor) -> Result<Self> {
        let start = toc.position();
        let result = Self::read_fields(toc);
        if result.is_err() {
            toc.seek(start);
        }
        result
    }

    fn read_fields(toc: &mut ByteCursor) -> Result<Self> {
        let name = toc.read_text()?;
        let flag = toc.read_u8()?;
        let reserved = toc.read_u32()?;
        let kind = toc.read_u32()?;

        let kind = EntryKind::try_from(kind).map_err(|kind| Error::UnknownEntryType {
            name: name.clone(),
            kind,
        })?;

        Ok(Self {
            name,
            flag,
            reserved,
            kind,
        })
    }
}

/// A file entry located by the TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name as stored in the TOC.
    pub name: String,
    /// Path of the enclosing directory, relative to the container root.
    pub directory: PathBuf,
    /// How the payload is stored; never [`EntryKind::Directory`].
    pub kind: EntryKind,
    /// Absolute payload offset in the container.
    pub offset: u32,
    /// Payload length in bytes.
    pub length: u32,
}

impl FileEntry {
    /// The entry id, when the name is a bare decimal number without an
    /// extension.
    pub fn entry_id(&self) -> Option<u32> {
        if Path::new(&self.name).extension().is_some() {
            return None;
        }
        if self.name.is_empty() || !self.name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.name.parse().ok()
    }

    /// Path of the entry inside the container tree.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }
}

/// One item produced by walking the TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocItem {
    /// A directory was entered.
    Directory { path: PathBuf, children: u16 },
    /// A file entry.
    File(FileEntry),
}

#[derive(Debug)]
struct Frame {
    name: String,
    remaining: u32,
}

/// Pre-order iterator over a decrypted TOC.
///
/// Yields every directory and file in storage order. The first error ends
/// the walk: the TOC is a single stream, so nothing after a malformed or
/// truncated entry can be located.
#[derive(Debug)]
pub struct TocWalker {
    toc: ByteCursor,
    stack: Vec<Frame>,
    max_depth: usize,
    finished: bool,
}

impl TocWalker {
    /// Walk a decrypted TOC with the default depth limit.
    pub fn new(toc: ByteCursor) -> Self {
        Self::with_max_depth(toc, DEFAULT_MAX_DEPTH)
    }

    /// Walk a decrypted TOC, refusing directories nested deeper than `max_depth`.
    pub fn with_max_depth(toc: ByteCursor, max_depth: usize) -> Self {
        Self {
            toc,
            // Sentinel frame for the single root entry.
            stack: vec![Frame {
                name: String::new(),
                remaining: 1,
            }],
            max_depth,
            finished: false,
        }
    }

    /// Current directory depth (0 while reading the root entry).
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Path of the directory currently being walked.
    pub fn current_directory(&self) -> PathBuf {
        self.stack
            .iter()
            .skip(1)
            .filter(|frame| !frame.name.is_empty())
            .map(|frame| frame.name.as_str())
            .collect()
    }

    /// Position of the next read inside the TOC.
    pub fn position(&self) -> usize {
        self.toc.position()
    }

    fn next_item(&mut self) -> Result<Option<TocItem>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            if frame.remaining == 0 {
                self.stack.pop();
                continue;
            }
            frame.remaining -= 1;
            break;
        }

        let header = EntryHeader::read(&mut self.toc)?;

        match header.kind {
            EntryKind::Directory => {
                let children = self.toc.read_u16()?;
                if self.depth() >= self.max_depth {
                    return Err(Error::DepthExceeded {
                        max: self.max_depth,
                    });
                }

                self.stack.push(Frame {
                    name: header.name,
                    remaining: children as u32,
                });

                Ok(Some(TocItem::Directory {
                    path: self.current_directory(),
                    children,
                }))
            }
            kind => {
                let offset = self.toc.read_u32()?;
                let length = self.toc.read_u32()?;

                Ok(Some(TocItem::File(FileEntry {
                    name: header.name,
                    directory: self.current_directory(),
                    kind,
                    offset,
                    length,
                })))
            }
        }
    }
}

impl Iterator for TocWalker {
    type Item = Result<TocItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for TocWalker {}
