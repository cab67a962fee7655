//! KXR container reader.
//!
//! Opening a container reads the whole file, validates the header and
//! decrypts the TOC. Entries are then located with [`KxrContainer::walk`] and
//! their payloads decoded with [`KxrContainer::read`]; each payload is copied
//! out of the file buffer before it is transformed.

use std::fs;
use std::path::Path;

use kxr_common::ByteCursor;

use crate::header::ContainerHeader;
use crate::toc::{EntryKind, FileEntry, TocWalker, DEFAULT_MAX_DEPTH};
use crate::{Error, Result};

/// Default cap on the decoded size of a single entry (1 GiB).
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 1 << 30;

/// A container whose header has been validated and whose TOC is decrypted.
pub struct KxrContainer {
    /// Container file name
    name: String,
    /// File stem without its `-<suffix>`, used for manifest lookups
    base_name: String,
    /// Whole file contents
    data: Vec<u8>,
    header: ContainerHeader,
    /// Decrypted TOC bytes
    toc: ByteCursor,
}

impl KxrContainer {
    /// Read and open a container file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_bytes(name, data)
    }

    /// Open a container from bytes already in memory.
    ///
    /// `name` is the container's file name; its base name is derived from it.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let base_name = base_name(Path::new(&name));

        let mut cursor = ByteCursor::new(data);
        let header = ContainerHeader::read(&mut cursor)?;
        let data = cursor.into_inner();

        // The TOC is keyed by its own offset in the file.
        let mut toc = ByteCursor::from_range(
            &data,
            header.toc_offset() as usize,
            header.toc_length() as usize,
        )?;
        toc.stream_cipher(header.toc_offset());

        tracing::debug!(
            container = %name,
            toc_offset = header.toc_offset(),
            toc_length = header.toc_length(),
            "opened container"
        );

        Ok(Self {
            name,
            base_name,
            data,
            header,
            toc,
        })
    }

    /// Get the container file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the base name used for manifest lookups.
    #[inline]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Get the parsed header.
    #[inline]
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Total size of the container file in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the container file is empty (never true for an opened container).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The decrypted TOC bytes.
    #[inline]
    pub fn toc(&self) -> &[u8] {
        self.toc.as_bytes()
    }

    /// Walk the TOC with the default depth limit.
    pub fn walk(&self) -> TocWalker {
        self.walk_with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Walk the TOC, refusing directories nested deeper than `max_depth`.
    pub fn walk_with_max_depth(&self, max_depth: usize) -> TocWalker {
        TocWalker::with_max_depth(self.toc.clone(), max_depth)
    }

    /// Read entry contents - copies the payload range and decodes it.
    ///
    /// Encrypted payloads are deciphered with their own offset as the key;
    /// compressed payloads must decode to a complete zlib stream of at most
    /// [`DEFAULT_MAX_ENTRY_SIZE`] bytes.
    pub fn read(&self, entry: &FileEntry) -> Result<Vec<u8>> {
        self.read_with_limit(entry, DEFAULT_MAX_ENTRY_SIZE)
    }

    /// Read entry contents, refusing compressed payloads that decode to more
    /// than `max_size` bytes.
    pub fn read_with_limit(&self, entry: &FileEntry, max_size: usize) -> Result<Vec<u8>> {
        let mut payload =
            ByteCursor::from_range(&self.data, entry.offset as usize, entry.length as usize)?;

        match entry.kind {
            EntryKind::Encrypted => payload.stream_cipher(entry.offset),
            EntryKind::Compressed => payload.decompress_with_limit(max_size)?,
            EntryKind::Directory => {
                return Err(Error::NotAFile {
                    name: entry.name.clone(),
                });
            }
        }

        Ok(payload.into_inner())
    }
}

impl std::fmt::Debug for KxrContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KxrContainer")
            .field("name", &self.name)
            .field("base_name", &self.base_name)
            .field("size", &self.data.len())
            .field("toc_length", &self.toc.len())
            .finish()
    }
}

/// Derive the manifest key of a container from its path.
///
/// The file stem is used with everything from its last `-` removed, so
/// `ui-2f9c.kxr` becomes `ui`.
pub fn base_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    match stem.rfind('-') {
        Some(pos) => stem[..pos].to_string(),
        None => stem.into_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::toc::tests::TocWriter;
    use crate::toc::TocItem;

    /// Assemble a container file: header, payloads, then the encrypted TOC.
    pub(crate) struct ContainerBuilder {
        payloads: Vec<u8>,
        pub(crate) toc: TocWriter,
    }

    impl ContainerBuilder {
        pub(crate) fn new() -> Self {
            Self {
                payloads: Vec::new(),
                toc: TocWriter::default(),
            }
        }

        fn next_offset(&self) -> u32 {
            (ContainerHeader::SIZE + self.payloads.len()) as u32
        }

        /// Store an encrypted payload and return its (offset, length).
        pub(crate) fn encrypted(&mut self, data: &[u8]) -> (u32, u32) {
            let offset = self.next_offset();
            let mut payload = ByteCursor::new(data.to_vec());
            payload.stream_cipher(offset);
            self.payloads.extend_from_slice(payload.as_bytes());
            (offset, data.len() as u32)
        }

        /// Store a compressed payload and return its (offset, length).
        pub(crate) fn compressed(&mut self, data: &[u8]) -> (u32, u32) {
            let offset = self.next_offset();
            let compressed = kxr_common::zlib::compress(data).unwrap();
            self.payloads.extend_from_slice(&compressed);
            (offset, compressed.len() as u32)
        }

        /// Store bytes verbatim and return their (offset, length).
        pub(crate) fn raw(&mut self, data: &[u8]) -> (u32, u32) {
            let offset = self.next_offset();
            self.payloads.extend_from_slice(data);
            (offset, data.len() as u32)
        }

        pub(crate) fn build(&self) -> Vec<u8> {
            let toc_offset = self.next_offset();
            let mut toc = ByteCursor::new(self.toc.data.clone());
            toc.stream_cipher(toc_offset);

            let mut data = ContainerHeader::MAGIC.to_vec();
            data.extend_from_slice(&0u32.to_be_bytes());
            data.extend_from_slice(&toc_offset.to_be_bytes());
            data.extend_from_slice(&(toc.len() as u32).to_be_bytes());
            data.extend_from_slice(&self.payloads);
            data.extend_from_slice(toc.as_bytes());
            data
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("ui-2f9c.kxr")), "ui");
        assert_eq!(base_name(Path::new("/data/ui-sounds-v2.kxr")), "ui-sounds");
        assert_eq!(base_name(Path::new("cobralaunch.kxr")), "cobralaunch");
        assert_eq!(base_name(Path::new("-1.kxr")), "");
    }

    #[test]
    fn test_open_and_read_entries() {
        let mut builder = ContainerBuilder::new();
        let (enc_offset, enc_len) = builder.encrypted(b"plain config text");
        let (cmp_offset, cmp_len) = builder.compressed(&b"pixels".repeat(50));
        builder
            .toc
            .directory("data", 2)
            .file("config.ini", EntryKind::Encrypted, enc_offset, enc_len)
            .file("3", EntryKind::Compressed, cmp_offset, cmp_len);

        let container = KxrContainer::from_bytes("data-01.kxr", builder.build()).unwrap();
        assert_eq!(container.name(), "data-01.kxr");
        assert_eq!(container.base_name(), "data");
        assert_eq!(container.toc(), &builder.toc.data[..]);

        let files: Vec<FileEntry> = container
            .walk()
            .filter_map(|item| match item.unwrap() {
                TocItem::File(file) => Some(file),
                TocItem::Directory { .. } => None,
            })
            .collect();

        assert_eq!(files.len(), 2);
        assert_eq!(container.read(&files[0]).unwrap(), b"plain config text");
        assert_eq!(container.read(&files[1]).unwrap(), b"pixels".repeat(50));
        assert_eq!(files[1].entry_id(), Some(3));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut data = ContainerBuilder::new().build();
        data[0] = b'K';
        let err = KxrContainer::from_bytes("bad.kxr", data).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_toc_out_of_range() {
        let mut data = ContainerBuilder::new().build();
        // Claim a TOC far past the end of the file.
        data[12..16].copy_from_slice(&0x0100_0000u32.to_be_bytes());
        let err = KxrContainer::from_bytes("short.kxr", data).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_payload_out_of_range() {
        let mut builder = ContainerBuilder::new();
        builder.toc.file("big.bin", EntryKind::Encrypted, 10, 0xFFFF_FFFF);
        let container = KxrContainer::from_bytes("c.kxr", builder.build()).unwrap();

        let entry = match container.walk().next().unwrap().unwrap() {
            TocItem::File(file) => file,
            other => panic!("unexpected {:?}", other),
        };
        assert!(container.read(&entry).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_corrupt_compressed_payload() {
        let mut builder = ContainerBuilder::new();
        let (offset, length) = builder.raw(b"this is not a zlib stream");
        builder.toc.file("broken.dat", EntryKind::Compressed, offset, length);
        let container = KxrContainer::from_bytes("c.kxr", builder.build()).unwrap();

        let entry = match container.walk().next().unwrap().unwrap() {
            TocItem::File(file) => file,
            other => panic!("unexpected {:?}", other),
        };
        let err = container.read(&entry).unwrap_err();
        assert!(matches!(
            err,
            Error::Common(kxr_common::Error::Decompression(_))
        ));
    }

    #[test]
    fn test_read_directory_kind_is_rejected() {
        let container = KxrContainer::from_bytes("c.kxr", ContainerBuilder::new().build()).unwrap();
        let entry = FileEntry {
            name: "textures".into(),
            directory: Default::default(),
            kind: EntryKind::Directory,
            offset: 0,
            length: 0,
        };

        let err = container.read(&entry).unwrap_err();
        assert!(matches!(err, Error::NotAFile { ref name } if name == "textures"));
        assert!(!err.is_end_of_stream());
    }

    #[test]
    fn test_read_with_limit() {
        let mut builder = ContainerBuilder::new();
        let (offset, length) = builder.compressed(&[7u8; 64 * 1024]);
        builder.toc.file("big.bin", EntryKind::Compressed, offset, length);
        let container = KxrContainer::from_bytes("c.kxr", builder.build()).unwrap();

        let entry = match container.walk().next().unwrap().unwrap() {
            TocItem::File(file) => file,
            other => panic!("unexpected {:?}", other),
        };
        let err = container.read_with_limit(&entry, 4096).unwrap_err();
        assert!(matches!(
            err,
            Error::Common(kxr_common::Error::SizeLimitExceeded { limit: 4096 })
        ));
        assert_eq!(container.read(&entry).unwrap().len(), 64 * 1024);
    }

    #[test]
    fn test_open_from_disk() {
        let mut builder = ContainerBuilder::new();
        let (offset, length) = builder.encrypted(b"x");
        builder.toc.file("x.txt", EntryKind::Encrypted, offset, length);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack-7.kxr");
        fs::write(&path, builder.build()).unwrap();

        let container = KxrContainer::open(&path).unwrap();
        assert_eq!(container.name(), "pack-7.kxr");
        assert_eq!(container.base_name(), "pack");
        assert!(KxrContainer::open(dir.path().join("missing.kxr")).is_err());
    }
}
