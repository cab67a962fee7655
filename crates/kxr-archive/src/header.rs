//! Container header.

use kxr_common::{BigEndian, ByteCursor, FromBytes, Immutable, IntoBytes, KnownLayout, U32};

use crate::{Error, Result};

/// Fixed 16-byte header at the start of every container.
///
/// All multi-byte fields are big-endian.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ContainerHeader {
    /// Container identifier, `kxrf`
    pub magic: [u8; 4],
    /// Unused by extraction
    pub reserved: U32<BigEndian>,
    /// Absolute offset of the encrypted TOC
    pub toc_offset: U32<BigEndian>,
    /// Length of the encrypted TOC in bytes
    pub toc_length: U32<BigEndian>,
}

impl ContainerHeader {
    /// Container identifier bytes.
    pub const MAGIC: [u8; 4] = *b"kxrf";

    /// Header size in bytes.
    pub const SIZE: usize = 16;

    /// Read and validate the header at the cursor position.
    ///
    /// The magic is checked before anything else is read; any other value
    /// rejects the buffer regardless of what follows.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let magic = cursor.read_bytes(4)?;
        if magic != Self::MAGIC {
            let mut actual = [0u8; 4];
            actual.copy_from_slice(magic);
            return Err(Error::InvalidMagic {
                expected: Self::MAGIC,
                actual,
            });
        }

        cursor.seek(cursor.position() - 4);
        Ok(cursor.read_struct()?)
    }

    /// Absolute offset of the TOC.
    #[inline]
    pub fn toc_offset(&self) -> u32 {
        self.toc_offset.get()
    }

    /// Length of the TOC in bytes.
    #[inline]
    pub fn toc_length(&self) -> u32 {
        self.toc_length.get()
    }
}
