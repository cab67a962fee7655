//! Owned byte cursor for big-endian parsing of KXR structures.
//!
//! This module provides [`ByteCursor`], which owns its bytes so that it can
//! also transform them in place (stream cipher, zlib) before or after
//! reading.

use byteorder::{BigEndian, ByteOrder};
use zerocopy::FromBytes;

use crate::{crypto, zlib, Error, Result};

/// An owned byte buffer with a read position.
///
/// All integer reads are big-endian. A read that would cross the end of the
/// buffer fails with [`Error::UnexpectedEof`] and leaves the position where
/// it was, so callers can decide how much of their work to abandon.
///
/// # Example
///
/// ```
/// use kxr_common::ByteCursor;
///
/// let mut cursor = ByteCursor::new(vec![0x00, 0x03, b'k', b'x', b'r', 0x01]);
///
/// assert_eq!(cursor.read_text().unwrap(), "kxr");
/// assert_eq!(cursor.read_u8().unwrap(), 1);
/// assert!(cursor.read_u8().is_err());
/// assert!(cursor.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    data: Vec<u8>,
    position: usize,
}

impl ByteCursor {
    /// Create a cursor over an owned buffer.
    #[inline]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Copy `length` bytes starting at `offset` out of `data` into a new cursor.
    ///
    /// Fails with [`Error::RangeOutOfBounds`] when the range does not lie
    /// entirely inside `data`.
    pub fn from_range(data: &[u8], offset: usize, length: usize) -> Result<Self> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or(Error::RangeOutOfBounds {
                offset,
                length,
                available: data.len(),
            })?;

        Ok(Self::new(data[offset..end].to_vec()))
    }

    /// Get the current position in the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position, clamped to the buffer length.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// The whole buffer, independent of the read position.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the cursor and return its buffer.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.data[start..start + count])
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(BigEndian::read_u16)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(BigEndian::read_u32)
    }

    /// Read a u16-length-prefixed string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; names inside
    /// containers are treated as opaque labels. If the declared length runs
    /// past the end, the position is restored to before the prefix.
    pub fn read_text(&mut self) -> Result<String> {
        let start = self.position;
        let length = self.read_u16()? as usize;

        if self.remaining() < length {
            let available = self.remaining();
            self.position = start;
            return Err(Error::UnexpectedEof {
                needed: length,
                available,
            });
        }

        let bytes = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate; use the
    /// big-endian field types for multi-byte members.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Apply the stream cipher to the whole buffer.
    ///
    /// The cipher is its own inverse, so this both encrypts and decrypts.
    pub fn stream_cipher(&mut self, seed: u32) {
        crypto::apply_in_place(&mut self.data, seed);
    }

    /// Replace the buffer with its zlib-compressed form and rewind.
    pub fn compress(&mut self) -> Result<()> {
        self.data = zlib::compress(&self.data)?;
        self.position = 0;
        Ok(())
    }

    /// Replace the buffer with its decompressed form and rewind.
    ///
    /// On failure the buffer is left exactly as it was.
    pub fn decompress(&mut self) -> Result<()> {
        self.decompress_with_limit(usize::MAX)
    }

    /// Like [`decompress`](Self::decompress), refusing output larger than
    /// `limit` bytes.
    pub fn decompress_with_limit(&mut self, limit: usize) -> Result<()> {
        self.data = zlib::decompress_with_limit(&self.data, limit)?;
        self.position = 0;
        Ok(())
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives_big_endian() {
        let data = vec![
            0x7F, // u8
            0x01, 0x02, // u16: 0x0102
            0x01, 0x02, 0x03, 0x04, // u32: 0x01020304
        ];
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_u8().unwrap(), 0x7F);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_u32().unwrap(), 0x01020304);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_eof_leaves_position() {
        let mut cursor = ByteCursor::new(vec![0x01, 0x02, 0x03]);
        cursor.read_u8().unwrap();

        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                needed: 4,
                available: 2
            }
        ));
        assert!(err.is_end_of_stream());
        assert_eq!(cursor.position(), 1);

        // Smaller reads still succeed after a failed one.
        assert_eq!(cursor.read_u16().unwrap(), 0x0203);
    }

    #[test]
    fn test_read_text() {
        let mut cursor = ByteCursor::new(b"\x00\x05hello\x00\x00".to_vec());
        assert_eq!(cursor.read_text().unwrap(), "hello");
        assert_eq!(cursor.read_text().unwrap(), "");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_text_overlong_restores_position() {
        let mut cursor = ByteCursor::new(b"\x00\x10short".to_vec());
        assert!(cursor.read_text().is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_text_lossy() {
        let mut cursor = ByteCursor::new(vec![0x00, 0x02, 0xFF, b'a']);
        assert_eq!(cursor.read_text().unwrap(), "\u{FFFD}a");
    }

    #[test]
    fn test_from_range() {
        let data = [0u8, 1, 2, 3, 4, 5];
        let cursor = ByteCursor::from_range(&data, 2, 3).unwrap();
        assert_eq!(cursor.as_bytes(), &[2, 3, 4]);

        assert!(ByteCursor::from_range(&data, 6, 0).unwrap().is_empty());
        let err = ByteCursor::from_range(&data, 4, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::RangeOutOfBounds {
                offset: 4,
                length: 3,
                available: 6
            }
        ));
        assert!(err.is_end_of_stream());
        assert!(matches!(
            ByteCursor::from_range(&data, usize::MAX, 2),
            Err(Error::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_cipher_roundtrip_through_cursor() {
        let original = b"some table of contents bytes".to_vec();
        let mut cursor = ByteCursor::new(original.clone());

        cursor.stream_cipher(0x40);
        assert_ne!(cursor.as_bytes(), &original[..]);
        cursor.stream_cipher(0x40);
        assert_eq!(cursor.into_inner(), original);
    }

    #[test]
    fn test_compress_roundtrip_through_cursor() {
        let original: Vec<u8> = b"abcabcabc".repeat(100);
        let mut cursor = ByteCursor::new(original.clone());

        cursor.compress().unwrap();
        assert!(cursor.len() < original.len());
        cursor.decompress().unwrap();
        assert_eq!(cursor.as_bytes(), &original[..]);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_failed_decompress_keeps_buffer() {
        let mut cursor = ByteCursor::new(b"not compressed".to_vec());
        assert!(cursor.decompress().is_err());
        assert_eq!(cursor.as_bytes(), b"not compressed");
    }

    #[test]
    fn test_read_struct() {
        use crate::{BigEndian, U32};
        use zerocopy::{Immutable, KnownLayout};

        #[derive(FromBytes, Immutable, KnownLayout)]
        #[repr(C)]
        struct Pair {
            a: U32<BigEndian>,
            b: U32<BigEndian>,
        }

        let mut cursor = ByteCursor::new(vec![0, 0, 0, 1, 0, 0, 0, 2]);
        let pair: Pair = cursor.read_struct().unwrap();
        assert_eq!(pair.a.get(), 1);
        assert_eq!(pair.b.get(), 2);
    }
}
