//! zlib compression utilities for KXR payloads.
//!
//! Compressed entries hold a single zlib-wrapped DEFLATE stream. Decoding is
//! strict: a stream that stops before its end marker is an error rather than
//! a silently truncated result.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::{Error, Result};

/// Output growth step while inflating.
const CHUNK_SIZE: usize = 10 * 1024;

/// Compress data at maximum compression level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a complete zlib stream.
///
/// Output is accumulated incrementally until the stream-end marker is
/// reached. Corrupt input and input that runs out before the end marker both
/// fail with [`Error::Decompression`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with_limit(data, usize::MAX)
}

/// Decompress a complete zlib stream producing at most `limit` bytes.
///
/// Inflation stops with [`Error::SizeLimitExceeded`] as soon as the output
/// passes `limit`.
pub fn decompress_with_limit(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let initial = data.len().saturating_mul(2).max(CHUNK_SIZE);
    let mut output = Vec::with_capacity(initial.min(limit.saturating_add(1)));

    loop {
        if output.capacity() - output.len() < CHUNK_SIZE {
            output.reserve(CHUNK_SIZE);
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();

        let status = inflater
            .decompress_vec(&data[consumed..], &mut output, FlushDecompress::None)
            .map_err(|e| Error::Decompression(e.to_string()))?;

        if output.len() > limit {
            return Err(Error::SizeLimitExceeded { limit });
        }

        match status {
            Status::StreamEnd => return Ok(output),
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() as usize == consumed && inflater.total_out() == produced;
                if stalled {
                    return Err(Error::Decompression(format!(
                        "stream ended after {} of {} bytes without an end marker",
                        consumed,
                        data.len()
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let original = b"Hello, World! This is a test of zlib compression.";

        let compressed = compress(original).unwrap();
        let decompressed = decompress(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_roundtrip_empty() {
        let compressed = compress(&[]).unwrap();
        assert!(!compressed.is_empty());
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_larger_than_chunk() {
        let original: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = compress(&original).unwrap();
        assert!(compressed.len() < original.len());
        assert_eq!(decompress(&compressed).unwrap(), original);
    }

    #[test]
    fn test_compatible_with_reader_decoder() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let original = b"interoperable with any zlib implementation";
        let compressed = compress(original).unwrap();

        let mut output = Vec::new();
        ZlibDecoder::new(&compressed[..]).read_to_end(&mut output).unwrap();
        assert_eq!(output, original);
    }

    #[test]
    fn test_truncated_stream_fails() {
        let original: Vec<u8> = (0..4096u32).map(|i| (i * 7) as u8).collect();
        let compressed = compress(&original).unwrap();
        let truncated = &compressed[..compressed.len() / 2];

        let err = decompress(truncated).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_garbage_fails() {
        let err = decompress(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_limit_stops_expansion() {
        let original = vec![0u8; 200_000];
        let compressed = compress(&original).unwrap();
        assert!(compressed.len() < 1024);

        let err = decompress_with_limit(&compressed, 1000).unwrap_err();
        assert!(matches!(err, Error::SizeLimitExceeded { limit: 1000 }));
        assert!(!err.is_end_of_stream());

        assert_eq!(decompress_with_limit(&compressed, original.len()).unwrap(), original);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(decompress(&[]).is_err());
    }
}
