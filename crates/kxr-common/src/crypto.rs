//! KXR stream cipher.
//!
//! TOCs and "encrypted" entries are obscured with a keyed XOR over 4-byte
//! blocks. The key is seeded with the byte offset of the protected region in
//! the container and evolves through a one-bit feedback step before every
//! block after the first. Applying the cipher twice with the same seed
//! restores the input.

use byteorder::{ByteOrder, LittleEndian};

/// Block width of the cipher in bytes.
pub const BLOCK_SIZE: usize = 4;

/// Advance the running key by one block.
#[inline]
pub fn next_key(key: u32) -> u32 {
    (key << 1) | ((!((key >> 3) ^ key) >> 13) & 1)
}

/// Apply the stream cipher in place.
///
/// Full blocks are XORed as little-endian words. A trailing partial block is
/// XORed byte by byte with the matching byte of the current key.
///
/// # Arguments
///
/// * `data` - The buffer to transform (modified in place)
/// * `seed` - The initial key, normally the region's offset in the container
pub fn apply_in_place(data: &mut [u8], seed: u32) {
    let mut key = seed;

    for (index, block) in data.chunks_mut(BLOCK_SIZE).enumerate() {
        if index > 0 {
            key = next_key(key);
        }

        if block.len() == BLOCK_SIZE {
            let word = LittleEndian::read_u32(block) ^ key;
            LittleEndian::write_u32(block, word);
        } else {
            for (i, byte) in block.iter_mut().enumerate() {
                *byte ^= (key >> (8 * (i % BLOCK_SIZE))) as u8;
            }
        }
    }
}

/// Apply the stream cipher to a copy of the data.
pub fn apply(data: &[u8], seed: u32) -> Vec<u8> {
    let mut buffer = data.to_vec();
    apply_in_place(&mut buffer, seed);
    buffer
}
