//! # Hasher Module
//!
//! 64-bit difference hashes for near-duplicate detection.
//!
//! ## How It Works
//! 1. Collapse the buffer to a 9x8 grayscale grid (bilinear convolution;
//!    the filter is fixed because hash stability depends on it)
//! 2. Compare each cell to its right-hand neighbour
//! 3. Bit = 1 where left > right; 8 rows x 8 comparisons = 64 bits,
//!    row-major top-to-bottom, first comparison in the most significant bit
//!
//! Identical visual content hashes identically regardless of original
//! resolution or encoding; re-encodes and small lighting shifts flip a
//! few bits. Hamming distance between two hashes measures how visually
//! close the frames are.

use crate::core::decode::{resize_luma, PixelBuffer};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One column wider than the hash so every row yields 8 comparisons
const GRID_WIDTH: u32 = 9;
const GRID_HEIGHT: u32 = 8;

/// A 64-bit difference hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DHash(u64);

impl DHash {
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Number of differing bit positions.
    ///
    /// Symmetric; zero iff the hashes are identical.
    pub fn distance(&self, other: &DHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for DHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute the difference hash of a decoded buffer.
///
/// Deterministic: identical pixel input yields identical bits on every
/// invocation.
pub fn compute_dhash(buffer: &PixelBuffer) -> Result<DHash, DecodeError> {
    let luma = buffer.luma_plane();
    let grid = resize_luma(
        &luma,
        buffer.width(),
        buffer.height(),
        GRID_WIDTH,
        GRID_HEIGHT,
    )?;

    let mut bits = 0u64;
    for y in 0..GRID_HEIGHT as usize {
        let row = &grid[y * GRID_WIDTH as usize..(y + 1) * GRID_WIDTH as usize];
        for x in 0..(GRID_WIDTH - 1) as usize {
            bits <<= 1;
            if row[x] > row[x + 1] {
                bits |= 1;
            }
        }
    }

    Ok(DHash(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 90x80 gray frame built from 10px-wide vertical bands; band values
    /// stay ordered through any downsampling filter.
    fn banded_buffer(values: [u8; 9]) -> PixelBuffer {
        let mut pixels = Vec::with_capacity(90 * 80 * 4);
        for _y in 0..80 {
            for x in 0..90 {
                let v = values[(x / 10) as usize];
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        PixelBuffer::from_rgba(90, 80, pixels).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let hash = DHash::from_bits(0xDEAD_BEEF_CAFE_F00D);
        assert_eq!(hash.distance(&hash), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = DHash::from_bits(0xFF00_FF00_FF00_FF00);
        let b = DHash::from_bits(0x00FF_00FF_00FF_00FF);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn distance_counts_differing_bits() {
        // Comparisons differ at exactly 3 of 64 positions
        let a = DHash::from_bits(0b0000);
        let b = DHash::from_bits(0b1011);
        assert_eq!(a.distance(&b), 3);
    }

    #[test]
    fn opposite_hashes_are_64_apart() {
        let a = DHash::from_bits(u64::MAX);
        let b = DHash::from_bits(0);
        assert_eq!(a.distance(&b), 64);
    }

    #[test]
    fn to_hex_is_zero_padded() {
        assert_eq!(DHash::from_bits(0xAB).to_hex(), "00000000000000ab");
    }

    #[test]
    fn hash_is_deterministic() {
        let buffer = banded_buffer([10, 40, 70, 100, 130, 160, 190, 220, 250]);
        let first = compute_dhash(&buffer).unwrap();
        let second = compute_dhash(&buffer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn decreasing_bands_set_every_bit() {
        // Strictly brighter on the left at every grid column
        let buffer = banded_buffer([250, 220, 190, 160, 130, 100, 70, 40, 10]);
        let hash = compute_dhash(&buffer).unwrap();
        assert_eq!(hash.bits(), u64::MAX);
    }

    #[test]
    fn increasing_bands_set_no_bits() {
        let buffer = banded_buffer([10, 40, 70, 100, 130, 160, 190, 220, 250]);
        let hash = compute_dhash(&buffer).unwrap();
        assert_eq!(hash.bits(), 0);
    }

    #[test]
    fn uniform_brightness_shift_keeps_the_hash() {
        let base = banded_buffer([250, 220, 190, 160, 130, 100, 70, 40, 10]);
        let brighter = banded_buffer([253, 223, 193, 163, 133, 103, 73, 43, 13]);

        let a = compute_dhash(&base).unwrap();
        let b = compute_dhash(&brighter).unwrap();
        assert_eq!(a.distance(&b), 0);
    }
}
