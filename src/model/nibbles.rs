//! Nibble-addressable view over a byte slice.
//!
//! ```text
//! bytes:    [ 0xDE        | 0xAD        ]
//! nibbles:  [ 0xD | 0xE   | 0xA | 0xD   ]
//! offset:     0     1       2     3
//! ```
//!
//! The high nibble of byte `i` lives at offset `2i`, the low nibble at
//! `2i + 1`. All offset arithmetic against the raw bytes stays inside this
//! module; everything downstream addresses data through `NibbleBuffer`.

use std::fmt;

use crate::{Error, Result};

/// Split a byte into its (high, low) nibbles.
#[inline(always)]
pub(crate) fn split(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0F)
}

/// Number of differing nibbles between two bytes (0, 1 or 2).
#[inline(always)]
pub(crate) fn nibble_diff(a: u8, b: u8) -> u32 {
    let x = a ^ b;
    ((x & 0xF0) != 0) as u32 + ((x & 0x0F) != 0) as u32
}

// ============================================================================
// NibbleBuffer
// ============================================================================

/// Immutable nibble view over borrowed bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NibbleBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> NibbleBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Length in nibbles (twice the byte length).
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() * 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// The underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Nibble at logical offset `index`.
    pub fn get(&self, index: usize) -> Result<u8> {
        let byte = self.bytes.get(index / 2).ok_or(Error::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        let (hi, lo) = split(*byte);
        Ok(if index % 2 == 0 { hi } else { lo })
    }

    pub fn iter(&self) -> NibbleIter<'a> {
        NibbleIter { bytes: self.bytes, pos: 0 }
    }

    pub fn contains(&self, nibble: u8) -> bool {
        self.iter().any(|n| n == nibble)
    }

    /// Fail with `LengthMismatch` unless both buffers have the same nibble length.
    pub fn ensure_same_len(&self, other: &NibbleBuffer<'_>) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(())
    }

    /// Number of nibble positions at which the two buffers differ.
    pub fn hamming(&self, other: &NibbleBuffer<'_>) -> Result<usize> {
        self.ensure_same_len(other)?;
        let dist: u32 = self
            .bytes
            .iter()
            .zip(other.bytes)
            .map(|(&a, &b)| nibble_diff(a, b))
            .sum();
        Ok(dist as usize)
    }

    /// Normalized Hamming distance in `[0.0, 1.0]`: fraction of differing nibbles.
    ///
    /// Two empty buffers are at distance 0.
    pub fn distance(&self, other: &NibbleBuffer<'_>) -> Result<f64> {
        let dist = self.hamming(other)?;
        if self.is_empty() {
            return Ok(0.0);
        }
        Ok(dist as f64 / self.len() as f64)
    }
}

impl<'a> From<&'a [u8]> for NibbleBuffer<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for NibbleBuffer<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for NibbleBuffer<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for NibbleBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NibbleBuffer(len={}, ", self.len())?;
        for b in self.bytes.iter().take(8) {
            write!(f, "{b:02x}")?;
        }
        if self.bytes.len() > 8 {
            write!(f, "..")?;
        }
        write!(f, ")")
    }
}

impl<'a> IntoIterator for NibbleBuffer<'a> {
    type Item = u8;
    type IntoIter = NibbleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// Iterator over the nibbles of a buffer, high nibble first.
#[derive(Debug, Clone)]
pub struct NibbleIter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for NibbleIter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos / 2)?;
        let (hi, lo) = split(byte);
        let nibble = if self.pos % 2 == 0 { hi } else { lo };
        self.pos += 1;
        Some(nibble)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bytes.len() * 2 - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for NibbleIter<'_> {}
