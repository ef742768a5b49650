//! Byte-value statistics.

use serde::{Deserialize, Serialize};

/// Relative frequency of one byte value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ByteFrequency {
    pub value: u8,
    pub frequency: f64,
}

/// Relative frequency of each of the 256 byte values in `data`.
///
/// Frequencies sum to 1.0 for non-empty data; empty data yields all zeros.
pub fn byte_frequencies(data: &[u8]) -> [f64; 256] {
    let mut counts = [0usize; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let mut freqs = [0.0f64; 256];
    if data.is_empty() {
        return freqs;
    }
    let total = data.len() as f64;
    for (f, &c) in freqs.iter_mut().zip(&counts) {
        *f = c as f64 / total;
    }
    freqs
}

/// `byte_frequencies` as a list of `(value, frequency)` rows.
pub fn byte_frequency_table(data: &[u8]) -> Vec<ByteFrequency> {
    byte_frequencies(data)
        .iter()
        .enumerate()
        .map(|(value, &frequency)| ByteFrequency { value: value as u8, frequency })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequencies_sum_to_one() {
        let f = byte_frequencies(b"aab\x00");
        assert_eq!(f[b'a' as usize], 0.5);
        assert_eq!(f[b'b' as usize], 0.25);
        assert_eq!(f[0], 0.25);
        assert!((f.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_data() {
        assert!(byte_frequencies(b"").iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_table_has_every_value() {
        let table = byte_frequency_table(b"\xff");
        assert_eq!(table.len(), 256);
        assert_eq!(table[255], ByteFrequency { value: 255, frequency: 1.0 });
    }
}
