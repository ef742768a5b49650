//! HDBSCAN strategy (feature `hdbscan`).
//!
//! Nibble vectors are categorical, so each sample is one-hot encoded: 16
//! dimensions per nibble, one of them set. The squared Euclidean distance
//! between two encodings is twice their nibble Hamming distance; scaling
//! every set coordinate by `1 / sqrt(2 * len)` makes the Euclidean
//! distance `sqrt(normalized Hamming)`, a monotone transform that leaves
//! density ordering unchanged.

use ::hdbscan::{Hdbscan, HdbscanHyperParams};
use hashbrown::HashMap;

use crate::model::NibbleBuffer;
use crate::Result;

use super::ClusterStrategy;

/// Hierarchical density clustering via the `hdbscan` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdbscanClusterer {
    pub min_cluster_size: usize,
    pub min_samples: usize,
}

impl HdbscanClusterer {
    pub fn new(min_cluster_size: usize, min_samples: usize) -> Self {
        Self { min_cluster_size, min_samples }
    }

    /// Run the `hdbscan` crate over distinct buffers. Errors fall back to
    /// all-unclustered.
    fn run(&self, distinct: &[NibbleBuffer<'_>]) -> Vec<Option<usize>> {
        let features = one_hot(distinct);
        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(self.min_cluster_size)
            .min_samples(self.min_samples)
            .build();

        let clusterer = Hdbscan::new(&features, hyper_params);
        match clusterer.cluster() {
            Ok(labels) => labels.into_iter().map(|l| usize::try_from(l).ok()).collect(),
            Err(e) => {
                tracing::warn!(error = ?e, samples = distinct.len(), "hdbscan failed, treating samples as unclustered");
                vec![None; distinct.len()]
            }
        }
    }
}

impl Default for HdbscanClusterer {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

/// One-hot encode samples as scaled `f32` feature vectors.
fn one_hot(samples: &[NibbleBuffer<'_>]) -> Vec<Vec<f32>> {
    samples
        .iter()
        .map(|s| {
            let scale = 1.0 / ((2 * s.len()) as f32).sqrt();
            let mut features = vec![0.0f32; s.len() * 16];
            for (pos, nibble) in s.iter().enumerate() {
                features[pos * 16 + nibble as usize] = scale;
            }
            features
        })
        .collect()
}

impl ClusterStrategy for HdbscanClusterer {
    fn name(&self) -> &'static str {
        "hdbscan"
    }

    /// Exact duplicates are grouped before density clustering: a run of at
    /// least `min_cluster_size` identical buffers is a cluster on its own.
    /// The remaining buffers go to HDBSCAN once per distinct value, and
    /// each label is copied back to every duplicate.
    fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
        let n = samples.len();
        let min = self.min_cluster_size.max(2);
        if n < min {
            return Ok(vec![None; n]);
        }

        // Sample indices per distinct buffer, in order of first occurrence.
        let mut index: HashMap<&[u8], usize> = HashMap::new();
        let mut copies: Vec<Vec<usize>> = Vec::new();
        for (i, s) in samples.iter().enumerate() {
            let slot = *index.entry(s.as_bytes()).or_insert_with(|| {
                copies.push(Vec::new());
                copies.len() - 1
            });
            copies[slot].push(i);
        }

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut next_label = 0usize;
        let mut rest: Vec<&[usize]> = Vec::new();
        for members in &copies {
            if members.len() >= self.min_cluster_size {
                for &i in members {
                    labels[i] = Some(next_label);
                }
                next_label += 1;
            } else {
                rest.push(members);
            }
        }

        if rest.len() >= min {
            let distinct: Vec<NibbleBuffer<'_>> = rest.iter().map(|m| samples[m[0]]).collect();
            for (members, label) in rest.iter().zip(self.run(&distinct)) {
                if let Some(l) = label {
                    for &i in members.iter() {
                        labels[i] = Some(next_label + l);
                    }
                }
            }
        }

        tracing::trace!(
            samples = n,
            distinct = copies.len(),
            duplicate_clusters = next_label,
            "hdbscan labels assigned"
        );
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_distance_tracks_hamming() {
        let a = NibbleBuffer::new(b"\x00\x00");
        let b = NibbleBuffer::new(b"\x01\x00");
        let f = one_hot(&[a, b]);
        assert_eq!(f[0].len(), 64);
        let sq: f32 = f[0].iter().zip(&f[1]).map(|(x, y)| (x - y) * (x - y)).sum();
        // normalized Hamming = 1/4
        assert!((sq - 0.25).abs() < 1e-6, "sq={sq}");
    }

    #[test]
    fn too_few_samples_are_noise() {
        let a = NibbleBuffer::new(b"\x00");
        assert_eq!(HdbscanClusterer::default().assign(&[a]).unwrap(), vec![None]);
    }

    fn bufs(data: &[[u8; 16]]) -> Vec<NibbleBuffer<'_>> {
        data.iter().map(|d| NibbleBuffer::new(d)).collect()
    }

    fn with_byte(base: u8, index: usize, value: u8) -> [u8; 16] {
        let mut out = [base; 16];
        out[index] = value;
        out
    }

    #[test]
    fn identical_samples_cluster_and_outlier_is_noise() {
        let data = [[0x11; 16], [0x11; 16], [0xA5; 16], [0x11; 16], [0x11; 16]];
        let labels = HdbscanClusterer::default().assign(&bufs(&data)).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), None, Some(0), Some(0)]);
    }

    #[test]
    fn identical_pairs_get_separate_clusters() {
        let data = [[0x00; 16], [0xFF; 16], [0x00; 16], [0xFF; 16], [0xA5; 16]];
        let labels = HdbscanClusterer::default().assign(&bufs(&data)).unwrap();
        assert_eq!(labels, vec![Some(0), Some(1), Some(0), Some(1), None]);
    }

    #[test]
    fn near_duplicate_groups_are_separated_from_outlier() {
        let data = [
            with_byte(0x00, 0, 0x01),
            with_byte(0xFF, 0, 0xFE),
            with_byte(0x00, 1, 0x01),
            with_byte(0xFF, 1, 0xFE),
            with_byte(0x00, 2, 0x01),
            with_byte(0xFF, 2, 0xFE),
            [0xA5; 16],
        ];
        let labels = HdbscanClusterer::default().assign(&bufs(&data)).unwrap();

        let low = labels[0].expect("low group clustered");
        let high = labels[1].expect("high group clustered");
        assert_ne!(low, high);
        assert_eq!(labels[2], Some(low));
        assert_eq!(labels[4], Some(low));
        assert_eq!(labels[3], Some(high));
        assert_eq!(labels[5], Some(high));
        assert_eq!(labels[6], None);
    }

    #[test]
    fn all_empty_samples_form_one_cluster() {
        let empty: &[u8] = b"";
        let s = vec![NibbleBuffer::new(empty); 3];
        assert_eq!(HdbscanClusterer::default().assign(&s).unwrap(), vec![Some(0); 3]);
    }
}
