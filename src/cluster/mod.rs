//! # Similarity Clustering
//!
//! Partitions same-length samples into groups of structurally similar
//! buffers and derives one consensus pattern per group.
//!
//! ```text
//! samples ──► ClusterStrategy::assign ──► labels ──► group ──► build_consensus per group
//!                                         (None = noise)         └─► unclustered bucket
//! ```
//!
//! Distance between two samples is the normalized nibble Hamming distance
//! (`NibbleBuffer::distance`). Grouping is delegated to a `ClusterStrategy`:
//!
//! | Strategy | Module | Feature |
//! |----------|--------|---------|
//! | `DensityClusterer` | `density` | (default) DBSCAN over the distance matrix |
//! | `HdbscanClusterer` | `hdbscan` | `hdbscan` |
//!
//! Whatever the strategy, every sample ends up in exactly one group, and
//! samples the strategy leaves unassigned go to the unclustered bucket
//! (reported separately, absent when empty). Distance computation is
//! quadratic in the number of samples.

pub mod density;
#[cfg(feature = "hdbscan")]
pub mod hdbscan;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consensus::build_consensus;
use crate::model::{NibbleBuffer, Pattern, Sample};
use crate::{Error, Result};

pub use density::DensityClusterer;
#[cfg(feature = "hdbscan")]
pub use self::hdbscan::HdbscanClusterer;

// ============================================================================
// Cluster identifiers and results
// ============================================================================

/// Cluster identifier. `-1` is reserved for the unclustered bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub i32);

impl ClusterId {
    pub const UNCLUSTERED: ClusterId = ClusterId(-1);

    pub fn is_unclustered(self) -> bool {
        self == Self::UNCLUSTERED
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One group of samples and the consensus over exactly those samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Sample names, in input order.
    pub members: Vec<String>,
    pub pattern: Pattern,
}

/// Output of clustering: ordered clusters plus the optional unclustered bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clustering {
    /// Ascending by id.
    pub clusters: Vec<Cluster>,
    pub unclustered: Option<Cluster>,
}

impl Clustering {
    /// Every group, clusters first, then the unclustered bucket.
    pub fn groups(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().chain(self.unclustered.as_ref())
    }

    /// Total number of samples across all groups.
    pub fn sample_count(&self) -> usize {
        self.groups().map(|c| c.members.len()).sum()
    }

    /// The group a named sample landed in.
    pub fn group_of(&self, member: &str) -> Option<&Cluster> {
        self.groups().find(|c| c.members.iter().any(|m| m == member))
    }
}

// ============================================================================
// Strategy trait
// ============================================================================

/// A pluggable grouping algorithm.
///
/// `assign` receives buffers of equal length and returns one label per
/// buffer: `Some(k)` puts it in group `k`, `None` leaves it unclustered.
/// Label values only need to be consistent within one call; the
/// `Clusterer` renumbers them.
pub trait ClusterStrategy {
    fn name(&self) -> &'static str;

    fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>>;
}

impl<T: ClusterStrategy + ?Sized> ClusterStrategy for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
        (**self).assign(samples)
    }
}

impl<T: ClusterStrategy + ?Sized> ClusterStrategy for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
        (**self).assign(samples)
    }
}

/// Full pairwise normalized Hamming distance matrix.
///
/// Fails with `LengthMismatch` if the buffers differ in length.
pub fn pairwise_distances(samples: &[NibbleBuffer<'_>]) -> Result<Vec<Vec<f64>>> {
    let row = |a: &NibbleBuffer<'_>| -> Result<Vec<f64>> {
        samples.iter().map(|b| a.distance(b)).collect()
    };

    #[cfg(feature = "parallel")]
    let matrix = {
        use rayon::prelude::*;
        samples.par_iter().map(row).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let matrix = samples.iter().map(row).collect();

    matrix
}

// ============================================================================
// Clusterer
// ============================================================================

/// Runs a strategy and turns its labels into consensus-bearing clusters.
#[derive(Debug, Clone, Default)]
pub struct Clusterer<S> {
    strategy: S,
}

impl<S: ClusterStrategy> Clusterer<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Cluster `samples` and build one consensus pattern per group.
    ///
    /// Fails with `LengthMismatch` unless all samples share a length. Fewer
    /// than two samples is not an error: they form a single unclustered
    /// group without consulting the strategy.
    pub fn cluster(&self, samples: &[Sample<'_>]) -> Result<Clustering> {
        let buffers: Vec<NibbleBuffer<'_>> = samples.iter().map(Sample::nibbles).collect();
        if let Some(first) = buffers.first() {
            for b in &buffers[1..] {
                first.ensure_same_len(b)?;
            }
        }

        let labels = if samples.len() < 2 {
            vec![None; samples.len()]
        } else {
            self.strategy.assign(&buffers)?
        };
        if labels.len() != samples.len() {
            return Err(Error::InvalidArgument(format!(
                "strategy {} returned {} labels for {} samples",
                self.strategy.name(),
                labels.len(),
                samples.len()
            )));
        }

        let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut noise = Vec::new();
        for (idx, label) in labels.iter().enumerate() {
            match label {
                Some(k) => grouped.entry(*k).or_default().push(idx),
                None => noise.push(idx),
            }
        }

        let make = |id: ClusterId, members: &[usize]| -> Result<Cluster> {
            let bufs: Vec<NibbleBuffer<'_>> = members.iter().map(|&i| buffers[i]).collect();
            Ok(Cluster {
                id,
                members: members.iter().map(|&i| samples[i].name.clone()).collect(),
                pattern: build_consensus(&bufs)?,
            })
        };

        let clusters = grouped
            .values()
            .enumerate()
            .map(|(k, members)| make(ClusterId(k as i32), members.as_slice()))
            .collect::<Result<Vec<_>>>()?;
        let unclustered = if noise.is_empty() {
            None
        } else {
            Some(make(ClusterId::UNCLUSTERED, noise.as_slice())?)
        };

        tracing::debug!(
            strategy = self.strategy.name(),
            samples = samples.len(),
            clusters = clusters.len(),
            unclustered = noise.len(),
            "clustering complete"
        );
        Ok(Clustering { clusters, unclustered })
    }
}

/// Cluster with the default density strategy and build per-group consensus.
pub fn cluster_and_consensus(samples: &[Sample<'_>]) -> Result<Clustering> {
    Clusterer::new(DensityClusterer::default()).cluster(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Puts every sample whose first byte is even into group 7, the rest into noise.
    struct EvenFirstByte;

    impl ClusterStrategy for EvenFirstByte {
        fn name(&self) -> &'static str {
            "even-first-byte"
        }

        fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
            Ok(samples
                .iter()
                .map(|s| (s.as_bytes()[0] % 2 == 0).then_some(7))
                .collect())
        }
    }

    struct WrongCount;

    impl ClusterStrategy for WrongCount {
        fn name(&self) -> &'static str {
            "wrong-count"
        }

        fn assign(&self, _samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
            Ok(vec![Some(0)])
        }
    }

    #[test]
    fn test_labels_are_renumbered_and_noise_collected() {
        let samples = vec![
            Sample::new("a", b"\x02\x11"),
            Sample::new("b", b"\x03\x11"),
            Sample::new("c", b"\x04\x11"),
        ];
        let result = Clusterer::new(EvenFirstByte).cluster(&samples).unwrap();

        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].id, ClusterId(0));
        assert_eq!(result.clusters[0].members, vec!["a", "c"]);
        assert_eq!(result.clusters[0].pattern.render(), "0?11");

        let noise = result.unclustered.as_ref().unwrap();
        assert!(noise.id.is_unclustered());
        assert_eq!(noise.members, vec!["b"]);
        assert_eq!(noise.pattern.render(), "0311");
        assert_eq!(result.sample_count(), 3);
        assert_eq!(result.group_of("b").unwrap().id, ClusterId::UNCLUSTERED);
    }

    #[test]
    fn test_single_sample_is_unclustered() {
        let samples = vec![Sample::new("only", b"\xab")];
        let result = Clusterer::new(WrongCount).cluster(&samples).unwrap();
        assert!(result.clusters.is_empty());
        assert_eq!(result.unclustered.unwrap().members, vec!["only"]);
    }

    #[test]
    fn test_no_samples() {
        let result = cluster_and_consensus(&[]).unwrap();
        assert!(result.clusters.is_empty());
        assert!(result.unclustered.is_none());
    }

    #[test]
    fn test_strategy_label_count_checked() {
        let samples = vec![Sample::new("a", b"\x00"), Sample::new("b", b"\x00")];
        let err = Clusterer::new(WrongCount).cluster(&samples).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_length_mismatch() {
        let samples = vec![Sample::new("a", b"\x00"), Sample::new("b", b"\x00\x00")];
        let err = cluster_and_consensus(&samples).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_pairwise_distances_symmetric() {
        let a = NibbleBuffer::new(b"\x00\x00");
        let b = NibbleBuffer::new(b"\x0f\x00");
        let m = pairwise_distances(&[a, b]).unwrap();
        assert_eq!(m[0][0], 0.0);
        assert_eq!(m[0][1], 0.25);
        assert_eq!(m[1][0], 0.25);
    }
}
