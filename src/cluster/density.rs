//! DBSCAN over normalized nibble Hamming distance.
//!
//! A sample is a *core* sample when at least `min_cluster_size` samples
//! (itself included) lie within `max_distance` of it. Clusters grow from
//! core samples through their neighbourhoods; non-core samples reached
//! this way join as border members, everything else is noise. Samples
//! are visited in input order, so labels are deterministic.

use std::collections::VecDeque;

use crate::config::ClusterConfig;
use crate::model::NibbleBuffer;
use crate::Result;

use super::{ClusterStrategy, pairwise_distances};

/// Default density strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityClusterer {
    /// Minimum neighbourhood size (self included) for a core sample.
    pub min_cluster_size: usize,
    /// Neighbourhood radius, as a fraction of differing nibbles.
    pub max_distance: f64,
}

impl DensityClusterer {
    pub fn new(min_cluster_size: usize, max_distance: f64) -> Self {
        Self { min_cluster_size, max_distance }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(config.min_cluster_size, config.max_distance)
    }
}

impl Default for DensityClusterer {
    fn default() -> Self {
        Self::from_config(&ClusterConfig::default())
    }
}

impl ClusterStrategy for DensityClusterer {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn assign(&self, samples: &[NibbleBuffer<'_>]) -> Result<Vec<Option<usize>>> {
        let n = samples.len();
        let min = self.min_cluster_size.max(1);
        if n < min {
            return Ok(vec![None; n]);
        }

        let distances = pairwise_distances(samples)?;
        let neighbours = |i: usize| -> Vec<usize> {
            (0..n).filter(|&j| distances[i][j] <= self.max_distance).collect()
        };

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next_label = 0usize;

        for i in 0..n {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            let seeds = neighbours(i);
            if seeds.len() < min {
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[i] = Some(label);

            let mut queue: VecDeque<usize> = seeds.into();
            while let Some(j) = queue.pop_front() {
                if labels[j].is_none() {
                    labels[j] = Some(label);
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let reach = neighbours(j);
                if reach.len() >= min {
                    queue.extend(reach);
                }
            }
        }

        tracing::trace!(samples = n, clusters = next_label, "dbscan labels assigned");
        Ok(labels)
    }
}
