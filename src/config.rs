//! Engine configuration.
//!
//! Every struct is `#[serde(default)]`, so a config document only needs to
//! name the values it overrides:
//!
//! ```json
//! { "granularity": "nibble", "ngram": { "n": 4 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::search::Granularity;
use crate::{Error, Result};

/// Default n-gram length in bytes.
pub const DEFAULT_NGRAM_LEN: usize = 8;

/// Default per-source retention threshold: an n-gram must occur more than
/// this many times in one source to be merged.
pub const DEFAULT_RETAIN_THRESHOLD: usize = 5;

/// Default minimum neighbourhood size for density clustering.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

/// Default neighbourhood radius (fraction of differing nibbles).
pub const DEFAULT_MAX_DISTANCE: f64 = 0.1;

/// Density clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub min_cluster_size: usize,
    pub max_distance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// N-gram counting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgramConfig {
    /// Window length in bytes.
    pub n: usize,
    pub retain_threshold: usize,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_NGRAM_LEN,
            retain_threshold: DEFAULT_RETAIN_THRESHOLD,
        }
    }
}

/// Top-level configuration for an `Engine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Offsets tried by pattern searches.
    pub granularity: Granularity,
    /// Minimum occurrences for a sample to count as matched.
    pub min_count: usize,
    pub cluster: ClusterConfig,
    pub ngram: NgramConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Byte,
            min_count: 1,
            cluster: ClusterConfig::default(),
            ngram: NgramConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_count == 0 {
            return Err(Error::InvalidArgument("min_count must be at least 1".into()));
        }
        if self.ngram.n == 0 {
            return Err(Error::InvalidArgument("ngram.n must be at least 1".into()));
        }
        if self.cluster.min_cluster_size == 0 {
            return Err(Error::InvalidArgument("cluster.min_cluster_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.cluster.max_distance) {
            return Err(Error::InvalidArgument(format!(
                "cluster.max_distance must be within [0, 1], got {}",
                self.cluster.max_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ngram.n, 8);
        assert_eq!(config.ngram.retain_threshold, 5);
        assert_eq!(config.granularity, Granularity::Byte);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"granularity": "nibble", "ngram": {"n": 4}}"#).unwrap();
        assert_eq!(config.granularity, Granularity::Nibble);
        assert_eq!(config.ngram.n, 4);
        assert_eq!(config.ngram.retain_threshold, DEFAULT_RETAIN_THRESHOLD);
        assert_eq!(config.cluster, ClusterConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"ngram": {"n": 0}}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"cluster": {"max_distance": 1.5}}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"min_count": 0}"#),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(EngineConfig::from_json("{"), Err(Error::Serialization(_))));
    }
}
