//! # reven: Binary Pattern Engine
//!
//! Finds structural commonalities across a corpus of related binaries
//! (firmware images, configuration blobs) and locates exact or wildcarded
//! byte patterns inside them.
//!
//! ## Design Principles
//!
//! 1. **Nibble-first**: every offset past `NibbleBuffer` is a checked nibble index
//! 2. **Pure core**: no I/O, no global state; callers load bytes and own names
//! 3. **Pluggable grouping**: `ClusterStrategy` is the contract between clustering and consensus
//! 4. **Bounded tables**: n-gram counts are thresholded per source before merging
//!
//! ## Quick Start
//!
//! ```rust
//! use reven::{Granularity, Sample, parse_pattern, search_pattern, cluster_and_consensus};
//!
//! # fn example() -> reven::Result<()> {
//! let pattern = parse_pattern("01 01 ?? 01")?;
//! let hits = search_pattern(&pattern, b"\x01\x01\xfe\x01\x01\x01\x01", Granularity::Byte)?;
//! assert_eq!(hits, vec![0, 3]);
//!
//! let samples = vec![
//!     Sample::new("a.bin", b"\x10\x20\x30\x40"),
//!     Sample::new("b.bin", b"\x10\x20\x30\x40"),
//!     Sample::new("c.bin", b"\xff\xee\xdd\xcc"),
//! ];
//! let clustering = cluster_and_consensus(&samples)?;
//! assert_eq!(clustering.clusters[0].pattern.to_string(), "10203040");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Components
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | NibbleBuffer | `model::nibbles` | nibble view over bytes |
//! | Pattern | `model::pattern` | wildcard pattern codec |
//! | Matcher | `search` | exhaustive pattern / byte search |
//! | Consensus | `consensus` | agreement pattern over same-length buffers |
//! | Clusterer | `cluster` | density grouping + per-group consensus |
//! | N-grams | `ngram` | windowed counts, threshold-then-merge |
//!
//! ## Features
//!
//! | Feature | Adds |
//! |---------|------|
//! | `hdbscan` | `cluster::HdbscanClusterer` |
//! | `parallel` | rayon for per-sample search, counting and distance rows |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod search;
pub mod consensus;
pub mod cluster;
pub mod ngram;
pub mod stats;
pub mod transform;
pub mod config;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{NibbleBuffer, NibbleIter, Pattern, Sample};

// ============================================================================
// Re-exports: Operations
// ============================================================================

pub use search::{
    CompiledPattern, Granularity, Needle, NeedleFormat, SearchHit, UpsetGroup,
    search_bytes, search_pattern, search_sources, upset_groups,
};
pub use consensus::{ConsensusBuilder, build_consensus};
pub use cluster::{
    Cluster, ClusterId, ClusterStrategy, Clusterer, Clustering, DensityClusterer,
    cluster_and_consensus,
};
#[cfg(feature = "hdbscan")]
pub use cluster::HdbscanClusterer;
pub use ngram::{
    NgramAggregator, NgramCounts, NgramRecord, NgramTable, SourceCount,
    aggregate_ngrams, count_ngrams,
};
pub use config::{ClusterConfig, EngineConfig, NgramConfig};

// ============================================================================
// Entry points
// ============================================================================

/// Parse a wildcard pattern string (`"01 ?? 4?"`).
pub fn parse_pattern(s: &str) -> Result<Pattern> {
    Pattern::parse(s)
}

/// Canonical string form of a pattern: lower-case hex and `?`.
pub fn pattern_to_string(pattern: &Pattern) -> String {
    pattern.render()
}

// ============================================================================
// Top-level Engine handle
// ============================================================================

/// A configured analysis session. Wraps an `EngineConfig` and the
/// clustering strategy used by `cluster`.
pub struct Engine<S: ClusterStrategy = DensityClusterer> {
    config: EngineConfig,
    clusterer: Clusterer<S>,
}

impl Engine<DensityClusterer> {
    /// Engine with the density strategy built from `config.cluster`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let strategy = DensityClusterer::from_config(&config.cluster);
        Self::with_strategy(config, strategy)
    }
}

impl Default for Engine<DensityClusterer> {
    fn default() -> Self {
        let config = EngineConfig::default();
        let clusterer = Clusterer::new(DensityClusterer::from_config(&config.cluster));
        Self { config, clusterer }
    }
}

impl<S: ClusterStrategy> Engine<S> {
    /// Engine with a caller-supplied clustering strategy.
    pub fn with_strategy(config: EngineConfig, strategy: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clusterer: Clusterer::new(strategy),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Search every sample for `needle`, applying the configured `min_count`.
    pub fn search(&self, needle: &Needle, samples: &[Sample<'_>]) -> Result<Vec<SearchHit>> {
        search_sources(needle, samples, self.config.min_count)
    }

    /// Search one buffer for a pattern at the configured granularity.
    pub fn find(&self, pattern: &Pattern, data: &[u8]) -> Result<Vec<usize>> {
        search_pattern(pattern, data, self.config.granularity)
    }

    /// One consensus pattern over all samples.
    pub fn consensus(&self, samples: &[Sample<'_>]) -> Result<Pattern> {
        let buffers: Vec<NibbleBuffer<'_>> = samples.iter().map(Sample::nibbles).collect();
        build_consensus(&buffers)
    }

    /// Cluster samples and build one consensus pattern per group.
    pub fn cluster(&self, samples: &[Sample<'_>]) -> Result<Clustering> {
        self.clusterer.cluster(samples)
    }

    /// Count n-grams per sample and merge with the configured threshold.
    pub fn ngrams(&self, samples: &[Sample<'_>]) -> Result<NgramTable> {
        ngram::count_sources(samples, &self.config.ngram)
    }

    /// Byte-value frequencies of one sample.
    pub fn byte_frequencies(&self, sample: &Sample<'_>) -> Vec<stats::ByteFrequency> {
        stats::byte_frequency_table(sample.data)
    }

    /// Upset membership groups for a run of needles.
    pub fn upset(&self, format: NeedleFormat, needles: &[&str], samples: &[Sample<'_>]) -> Result<Vec<UpsetGroup>> {
        upset_groups(format, needles, samples, self.config.min_count)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid pattern syntax at position {position}: unexpected character {character:?}")]
    InvalidPatternSyntax { position: usize, character: char },

    #[error("Length mismatch: expected {expected} nibbles, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
