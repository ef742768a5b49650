//! # N-gram Statistics
//!
//! Counts fixed-length byte subsequences per source and merges the
//! per-source tables into one corpus-wide view.
//!
//! ```text
//! sample ──► count_ngrams(n) ──► NgramCounts ─┐
//! sample ──► count_ngrams(n) ──► NgramCounts ─┼─► NgramAggregator (drop count <= threshold) ──► NgramTable
//! sample ──► count_ngrams(n) ──► NgramCounts ─┘
//! ```
//!
//! On large inputs with a high-entropy alphabet almost every window is
//! unique, so each source's table is thresholded *before* merging: a
//! source contributes an n-gram only if it occurs more than
//! `retain_threshold` times in that source.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::NgramConfig;
use crate::model::Sample;
use crate::{Error, Result};

/// Per-source n-gram occurrence counts.
pub type NgramCounts = HashMap<Vec<u8>, usize>;

/// Corpus-wide n-gram records keyed by n-gram.
pub type NgramTable = HashMap<Vec<u8>, NgramRecord>;

// ============================================================================
// Counting
// ============================================================================

/// Count every length-`n` window of `data`, step 1, overlaps included.
///
/// Data shorter than `n` yields an empty table. Fails with
/// `InvalidArgument` if `n` is zero.
pub fn count_ngrams(data: &[u8], n: usize) -> Result<NgramCounts> {
    if n == 0 {
        return Err(Error::InvalidArgument("n-gram length must be at least 1".into()));
    }
    let mut counts = NgramCounts::new();
    if data.len() < n {
        return Ok(counts);
    }
    for window in data.windows(n) {
        *counts.entry_ref(window).or_insert(0) += 1;
    }
    Ok(counts)
}

// ============================================================================
// Records
// ============================================================================

/// One source's contribution to an n-gram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// Aggregated occurrences of one n-gram across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramRecord {
    /// Serialized as lower-case hex.
    #[serde(with = "hex_bytes")]
    pub ngram: Vec<u8>,
    pub total_count: usize,
    /// In the order sources were merged.
    pub sources: SmallVec<[SourceCount; 4]>,
}

mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() % 2 != 0 {
            return Err(D::Error::custom("odd-length hex string"));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| {
                s.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| D::Error::custom(format!("invalid hex at offset {i}")))
            })
            .collect()
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Incremental threshold-then-merge aggregation.
#[derive(Debug, Clone, Default)]
pub struct NgramAggregator {
    retain_threshold: usize,
    table: NgramTable,
    sources: usize,
}

impl NgramAggregator {
    pub fn new(retain_threshold: usize) -> Self {
        Self {
            retain_threshold,
            table: NgramTable::new(),
            sources: 0,
        }
    }

    pub fn retain_threshold(&self) -> usize {
        self.retain_threshold
    }

    /// Number of sources merged so far.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Number of distinct n-grams retained so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Merge one source's counts, dropping n-grams seen `retain_threshold`
    /// times or fewer in this source. Returns the number retained.
    pub fn add_source(&mut self, source: impl Into<String>, counts: NgramCounts) -> usize {
        let source = source.into();
        let seen = counts.len();
        let mut retained = 0usize;
        for (ngram, count) in counts {
            if count <= self.retain_threshold {
                continue;
            }
            retained += 1;
            let contribution = SourceCount { source: source.clone(), count };
            self.table
                .entry(ngram)
                .and_modify(|record| {
                    record.total_count += count;
                    record.sources.push(contribution.clone());
                })
                .or_insert_with_key(|key| NgramRecord {
                    ngram: key.clone(),
                    total_count: count,
                    sources: smallvec::smallvec![contribution],
                });
        }
        self.sources += 1;
        tracing::debug!(
            source = %source,
            distinct = seen,
            retained,
            discarded = seen - retained,
            "n-gram counts merged"
        );
        retained
    }

    pub fn get(&self, ngram: &[u8]) -> Option<&NgramRecord> {
        self.table.get(ngram)
    }

    pub fn into_table(self) -> NgramTable {
        self.table
    }

    /// Records ordered by descending total count, ties by n-gram bytes.
    pub fn sorted_records(&self) -> Vec<NgramRecord> {
        sorted_records(&self.table)
    }
}

/// Records of `table` ordered by descending total count, ties by n-gram bytes.
pub fn sorted_records(table: &NgramTable) -> Vec<NgramRecord> {
    let mut records: Vec<NgramRecord> = table.values().cloned().collect();
    records.sort_by(|a, b| b.total_count.cmp(&a.total_count).then_with(|| a.ngram.cmp(&b.ngram)));
    records
}

/// Merge per-source counts, applying `retain_threshold` to each source first.
pub fn aggregate_ngrams<I, S>(per_source: I, retain_threshold: usize) -> NgramTable
where
    I: IntoIterator<Item = (S, NgramCounts)>,
    S: Into<String>,
{
    let mut aggregator = NgramAggregator::new(retain_threshold);
    for (source, counts) in per_source {
        aggregator.add_source(source, counts);
    }
    aggregator.into_table()
}

/// Count n-grams in every sample and merge them in sample order.
pub fn count_sources(samples: &[Sample<'_>], config: &NgramConfig) -> Result<NgramTable> {
    let count_one = |sample: &Sample<'_>| count_ngrams(sample.data, config.n);

    #[cfg(feature = "parallel")]
    let counted: Result<Vec<NgramCounts>> = {
        use rayon::prelude::*;
        samples.par_iter().map(count_one).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let counted: Result<Vec<NgramCounts>> = samples.iter().map(count_one).collect();

    let per_source = samples.iter().map(|s| s.name.clone()).zip(counted?);
    Ok(aggregate_ngrams(per_source, config.retain_threshold))
}
