//! Per-sample search reports.
//!
//! A needle is given as text, hex bytes or a wildcard pattern and searched
//! across a set of samples; each sample gets a `SearchHit` saying how often
//! the needle occurred and whether that clears `min_count`.

use serde::{Deserialize, Serialize};

use crate::model::{Pattern, Sample};
use crate::{Error, Result};

use super::{CompiledPattern, Granularity, search_bytes};

/// How a needle string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedleFormat {
    /// UTF-8 text, searched as its raw bytes.
    Text,
    /// Hex digits, whitespace ignored: `"00 01"` or `"0001"`.
    Hex,
    /// Wildcard pattern: `"?? 01"`.
    Pattern,
}

/// Something to search for.
#[derive(Debug, Clone)]
pub enum Needle {
    Bytes(Vec<u8>),
    Pattern(CompiledPattern),
}

impl Needle {
    /// Parse `s` according to `format`.
    pub fn parse(format: NeedleFormat, s: &str) -> Result<Self> {
        let needle = match format {
            NeedleFormat::Text => Needle::Bytes(s.as_bytes().to_vec()),
            NeedleFormat::Hex => Needle::Bytes(parse_hex(s)?),
            NeedleFormat::Pattern => Needle::Pattern(CompiledPattern::new(&Pattern::parse(s)?)?),
        };
        if let Needle::Bytes(bytes) = &needle {
            if bytes.is_empty() {
                return Err(Error::InvalidArgument("empty search needle".into()));
            }
        }
        Ok(needle)
    }

    /// Byte offsets of every occurrence in `data`.
    pub fn find(&self, data: &[u8]) -> Result<Vec<usize>> {
        match self {
            Needle::Bytes(bytes) => search_bytes(bytes, data),
            Needle::Pattern(pattern) => Ok(pattern.search(data, Granularity::Byte)),
        }
    }
}

/// Decode hex digits, ignoring whitespace.
fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| Error::InvalidArgument(format!("invalid hex digit {c:?}")))
        })
        .collect::<Result<_>>()?;
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "hex string has an odd number of digits ({})",
            digits.len()
        )));
    }
    Ok(digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
}

/// Search outcome for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub source: String,
    pub count: usize,
    /// `count >= min_count`.
    pub matched: bool,
    /// Byte offsets, ascending.
    pub positions: Vec<usize>,
}

/// Search every sample for `needle`. Results are sorted by source name.
///
/// Fails with `InvalidArgument` if `min_count` is zero.
pub fn search_sources(needle: &Needle, samples: &[Sample<'_>], min_count: usize) -> Result<Vec<SearchHit>> {
    if min_count == 0 {
        return Err(Error::InvalidArgument("min_count must be at least 1".into()));
    }

    let search_one = |sample: &Sample<'_>| -> Result<SearchHit> {
        let positions = needle.find(sample.data)?;
        Ok(SearchHit {
            source: sample.name.clone(),
            count: positions.len(),
            matched: positions.len() >= min_count,
            positions,
        })
    };

    #[cfg(feature = "parallel")]
    let hits: Result<Vec<SearchHit>> = {
        use rayon::prelude::*;
        samples.par_iter().map(search_one).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let hits: Result<Vec<SearchHit>> = samples.iter().map(search_one).collect();

    let mut hits = hits?;
    hits.sort_by(|a, b| a.source.cmp(&b.source));
    tracing::debug!(
        samples = hits.len(),
        matched = hits.iter().filter(|h| h.matched).count(),
        "search complete"
    );
    Ok(hits)
}
