//! # Pattern and Byte Search
//!
//! | Function | Needle | Offsets |
//! |----------|--------|---------|
//! | `search_pattern` | wildcard `Pattern` | byte or nibble units, per `Granularity` |
//! | `search_bytes` | exact byte string | byte units |
//!
//! Every search is exhaustive: overlapping matches are all reported, in
//! ascending order. Both are pure functions of their inputs, so callers may
//! search independent buffers concurrently.

pub mod matcher;
pub mod report;
pub mod upset;

use serde::{Deserialize, Serialize};

use crate::model::Pattern;
use crate::{Error, Result};

pub use matcher::CompiledPattern;
pub use report::{Needle, NeedleFormat, SearchHit, search_sources};
pub use upset::{UpsetGroup, upset_groups};

/// Which offsets a pattern search tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Byte-aligned (even nibble) offsets only; results are byte offsets.
    #[default]
    Byte,
    /// Every nibble offset; results are nibble offsets.
    Nibble,
}

impl Granularity {
    /// Offset step in nibbles.
    pub fn step(self) -> usize {
        match self {
            Granularity::Byte => 2,
            Granularity::Nibble => 1,
        }
    }
}

/// Find every offset where `pattern` matches `data`.
///
/// Fails with `InvalidArgument` if the pattern is empty.
pub fn search_pattern(pattern: &Pattern, data: &[u8], granularity: Granularity) -> Result<Vec<usize>> {
    Ok(CompiledPattern::new(pattern)?.search(data, granularity))
}

/// Find every (possibly overlapping) byte offset where `needle` occurs in `haystack`.
///
/// Fails with `InvalidArgument` if the needle is empty.
pub fn search_bytes(needle: &[u8], haystack: &[u8]) -> Result<Vec<usize>> {
    let Some(&first) = needle.first() else {
        return Err(Error::InvalidArgument("cannot search for an empty byte string".into()));
    };
    if needle.len() > haystack.len() {
        return Ok(Vec::new());
    }
    let hits = haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| w[0] == first && *w == needle)
        .map(|(i, _)| i)
        .collect();
    Ok(hits)
}
