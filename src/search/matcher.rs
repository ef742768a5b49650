//! Compiled wildcard matcher.
//!
//! A pattern is compared against the data one byte at a time as
//! `(data & mask) == value`. Byte-aligned offsets use the pattern as
//! parsed. Odd nibble offsets use a copy shifted right by one nibble (a
//! leading wildcard), so both phases reduce to the same masked byte
//! comparison and no per-nibble extraction happens in the inner loop.
//!
//! ```text
//! pattern "abc"      even phase: value [ab c0]  mask [ff f0]
//!                    odd phase:  value [0a bc]  mask [0f ff]
//! ```

use crate::model::Pattern;
use crate::{Error, Result};

use super::Granularity;

/// Masked byte comparison for one nibble phase.
#[derive(Debug, Clone)]
struct Phase {
    value: Vec<u8>,
    mask: Vec<u8>,
    /// First fully-exact byte, checked before the full comparison.
    anchor: Option<usize>,
}

impl Phase {
    fn new(pattern: &Pattern) -> Self {
        Self {
            value: pattern.value().to_vec(),
            mask: pattern.mask().to_vec(),
            anchor: pattern.mask().iter().position(|&m| m == 0xFF),
        }
    }

    #[inline]
    fn matches(&self, window: &[u8]) -> bool {
        if let Some(a) = self.anchor {
            if window[a] != self.value[a] {
                return false;
            }
        }
        window
            .iter()
            .zip(&self.mask)
            .zip(&self.value)
            .all(|((&d, &m), &v)| d & m == v)
    }
}

/// A pattern prepared for repeated searching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    len: usize,
    even: Phase,
    odd: Phase,
}

impl CompiledPattern {
    /// Fails with `InvalidArgument` for an empty pattern.
    pub fn new(pattern: &Pattern) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidArgument("cannot search for an empty pattern".into()));
        }
        Ok(Self {
            len: pattern.len(),
            even: Phase::new(pattern),
            odd: Phase::new(&pattern.shifted()),
        })
    }

    /// Pattern length in nibbles.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Does the pattern match `data` starting at nibble offset `offset`?
    ///
    /// A pattern that would run past the end of the data does not match.
    pub fn matches_at(&self, data: &[u8], offset: usize) -> bool {
        if offset.checked_add(self.len).is_none_or(|end| end > data.len() * 2) {
            return false;
        }
        let phase = if offset % 2 == 0 { &self.even } else { &self.odd };
        let start = offset / 2;
        match data.get(start..start + phase.value.len()) {
            Some(window) => phase.matches(window),
            None => false,
        }
    }

    /// All match offsets in ascending order, in units of `granularity`.
    pub fn search(&self, data: &[u8], granularity: Granularity) -> Vec<usize> {
        let total = data.len() * 2;
        if self.len > total {
            return Vec::new();
        }
        let step = granularity.step();
        let hits: Vec<usize> = (0..=total - self.len)
            .step_by(step)
            .filter(|&o| self.matches_at(data, o))
            .map(|o| o / step)
            .collect();
        tracing::trace!(pattern_len = self.len, data_len = data.len(), hits = hits.len(), "pattern search");
        hits
    }
}
