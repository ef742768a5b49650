//! Consensus patterns.
//!
//! The consensus of a set of same-length buffers keeps every nibble on
//! which all buffers agree and wildcards the rest. The builder folds
//! buffers in one at a time, tracking the XOR of each buffer against the
//! first: a nibble stays exact while its accumulated difference is zero.

use crate::model::{NibbleBuffer, Pattern};
use crate::{Error, Result};

/// Incremental consensus over same-length buffers.
#[derive(Debug, Clone, Default)]
pub struct ConsensusBuilder {
    reference: Vec<u8>,
    /// OR of `buffer ^ reference` over every buffer pushed so far.
    diff: Vec<u8>,
    samples: usize,
}

impl ConsensusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers folded in so far.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Add one buffer. Fails with `LengthMismatch` if its nibble length
    /// differs from the first buffer's.
    pub fn push(&mut self, buffer: NibbleBuffer<'_>) -> Result<&mut Self> {
        let bytes = buffer.as_bytes();
        if self.samples == 0 {
            self.reference = bytes.to_vec();
            self.diff = vec![0; bytes.len()];
        } else {
            if bytes.len() != self.reference.len() {
                return Err(Error::LengthMismatch {
                    expected: self.reference.len() * 2,
                    got: buffer.len(),
                });
            }
            for ((d, &r), &b) in self.diff.iter_mut().zip(&self.reference).zip(bytes) {
                *d |= r ^ b;
            }
        }
        self.samples += 1;
        Ok(self)
    }

    /// The consensus pattern. Fails with `InvalidArgument` if no buffer was pushed.
    pub fn build(&self) -> Result<Pattern> {
        if self.samples == 0 {
            return Err(Error::InvalidArgument("consensus requires at least one buffer".into()));
        }
        let mask: Vec<u8> = self
            .diff
            .iter()
            .map(|&d| {
                let hi = if d & 0xF0 == 0 { 0xF0 } else { 0x00 };
                let lo = if d & 0x0F == 0 { 0x0F } else { 0x00 };
                hi | lo
            })
            .collect();
        let len = self.reference.len() * 2;
        let pattern = Pattern::from_parts(self.reference.clone(), mask, len)?;
        tracing::debug!(
            samples = self.samples,
            nibbles = len,
            wildcards = pattern.wildcard_count(),
            "consensus built"
        );
        Ok(pattern)
    }
}

/// Consensus of `buffers`: exact where all agree, wildcard elsewhere.
///
/// Fails with `LengthMismatch` if the buffers differ in length and with
/// `InvalidArgument` if there are none.
pub fn build_consensus(buffers: &[NibbleBuffer<'_>]) -> Result<Pattern> {
    let mut builder = ConsensusBuilder::new();
    for &buffer in buffers {
        builder.push(buffer)?;
    }
    builder.build()
}
