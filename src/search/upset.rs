//! Upset membership: which samples contain which runs of consecutive needles.
//!
//! Given needles `s1 .. sk`, every contiguous run `si ..= sj` is
//! concatenated and searched as one needle, labelled `"{i}-{j}"` (1-based).
//! Samples that matched exactly the same set of runs form one group. The
//! groups are the data behind an upset plot; drawing it is left to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Sample;
use crate::{Error, Result};

use super::{Needle, NeedleFormat, search_sources};

/// Samples sharing one membership set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsetGroup {
    /// Run labels matched by every sample of the group, in run order.
    pub sets: Vec<String>,
    /// Sample names, sorted.
    pub sources: Vec<String>,
}

/// Group samples by which needle runs they contain at least `min_count` times.
///
/// Requires at least two needles. Groups are ordered by their membership
/// sets, comparing runs in run order; samples matching nothing form the
/// first group, with an empty `sets`.
pub fn upset_groups(
    format: NeedleFormat,
    needles: &[&str],
    samples: &[Sample<'_>],
    min_count: usize,
) -> Result<Vec<UpsetGroup>> {
    if needles.len() < 2 {
        return Err(Error::InvalidArgument(format!(
            "need at least 2 search strings for an upset comparison, got {}",
            needles.len()
        )));
    }

    // (run label, matched source names)
    let mut runs: Vec<(String, Vec<String>)> = Vec::new();
    for i in 0..needles.len() {
        for j in i..needles.len() {
            let joined: String = needles[i..=j].concat();
            let needle = Needle::parse(format, &joined)?;
            let matched = search_sources(&needle, samples, min_count)?
                .into_iter()
                .filter(|hit| hit.matched)
                .map(|hit| hit.source)
                .collect();
            runs.push((format!("{}-{}", i + 1, j + 1), matched));
        }
    }

    // Keyed by run index so that "10-10" orders after "2-2".
    let mut groups: BTreeMap<Vec<usize>, Vec<String>> = BTreeMap::new();
    for sample in samples {
        let membership: Vec<usize> = runs
            .iter()
            .enumerate()
            .filter(|(_, (_, matched))| matched.contains(&sample.name))
            .map(|(run, _)| run)
            .collect();
        groups.entry(membership).or_default().push(sample.name.clone());
    }

    Ok(groups
        .into_iter()
        .map(|(membership, mut sources)| {
            sources.sort();
            let sets = membership.into_iter().map(|run| runs[run].0.clone()).collect();
            UpsetGroup { sets, sources }
        })
        .collect())
}
