//! JSON export of analysis results.
//!
//! Results are written as pretty-printed JSON documents, one per call,
//! followed by a newline. Patterns appear as their wildcard strings and
//! n-grams as hex, so the output can be fed back into pattern search.
//!
//! ```text
//! Clustering  → write_clustering()   → { "clusters": [...], "unclustered": {...} }
//! NgramTable  → write_ngrams()       → [ { "ngram": "dead", "total_count": .. }, ... ]
//! SearchHit[] → write_search_hits()  → [ { "source": .., "positions": [..] }, ... ]
//! ```

use std::io::Write;

use serde::Serialize;

use crate::cluster::Clustering;
use crate::ngram::{NgramTable, sorted_records};
use crate::search::SearchHit;
use crate::Result;

fn write_json<T: Serialize + ?Sized>(value: &T, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Export clusters (ascending id) and the unclustered bucket.
pub fn write_clustering(clustering: &Clustering, writer: &mut dyn Write) -> Result<()> {
    write_json(clustering, writer)
}

/// Export an n-gram table, most frequent first.
pub fn write_ngrams(table: &NgramTable, writer: &mut dyn Write) -> Result<()> {
    write_json(&sorted_records(table), writer)
}

/// Export per-sample search results.
pub fn write_search_hits(hits: &[SearchHit], writer: &mut dyn Write) -> Result<()> {
    write_json(hits, writer)
}
