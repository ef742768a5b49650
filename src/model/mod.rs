//! # Binary Data Model
//!
//! Value types that cross every boundary: search ↔ consensus ↔ clustering ↔
//! export. This module is pure data: no I/O, no state.

pub mod nibbles;
pub mod pattern;
pub mod sample;

pub use nibbles::{NibbleBuffer, NibbleIter};
pub use pattern::Pattern;
pub use sample::Sample;
