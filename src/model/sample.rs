//! Named input buffer.

use super::NibbleBuffer;

/// One input of a corpus: an opaque caller-supplied name (usually a file
/// path) and the bytes loaded for it. The name is passed through to
/// results unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<'a> {
    pub name: String,
    pub data: &'a [u8],
}

impl<'a> Sample<'a> {
    pub fn new(name: impl Into<String>, data: &'a [u8]) -> Self {
        Self { name: name.into(), data }
    }

    pub fn nibbles(&self) -> NibbleBuffer<'a> {
        NibbleBuffer::new(self.data)
    }
}
