//! Wildcard nibble patterns.
//!
//! A pattern is written as hex digits and `?` wildcards, one character per
//! nibble: `"01 01 ?? 01"`, `"4?5a"`, `"deadbee"`. Whitespace is ignored and
//! upper-case digits are accepted, so `"DE AD"` and `"dead"` parse to the
//! same pattern. Internally the pattern is packed into two parallel byte
//! arrays:
//!
//! | Character | value nibble | mask nibble |
//! |-----------|--------------|-------------|
//! | `0`-`f`   | digit        | `0xF`       |
//! | `?`       | `0x0`        | `0x0`       |
//!
//! An odd-length pattern pads the low nibble of its final byte with
//! value `0` and mask `0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::nibbles::split;
use crate::{Error, Result};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A wildcard nibble pattern: packed `value` and `mask` plus the logical
/// nibble length.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    value: Vec<u8>,
    mask: Vec<u8>,
    len: usize,
}

impl Pattern {
    /// Parse a wildcard pattern string.
    ///
    /// Fails with `InvalidPatternSyntax` on the first character outside
    /// `0-9a-fA-F?` that is not whitespace. `position` is the character
    /// index in the input as given.
    pub fn parse(s: &str) -> Result<Self> {
        let mut nibbles = Vec::with_capacity(s.len());
        for (position, character) in s.chars().enumerate() {
            if character.is_whitespace() {
                continue;
            }
            let nibble = match character {
                '?' => None,
                c => match c.to_digit(16) {
                    Some(d) => Some(d as u8),
                    None => return Err(Error::InvalidPatternSyntax { position, character }),
                },
            };
            nibbles.push(nibble);
        }
        Ok(Self::from_nibbles(nibbles))
    }

    /// Build a pattern from a nibble sequence; `None` is a wildcard.
    pub fn from_nibbles<I>(nibbles: I) -> Self
    where
        I: IntoIterator<Item = Option<u8>>,
    {
        let mut value = Vec::new();
        let mut mask = Vec::new();
        let mut len = 0usize;
        for nibble in nibbles {
            let (v, m) = match nibble {
                Some(n) => (n & 0x0F, 0x0F),
                None => (0, 0),
            };
            if len % 2 == 0 {
                value.push(v << 4);
                mask.push(m << 4);
            } else {
                let last = value.len() - 1;
                value[last] |= v;
                mask[last] |= m;
            }
            len += 1;
        }
        Self { value, mask, len }
    }

    /// A pattern that matches exactly `bytes`, with no wildcards.
    pub fn exact(bytes: &[u8]) -> Self {
        Self {
            value: bytes.to_vec(),
            mask: vec![0xFF; bytes.len()],
            len: bytes.len() * 2,
        }
    }

    /// Build from packed parts. Value bits under a cleared mask are zeroed.
    ///
    /// Fails with `LengthMismatch` if `value` and `mask` differ in length,
    /// or with `InvalidArgument` if `len` does not fit the packed bytes or a
    /// mask nibble is neither `0x0` nor `0xF`.
    pub fn from_parts(value: Vec<u8>, mask: Vec<u8>, len: usize) -> Result<Self> {
        if value.len() != mask.len() {
            return Err(Error::LengthMismatch { expected: value.len(), got: mask.len() });
        }
        if len.div_ceil(2) != value.len() {
            return Err(Error::InvalidArgument(format!(
                "pattern length {len} nibbles does not fit {} packed bytes",
                value.len()
            )));
        }
        if let Some(pos) = mask.iter().position(|&m| {
            let (hi, lo) = split(m);
            !matches!(hi, 0x0 | 0xF) || !matches!(lo, 0x0 | 0xF)
        }) {
            return Err(Error::InvalidArgument(format!(
                "mask byte {pos} is {:#04x}; each mask nibble must be 0x0 or 0xf",
                mask[pos]
            )));
        }
        let mut mask = mask;
        if len % 2 == 1 {
            if let Some(last) = mask.last_mut() {
                *last &= 0xF0;
            }
        }
        let value = value.iter().zip(&mask).map(|(v, m)| v & m).collect();
        Ok(Self { value, mask, len })
    }

    /// Logical length in nibbles.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed length in bytes (`ceil(len / 2)`).
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.value.len()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Nibble at `index`: `Some(value)` for an exact position, `None` for a wildcard.
    pub fn get(&self, index: usize) -> Result<Option<u8>> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange { index, len: self.len });
        }
        Ok(self.nibble_unchecked(index))
    }

    #[inline]
    fn nibble_unchecked(&self, index: usize) -> Option<u8> {
        let (vh, vl) = split(self.value[index / 2]);
        let (mh, ml) = split(self.mask[index / 2]);
        let (v, m) = if index % 2 == 0 { (vh, mh) } else { (vl, ml) };
        (m != 0).then_some(v)
    }

    /// Iterate nibbles in order; `None` marks a wildcard.
    pub fn nibbles(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        (0..self.len).map(|i| self.nibble_unchecked(i))
    }

    pub fn is_wildcard(&self, index: usize) -> Result<bool> {
        Ok(self.get(index)?.is_none())
    }

    pub fn wildcard_count(&self) -> usize {
        self.nibbles().filter(Option::is_none).count()
    }

    /// True if no position is a wildcard.
    pub fn is_exact(&self) -> bool {
        self.wildcard_count() == 0
    }

    /// Render back to the canonical string: lower-case hex digits and `?`,
    /// no whitespace.
    pub fn render(&self) -> String {
        self.nibbles()
            .map(|n| match n {
                Some(v) => HEX_DIGITS[v as usize] as char,
                None => '?',
            })
            .collect()
    }

    /// The same nibbles preceded by one wildcard. Used to compare the
    /// pattern byte-wise against odd nibble offsets.
    pub(crate) fn shifted(&self) -> Pattern {
        Pattern::from_nibbles(std::iter::once(None).chain(self.nibbles()))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.render())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_packs_value_and_mask() {
        let p = Pattern::parse("01 01 ?? 01").unwrap();
        assert_eq!(p.len(), 8);
        assert_eq!(p.value(), &[0x01, 0x01, 0x00, 0x01]);
        assert_eq!(p.mask(), &[0xFF, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn test_parse_half_wildcard_byte() {
        let p = Pattern::parse("4?").unwrap();
        assert_eq!(p.value(), &[0x40]);
        assert_eq!(p.mask(), &[0xF0]);
        assert_eq!(p.get(0).unwrap(), Some(4));
        assert_eq!(p.get(1).unwrap(), None);
    }

    #[test]
    fn test_parse_odd_length_pads_low_nibble() {
        let p = Pattern::parse("abc").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.byte_len(), 2);
        assert_eq!(p.value(), &[0xAB, 0xC0]);
        assert_eq!(p.mask(), &[0xFF, 0xF0]);
        assert_eq!(p.render(), "abc");
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let p = Pattern::parse(" DE ad\tBE\nef ").unwrap();
        assert_eq!(p.render(), "deadbeef");
        assert!(p.is_exact());
    }

    #[test]
    fn test_parse_rejects_invalid_character() {
        let err = Pattern::parse("01 0g").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPatternSyntax { position: 4, character: 'g' }
        ));
    }

    #[test]
    fn test_parse_rejects_ida_style_star() {
        assert!(Pattern::parse("01 ** 02").is_err());
    }

    #[test]
    fn test_parse_empty() {
        let p = Pattern::parse("   ").unwrap();
        assert!(p.is_empty());
        assert_eq!(p.render(), "");
    }

    #[test]
    fn test_get_out_of_range() {
        let p = Pattern::parse("ab").unwrap();
        assert!(matches!(p.get(2), Err(Error::IndexOutOfRange { index: 2, len: 2 })));
    }

    #[test]
    fn test_wildcard_count() {
        let p = Pattern::parse("0?1??2").unwrap();
        assert_eq!(p.wildcard_count(), 3);
        assert!(!p.is_exact());
        assert!(p.is_wildcard(1).unwrap());
        assert!(!p.is_wildcard(2).unwrap());
    }

    #[test]
    fn test_exact_from_bytes() {
        let p = Pattern::exact(b"\x12\xab");
        assert_eq!(p.render(), "12ab");
        assert!(p.is_exact());
    }

    #[test]
    fn test_from_parts_clears_masked_value_bits() {
        let p = Pattern::from_parts(vec![0xFF, 0x12], vec![0x0F, 0xF0], 3).unwrap();
        assert_eq!(p.value(), &[0x0F, 0x10]);
        assert_eq!(p.render(), "?f1");
    }

    #[test]
    fn test_from_parts_rejects_bad_lengths() {
        assert!(matches!(
            Pattern::from_parts(vec![0], vec![0, 0], 2),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            Pattern::from_parts(vec![0], vec![0], 3),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_parts_rejects_partial_mask_nibbles() {
        assert!(matches!(
            Pattern::from_parts(vec![0x01], vec![0x3F], 2),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Pattern::from_parts(vec![0x01, 0x00], vec![0xFF, 0xF8], 4),
            Err(Error::InvalidArgument(_))
        ));
        let p = Pattern::from_parts(vec![0x41], vec![0x0F], 2).unwrap();
        assert_eq!(Pattern::parse(&p.render()).unwrap(), p);
    }

    #[test]
    fn test_shifted_prepends_wildcard() {
        let p = Pattern::parse("abc").unwrap();
        let s = p.shifted();
        assert_eq!(s.render(), "?abc");
        assert_eq!(s.value(), &[0x0A, 0xBC]);
        assert_eq!(s.mask(), &[0x0F, 0xFF]);
    }

    #[test]
    fn test_serde_uses_rendered_string() {
        let p = Pattern::parse("DE ?D").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"de?d\"");
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<Pattern>("\"xyz\"").is_err());
    }
}
