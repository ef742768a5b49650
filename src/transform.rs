//! Byte-range selection and simple transforms.
//!
//! Slice ends follow a small offset grammar:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `n`  | absolute end offset |
//! | `+n` | `n` bytes after the start |
//! | `-n` | `n` bytes before the end of the data |
//!
//! Numbers accept `0x`, `0o` and `0b` prefixes. Every operation clamps to
//! the data, so no range ever reads past the end.

use std::str::FromStr;

use crate::{Error, Result};

/// Parse an unsigned offset, decimal or `0x`/`0o`/`0b` prefixed.
pub fn parse_offset(s: &str) -> Result<usize> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };
    usize::from_str_radix(digits, radix)
        .map_err(|e| Error::InvalidArgument(format!("invalid offset {s:?}: {e}")))
}

/// Where a slice ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEnd {
    Absolute(usize),
    FromStart(usize),
    FromEnd(usize),
}

impl FromStr for SliceEnd {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('+') {
            Ok(SliceEnd::FromStart(parse_offset(rest)?))
        } else if let Some(rest) = s.strip_prefix('-') {
            Ok(SliceEnd::FromEnd(parse_offset(rest)?))
        } else {
            Ok(SliceEnd::Absolute(parse_offset(s)?))
        }
    }
}

/// Slice `data` from `base + start` to `end`.
///
/// `base` is a per-sample position (e.g. a search hit) and `start` a
/// relative offset from it.
pub fn slice(data: &[u8], base: usize, start: usize, end: SliceEnd) -> &[u8] {
    let pos = base.saturating_add(start);
    let len = match end {
        SliceEnd::FromStart(n) => n,
        SliceEnd::Absolute(n) => n.saturating_sub(pos),
        SliceEnd::FromEnd(n) => data.len().saturating_sub(pos).saturating_sub(n),
    };
    let from = pos.min(data.len());
    let to = from.saturating_add(len).min(data.len());
    &data[from..to]
}

/// `length` bytes starting at `start` (to the end when `None`), clamped.
pub fn window(data: &[u8], start: usize, length: Option<usize>) -> &[u8] {
    let end = match length {
        Some(len) => SliceEnd::FromStart(len),
        None => SliceEnd::FromEnd(0),
    };
    slice(data, 0, start, end)
}

/// The bytes of `data` in reverse order.
pub fn reverse(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = b"0123456789";

    #[test]
    fn test_parse_offset_radixes() {
        assert_eq!(parse_offset("16").unwrap(), 16);
        assert_eq!(parse_offset("0x10").unwrap(), 16);
        assert_eq!(parse_offset("0X1f").unwrap(), 31);
        assert_eq!(parse_offset("0o20").unwrap(), 16);
        assert_eq!(parse_offset("0b101").unwrap(), 5);
        assert!(parse_offset("zz").is_err());
    }

    #[test]
    fn test_slice_end_grammar() {
        assert_eq!("+4".parse::<SliceEnd>().unwrap(), SliceEnd::FromStart(4));
        assert_eq!("-0x2".parse::<SliceEnd>().unwrap(), SliceEnd::FromEnd(2));
        assert_eq!("8".parse::<SliceEnd>().unwrap(), SliceEnd::Absolute(8));
    }

    #[test]
    fn test_slice_modes() {
        assert_eq!(slice(DATA, 0, 2, SliceEnd::FromStart(3)), b"234");
        assert_eq!(slice(DATA, 0, 2, SliceEnd::Absolute(5)), b"234");
        assert_eq!(slice(DATA, 0, 2, SliceEnd::FromEnd(2)), b"234567");
        assert_eq!(slice(DATA, 4, 1, SliceEnd::FromStart(2)), b"56");
    }

    #[test]
    fn test_slice_clamps() {
        assert_eq!(slice(DATA, 0, 8, SliceEnd::FromStart(10)), b"89");
        assert_eq!(slice(DATA, 0, 20, SliceEnd::FromStart(1)), b"");
        assert_eq!(slice(DATA, 0, 6, SliceEnd::Absolute(2)), b"");
        assert_eq!(slice(DATA, 0, 6, SliceEnd::FromEnd(9)), b"");
    }

    #[test]
    fn test_window() {
        assert_eq!(window(DATA, 7, None), b"789");
        assert_eq!(window(DATA, 1, Some(2)), b"12");
    }

    #[test]
    fn test_reverse() {
        assert_eq!(reverse(b"\x01\x02\x03"), vec![3, 2, 1]);
    }
}
