//! Byte signature parsing and scanning.
//!
//! Patterns are whitespace-separated hex bytes. `?` or `??` matches any byte,
//! and a `?` in one nibble position (`4?`, `?F`) matches any value of that
//! nibble.

use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternByte {
    pub value: u8,
    pub mask: u8,
}

impl PatternByte {
    pub const ANY: Self = Self { value: 0, mask: 0 };

    pub const fn exact(value: u8) -> Self {
        Self { value, mask: 0xFF }
    }

    pub fn is_wildcard(self) -> bool {
        self.mask == 0
    }

    pub fn is_exact(self) -> bool {
        self.mask == 0xFF
    }

    pub fn matches(self, byte: u8) -> bool {
        byte & self.mask == self.value
    }
}

impl fmt::Display for PatternByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mask {
            0x00 => f.write_str("??"),
            0xFF => write!(f, "{:02X}", self.value),
            0xF0 => write!(f, "{:X}?", self.value >> 4),
            _ => write!(f, "?{:X}", self.value & 0x0F),
        }
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<PatternByte>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(PatternByte::ANY);
            continue;
        }

        bytes.push(parse_token(token)?);
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

fn parse_token(token: &str) -> Result<PatternByte> {
    let invalid = || Error::InvalidPattern(format!("Invalid signature token '{}'", token));

    let &[high, low] = token.as_bytes() else {
        return Err(invalid());
    };

    let nibble = |c: u8| -> Result<(u8, u8)> {
        if c == b'?' {
            return Ok((0, 0));
        }
        (c as char)
            .to_digit(16)
            .map(|digit| (digit as u8, 0x0F))
            .ok_or_else(invalid)
    };

    let (high_value, high_mask) = nibble(high)?;
    let (low_value, low_mask) = nibble(low)?;
    Ok(PatternByte {
        value: (high_value << 4) | low_value,
        mask: (high_mask << 4) | low_mask,
    })
}

pub fn format_pattern(bytes: &[PatternByte]) -> String {
    bytes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Offset of the first match of `pattern` in `haystack`.
///
/// Candidates are located with `memchr` on the first fully specified byte, then
/// verified in full.
pub fn find_pattern(haystack: &[u8], pattern: &[PatternByte]) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }

    let last = haystack.len() - pattern.len();
    let Some(anchor) = pattern.iter().position(|byte| byte.is_exact()) else {
        return (0..=last).find(|&start| matches_at(haystack, start, pattern));
    };

    let anchor_value = pattern[anchor].value;
    let window = &haystack[anchor..last + anchor + 1];
    memchr::memchr_iter(anchor_value, window).find(|&start| matches_at(haystack, start, pattern))
}

/// Offsets of every match, in ascending order.
pub fn find_all_patterns(haystack: &[u8], pattern: &[PatternByte]) -> Vec<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return Vec::new();
    }

    let last = haystack.len() - pattern.len();
    (0..=last)
        .filter(|&start| matches_at(haystack, start, pattern))
        .collect()
}

fn matches_at(haystack: &[u8], start: usize, pattern: &[PatternByte]) -> bool {
    haystack[start..start + pattern.len()]
        .iter()
        .zip(pattern)
        .all(|(&byte, expected)| expected.matches(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let bytes = parse_pattern("48 8D 0D ?? ? ?? ??").unwrap();
        assert_eq!(bytes.len(), 7);
        assert_eq!(bytes[0], PatternByte::exact(0x48));
        assert_eq!(bytes[1], PatternByte::exact(0x8D));
        assert_eq!(bytes[2], PatternByte::exact(0x0D));
        assert!(bytes[3].is_wildcard());
        assert!(bytes[4].is_wildcard());
    }

    #[test]
    fn test_parse_pattern_nibble_wildcards() {
        let bytes = parse_pattern("4? ?F").unwrap();
        assert_eq!(bytes[0], PatternByte { value: 0x40, mask: 0xF0 });
        assert_eq!(bytes[1], PatternByte { value: 0x0F, mask: 0x0F });
        assert!(bytes[0].matches(0x48));
        assert!(!bytes[0].matches(0x58));
        assert!(bytes[1].matches(0xAF));
    }

    #[test]
    fn test_parse_pattern_rejects_garbage() {
        assert!(parse_pattern("").is_err());
        assert!(parse_pattern("   ").is_err());
        assert!(parse_pattern("48 GG").is_err());
        assert!(parse_pattern("488B").is_err());
    }

    #[test]
    fn test_format_pattern_roundtrip() {
        let pattern = parse_pattern("48 8d 0D ? 4? FF").unwrap();
        let formatted = format_pattern(&pattern);
        assert_eq!(formatted, "48 8D 0D ?? 4? FF");
        assert_eq!(parse_pattern(&formatted).unwrap(), pattern);
    }

    #[test]
    fn test_find_pattern_first_match() {
        let haystack = [0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0xAA, 0xBB, 0x11, 0xDD];
        let pattern = parse_pattern("AA BB ? DD").unwrap();
        assert_eq!(find_pattern(&haystack, &pattern), Some(1));
        assert_eq!(find_all_patterns(&haystack, &pattern), vec![1, 5]);
    }

    #[test]
    fn test_find_pattern_leading_wildcard() {
        let haystack = [0xAA, 0x10, 0x20, 0x30];
        let pattern = parse_pattern("?? 20 30").unwrap();
        assert_eq!(find_pattern(&haystack, &pattern), Some(1));

        let pattern = parse_pattern("?? ?? 20").unwrap();
        assert_eq!(find_pattern(&haystack, &pattern), Some(0));
    }

    #[test]
    fn test_find_pattern_at_end_and_missing() {
        let haystack = [0x01, 0x02, 0x03];
        assert_eq!(
            find_pattern(&haystack, &parse_pattern("02 03").unwrap()),
            Some(1)
        );
        assert_eq!(find_pattern(&haystack, &parse_pattern("03 04").unwrap()), None);
        assert_eq!(
            find_pattern(&haystack, &parse_pattern("01 02 03 04").unwrap()),
            None
        );
    }

    #[test]
    fn test_find_pattern_all_wildcards() {
        let haystack = [0x01, 0x02];
        let pattern = parse_pattern("? ?").unwrap();
        assert_eq!(find_pattern(&haystack, &pattern), Some(0));
    }
}
