//! Hex address parsing and formatting utilities.

use anyhow::{Result, bail};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        bail!("Invalid hex address: \"{}\"", s);
    }
    u64::from_str_radix(digits, 16).map_err(|e| anyhow::anyhow!("Invalid hex address \"{}\": {}", s, e))
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
