//! Scan command implementation.
//!
//! Searches a raw module dump for a byte pattern, the same way signature
//! entries are resolved.

use std::path::Path;

use anyhow::{Context, Result, bail};
use gamedata::{Address, Module, ModuleImage, format_pattern, parse_pattern};
use owo_colors::OwoColorize;

use super::hex_utils::{format_hex_address, parse_hex_address};

pub fn run(dump: &Path, pattern: &str, base: &str) -> Result<()> {
    let base = parse_hex_address(base)?;
    let image = ModuleImage::from_file("dump", dump, base)
        .with_context(|| format!("Failed to load module dump {:?}", dump))?;
    let normalized = format_pattern(&parse_pattern(pattern)?);

    match locate(&image, pattern)? {
        Some((address, offset)) => {
            println!(
                "{}  {} (+0x{:X})",
                normalized,
                format_hex_address(address.get()).green(),
                offset
            );
            Ok(())
        }
        None => bail!(
            "Pattern {} not found in {} bytes at {}",
            normalized,
            image.size(),
            format_hex_address(base)
        ),
    }
}

/// First match as an absolute address and its offset into the dump.
///
/// Addresses wrap at the top of the address space, so the offset is taken with
/// wrapping arithmetic.
fn locate(image: &ModuleImage, pattern: &str) -> Result<Option<(Address, u64)>> {
    let found = image.find_pattern(pattern)?;
    Ok(found.map(|address| (address, address.get().wrapping_sub(image.base()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_reports_offset_from_base() {
        let image = ModuleImage::new("dump", 0x7FF0_0000, vec![0x90, 0x90, 0x48, 0x8B, 0x05]);
        let (address, offset) = locate(&image, "48 8B ?").unwrap().unwrap();
        assert_eq!(address, Address::new(0x7FF0_0002));
        assert_eq!(offset, 2);
    }

    #[test]
    fn test_locate_handles_wrapped_address() {
        let image = ModuleImage::new("dump", u64::MAX - 1, vec![0, 0, 0, 0, 0xAA, 0xBB]);
        let (address, offset) = locate(&image, "AA BB").unwrap().unwrap();
        assert_eq!(address, Address::new(2));
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_locate_missing_and_invalid() {
        let image = ModuleImage::new("dump", 0, vec![0x11, 0x22]);
        assert!(locate(&image, "33").unwrap().is_none());
        assert!(locate(&image, "ZZ").is_err());
    }
}
