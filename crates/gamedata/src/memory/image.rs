use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Module;
use crate::signature::{find_pattern, parse_pattern};

use super::{Address, ReadMemory};

/// Snapshot of a loaded module: its base address, image bytes and named
/// virtual tables.
#[derive(Debug, Clone)]
pub struct ModuleImage {
    name: String,
    base: u64,
    bytes: Vec<u8>,
    vtables: HashMap<String, u64>,
}

impl ModuleImage {
    pub fn new(name: impl Into<String>, base: u64, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            base,
            bytes,
            vtables: HashMap::new(),
        }
    }

    /// Load a raw memory dump taken at `base`.
    pub fn from_file<P: AsRef<Path>>(name: impl Into<String>, path: P, base: u64) -> Result<Self> {
        let bytes = fs::read(&path)?;
        debug!(
            "Loaded module dump {} ({} bytes at 0x{:X})",
            path.as_ref().display(),
            bytes.len(),
            base
        );
        Ok(Self::new(name, base, bytes))
    }

    pub fn with_vtable(mut self, name: impl Into<String>, address: u64) -> Self {
        self.add_vtable(name, address);
        self
    }

    pub fn add_vtable(&mut self, name: impl Into<String>, address: u64) {
        self.vtables.insert(name.into(), address);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether `address..address + size` lies inside the image.
    pub fn contains(&self, address: u64, size: usize) -> bool {
        self.range(address, size).is_some()
    }

    fn range(&self, address: u64, size: usize) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(size)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl Module for ModuleImage {
    fn find_pattern(&self, pattern: &str) -> Result<Option<Address>> {
        let parsed = parse_pattern(pattern)?;
        Ok(find_pattern(&self.bytes, &parsed)
            .map(|offset| Address::new(self.base.wrapping_add(offset as u64))))
    }

    fn virtual_table_by_name(&self, name: &str) -> Option<Address> {
        self.vtables.get(name).copied().map(Address::new)
    }
}

impl ReadMemory for ModuleImage {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let range = self.range(address, size).ok_or_else(|| Error::MemoryReadFailed {
            address,
            message: format!(
                "{} bytes outside of \"{}\" (0x{:X}..0x{:X})",
                size,
                self.name,
                self.base,
                self.base.wrapping_add(self.bytes.len() as u64)
            ),
        })?;
        Ok(self.bytes[range].to_vec())
    }
}
