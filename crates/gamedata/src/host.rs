//! Host collaborators.
//!
//! The resolver reaches the outside world only through [`GameData`]: library
//! lookup by name and a memory view for pointer-chasing actions. The host owns
//! both and passes them into [`Config::load`](crate::Config::load).

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::{Address, ModuleImage, ReadMemory};

/// A loaded module the resolver can query.
pub trait Module {
    /// First match of a byte pattern inside the module image.
    ///
    /// `Ok(None)` means the pattern is well-formed but absent.
    fn find_pattern(&self, pattern: &str) -> Result<Option<Address>>;

    fn virtual_table_by_name(&self, name: &str) -> Option<Address>;
}

/// Library-resolution context supplied by the host.
pub trait GameData {
    fn find_library(&self, name: &str) -> Option<&dyn Module>;

    /// Memory that `read` and `read_offs32` actions dereference.
    fn memory(&self) -> &dyn ReadMemory;
}

/// Registry of module images keyed by library name.
///
/// Images keep their registration order. A memory read goes to the first
/// registered image that contains the whole range, so overlapping dumps resolve
/// deterministically.
///
/// `insert` and `clear` are the init/teardown pair: the registry must outlive
/// any [`Config`](crate::Config) whose addresses point into its modules.
#[derive(Debug, Clone, Default)]
pub struct Libraries {
    modules: Vec<ModuleImage>,
    index: HashMap<String, usize>,
}

impl Libraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under its own name.
    ///
    /// A module with the same name is replaced in place and returned; it keeps
    /// its registration position.
    pub fn insert(&mut self, module: ModuleImage) -> Option<ModuleImage> {
        debug!(
            "Registered library \"{}\" at 0x{:X} ({} bytes)",
            module.name(),
            module.base(),
            module.size()
        );
        let existing = self.index.get(module.name()).copied();
        match existing {
            Some(position) => Some(std::mem::replace(&mut self.modules[position], module)),
            None => {
                self.index.insert(module.name().to_string(), self.modules.len());
                self.modules.push(module);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ModuleImage> {
        let position = self.index.remove(name)?;
        let module = self.modules.remove(position);
        for later in self.index.values_mut().filter(|later| **later > position) {
            *later -= 1;
        }
        Some(module)
    }

    pub fn clear(&mut self) {
        self.modules.clear();
        self.index.clear();
    }

    pub fn get(&self, name: &str) -> Option<&ModuleImage> {
        self.index.get(name).map(|&position| &self.modules[position])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleImage> {
        let position = *self.index.get(name)?;
        self.modules.get_mut(position)
    }

    /// Library names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(ModuleImage::name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl GameData for Libraries {
    fn find_library(&self, name: &str) -> Option<&dyn Module> {
        self.get(name).map(|module| module as &dyn Module)
    }

    fn memory(&self) -> &dyn ReadMemory {
        self
    }
}

impl ReadMemory for Libraries {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.modules
            .iter()
            .find(|module| module.contains(address, size))
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("{} bytes outside of every loaded library", size),
            })?
            .read_bytes(address, size)
    }
}
