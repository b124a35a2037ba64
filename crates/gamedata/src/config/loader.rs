//! Section loaders.
//!
//! Every section is a mapping from entry name to entry object. A section that
//! is empty or not an object fails as a whole; otherwise each entry is resolved
//! independently and failures are recorded without aborting the section.

use serde_json::Value;
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::document::{Members, expect_object, kind_of, member_str, value_as_offset};
use crate::error::{Error, Result};
use crate::host::{GameData, Module};
use crate::memory::Address;

use super::action::AddressActions;
use super::{Config, Section, SectionStats};

const LIBRARY_KEY: &str = "library";
const NAME_KEY: &str = "name";

impl Config {
    pub(super) fn load_section<G>(
        &mut self,
        section: Section,
        root: &G,
        values: &Value,
        messages: &mut Diagnostics,
    ) -> Result<SectionStats>
    where
        G: GameData + ?Sized,
    {
        match section {
            Section::Signatures => load_entries(section, values, messages, |name, entry, _| {
                self.load_signature(root, name, entry)
            }),
            Section::VTables => load_entries(section, values, messages, |name, entry, _| {
                self.load_vtable(root, name, entry)
            }),
            Section::Keys => load_entries(section, values, messages, |name, entry, _| {
                self.load_key(name, entry)
            }),
            Section::Offsets => load_entries(section, values, messages, |name, entry, _| {
                self.load_offset(name, entry)
            }),
            Section::Addresses => load_entries(section, values, messages, |name, entry, notes| {
                self.load_address(root, name, entry, notes)
            }),
        }
    }

    fn load_signature<G>(&mut self, root: &G, name: &str, entry: &Value) -> Result<()>
    where
        G: GameData + ?Sized,
    {
        let members = expect_object(name, entry)?;
        let module = find_library(root, name, members)?;

        let pattern = match self.platform_value(name, members)? {
            Value::String(pattern) => pattern,
            other => {
                return Err(Error::InvalidValue {
                    entry: name.to_string(),
                    message: format!("signature must be a string, got {}", kind_of(other)),
                });
            }
        };

        let address = module
            .find_pattern(pattern)
            .map_err(|e| Error::InvalidValue {
                entry: name.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| Error::PatternNotFound(name.to_string()))?;

        debug!("Signature \"{}\" found at {}", name, address);
        self.set_address(name, address);
        Ok(())
    }

    fn load_vtable<G>(&mut self, root: &G, name: &str, entry: &Value) -> Result<()>
    where
        G: GameData + ?Sized,
    {
        let members = expect_object(name, entry)?;
        let module = find_library(root, name, members)?;

        let table_name = match members.get(NAME_KEY) {
            Some(_) => member_str(name, members, NAME_KEY)?,
            None => name,
        };

        let address = module
            .virtual_table_by_name(table_name)
            .ok_or_else(|| Error::VTableNotFound {
                name: table_name.to_string(),
                entry: name.to_string(),
            })?;

        debug!("VTable \"{}\" found at {}", table_name, address);
        self.set_address(name, address);
        Ok(())
    }

    fn load_key(&mut self, name: &str, entry: &Value) -> Result<()> {
        let members = expect_object(name, entry)?;
        let value = self.platform_value(name, members)?.clone();

        debug!("Key \"{}\" = {}", name, value);
        self.set_key(name, value);
        Ok(())
    }

    fn load_offset(&mut self, name: &str, entry: &Value) -> Result<()> {
        let members = expect_object(name, entry)?;
        let offset = value_as_offset(name, self.platform_value(name, members)?)?;

        debug!("Offset \"{}\" = {:#x}", name, offset);
        self.set_offset(name, offset);
        Ok(())
    }

    fn load_address<G>(
        &mut self,
        root: &G,
        name: &str,
        entry: &Value,
        notes: &mut Diagnostics,
    ) -> Result<()>
    where
        G: GameData + ?Sized,
    {
        let parsed = AddressActions::parse(name, entry)?;

        let reference = parsed.signature.as_deref().ok_or_else(|| Error::MissingKey {
            key: "signature".to_string(),
            entry: name.to_string(),
        })?;

        let start = self
            .get_address(reference)
            .ok_or_else(|| Error::UnresolvedReference {
                reference: reference.to_string(),
                entry: name.to_string(),
            })?;

        let cursor = parsed
            .actions
            .resolve(name, start.get(), self.target.platform, root.memory(), notes)
            .map_err(|e| Error::AddressAction {
                entry: name.to_string(),
                source: Box::new(e),
            })?;

        let address = Address::new(cursor);
        debug!(
            "Address \"{}\" resolved to {} (from \"{}\" at {})",
            name, address, reference, start
        );
        self.set_address(name, address);
        Ok(())
    }

    fn platform_value<'a>(&self, name: &str, members: &'a Members) -> Result<&'a Value> {
        let key = self.target.platform.key();
        members.get(key).ok_or_else(|| Error::MissingPlatform {
            platform: key.to_string(),
            entry: name.to_string(),
        })
    }
}

fn find_library<'g, G>(root: &'g G, name: &str, members: &Members) -> Result<&'g dyn Module>
where
    G: GameData + ?Sized,
{
    let library = member_str(name, members, LIBRARY_KEY)?;
    root.find_library(library)
        .ok_or_else(|| Error::UnknownLibrary {
            library: library.to_string(),
            entry: name.to_string(),
        })
}

/// Run `resolve` over every entry of a section.
///
/// `resolve` gets a notes accumulator for non-fatal remarks; an `Err` skips the
/// entry. Both end up in `messages`.
fn load_entries<F>(
    section: Section,
    values: &Value,
    messages: &mut Diagnostics,
    mut resolve: F,
) -> Result<SectionStats>
where
    F: FnMut(&str, &Value, &mut Diagnostics) -> Result<()>,
{
    let entries = values.as_object().ok_or_else(|| Error::InvalidValue {
        entry: section.to_string(),
        message: format!("expected an object, got {}", kind_of(values)),
    })?;

    if entries.is_empty() {
        return Err(Error::EmptySection);
    }

    let mut stats = SectionStats::default();
    for (name, entry) in entries {
        let mut notes = Diagnostics::new();
        let result = resolve(name, entry, &mut notes);

        for note in notes.iter() {
            warn!("{}: {}", section, note);
        }
        messages.extend(notes);

        match result {
            Ok(()) => stats.resolved += 1,
            Err(e) => {
                warn!("{}: skipped \"{}\": {}", section, name, e);
                messages.push(e.to_string());
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}
