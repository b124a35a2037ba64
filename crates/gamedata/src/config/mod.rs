//! Resolved symbol table for one engine/platform target.
//!
//! A [`Config`] owns a case-insensitive [`SymbolTable`] and three observable
//! stores:
//!
//! - **Addresses**: signature matches, vtables and derived addresses
//! - **Keys**: raw per-platform values, kept verbatim
//! - **Offsets**: signed byte offsets
//!
//! [`Config::load`] fills them from one engine section of a document. Loading
//! is best-effort: entries that fail are skipped and reported, and a failed
//! section does not stop later sections.
//!
//! ## Example
//!
//! ```
//! use gamedata::{Config, Diagnostics, Engine, Libraries, ModuleImage, Platform};
//! use serde_json::json;
//!
//! let mut libraries = Libraries::new();
//! libraries.insert(ModuleImage::new("server", 0x1000, vec![0xAA, 0xBB, 0xCC, 0xDD]));
//!
//! let document = json!({
//!     "csgo": {
//!         "Signatures": { "Foo": { "library": "server", "win64": "AA BB ? DD" } },
//!         "Addresses": { "Bar": { "signature": "Foo", "offset": 4 } }
//!     }
//! });
//!
//! let mut config = Config::builder()
//!     .engine(Engine::Cs2)
//!     .platform(Platform::Windows64)
//!     .build();
//! let mut messages = Diagnostics::new();
//! config.load(&libraries, &document, &mut messages).unwrap();
//!
//! assert_eq!(config.get_address("Foo").map(|a| a.get()), Some(0x1000));
//! assert_eq!(config.get_address("Bar").map(|a| a.get()), Some(0x1004));
//! ```

mod action;
mod loader;
mod summary;

use std::rc::Rc;

use serde_json::Value;
use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::host::GameData;
use crate::memory::Address;
use crate::platform::{Engine, Platform, Target};
use crate::storage::{ChangeListener, Storage};
use crate::symbol::{Symbol, SymbolTable};

pub use action::{Action, ActionList, AddressActions};
pub use summary::{LoadSummary, ResolvedTable, Section, SectionOutcome, SectionStats};

pub type Addresses = Storage<Symbol, Address>;
pub type Keys = Storage<Symbol, Value>;
pub type Offsets = Storage<Symbol, i64>;

#[derive(Debug, Default)]
pub struct Config {
    target: Target,
    symbols: SymbolTable,
    addresses: Addresses,
    keys: Keys,
    offsets: Offsets,
}

impl Config {
    /// Config for the compiled engine and platform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load the engine section of `document`.
    ///
    /// Fails only when the engine section itself is missing or is not an
    /// object. Section and entry failures are appended to `messages` and
    /// reflected in the returned [`LoadSummary`].
    pub fn load<G>(
        &mut self,
        root: &G,
        document: &Value,
        messages: &mut Diagnostics,
    ) -> Result<LoadSummary>
    where
        G: GameData + ?Sized,
    {
        let engine_key = self.target.engine.key();
        let engine = match document.get(engine_key) {
            Some(engine) if engine.is_object() => engine,
            Some(other) => {
                let err = Error::InvalidValue {
                    entry: engine_key.to_string(),
                    message: format!(
                        "expected an object, got {}",
                        crate::document::kind_of(other)
                    ),
                };
                warn!("{}", err);
                messages.push(err.to_string());
                return Err(err);
            }
            None => {
                let err = Error::EngineSectionNotFound(engine_key.to_string());
                warn!("{}", err);
                messages.push(err.to_string());
                return Err(err);
            }
        };

        info!(
            "Loading \"{}\" gamedata for {}",
            engine_key, self.target.platform
        );

        let mut summary = LoadSummary::new(self.target);
        for section in Section::ORDER {
            let Some(values) = engine.get(section.key()) else {
                summary.record(section, SectionOutcome::Absent);
                continue;
            };

            let mut sub_messages = Diagnostics::new();
            let outcome = match self.load_section(section, root, values, &mut sub_messages) {
                Ok(stats) => {
                    if !sub_messages.is_empty() {
                        messages.nest(
                            format!(
                                "Partially loaded \"{}\" section ({} of {} entries skipped)",
                                section,
                                stats.skipped,
                                stats.total()
                            ),
                            sub_messages,
                        );
                    }
                    info!(
                        "  {}: {} resolved, {} skipped",
                        section, stats.resolved, stats.skipped
                    );
                    SectionOutcome::Loaded(stats)
                }
                Err(e) => {
                    warn!("Failed to load \"{}\" section: {}", section, e);
                    sub_messages.push(e.to_string());
                    messages.nest(format!("Failed to load \"{}\" section", section), sub_messages);
                    SectionOutcome::Failed
                }
            };
            summary.record(section, outcome);
        }

        info!(
            "Loaded gamedata: {} resolved, {} skipped",
            summary.resolved(),
            summary.skipped()
        );
        Ok(summary)
    }

    /// Empty all three stores. Symbols and listeners are kept.
    pub fn clear_values(&mut self) {
        self.addresses.clear_values();
        self.keys.clear_values();
        self.offsets.clear_values();
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Intern `name`, e.g. to register a listener before loading.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        self.symbols.get_symbol(name)
    }

    pub fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.find_symbol(name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn get_address(&self, name: &str) -> Option<Address> {
        self.find_symbol(name)
            .and_then(|symbol| self.addresses.get(&symbol).copied())
    }

    pub fn get_offset(&self, name: &str) -> Option<i64> {
        self.find_symbol(name)
            .and_then(|symbol| self.offsets.get(&symbol).copied())
    }

    pub fn get_key(&self, name: &str) -> Option<&Value> {
        self.find_symbol(name)
            .and_then(|symbol| self.keys.get(&symbol))
    }

    pub fn addresses(&self) -> &Addresses {
        &self.addresses
    }

    pub fn addresses_mut(&mut self) -> &mut Addresses {
        &mut self.addresses
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut Keys {
        &mut self.keys
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    pub fn offsets_mut(&mut self) -> &mut Offsets {
        &mut self.offsets
    }

    /// Snapshot of every stored value, keyed by canonical (lowercase) name.
    pub fn resolved(&self) -> ResolvedTable {
        let name = |symbol: &Symbol| {
            self.symbols
                .name(*symbol)
                .unwrap_or_default()
                .to_string()
        };

        ResolvedTable {
            addresses: self
                .addresses
                .iter()
                .map(|(symbol, address)| (name(symbol), *address))
                .collect(),
            offsets: self
                .offsets
                .iter()
                .map(|(symbol, offset)| (name(symbol), *offset))
                .collect(),
            keys: self
                .keys
                .iter()
                .map(|(symbol, value)| (name(symbol), value.clone()))
                .collect(),
        }
    }

    pub(crate) fn set_address(&mut self, name: &str, address: Address) {
        let symbol = self.symbols.get_symbol(name);
        self.addresses.set(symbol, address);
    }

    pub(crate) fn set_key(&mut self, name: &str, value: Value) {
        let symbol = self.symbols.get_symbol(name);
        self.keys.set(symbol, value);
    }

    pub(crate) fn set_offset(&mut self, name: &str, offset: i64) {
        let symbol = self.symbols.get_symbol(name);
        self.offsets.set(symbol, offset);
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    engine: Option<Engine>,
    platform: Option<Platform>,
    symbols: Option<SymbolTable>,
    addresses: Addresses,
    keys: Keys,
    offsets: Offsets,
}

impl ConfigBuilder {
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn target(self, target: Target) -> Self {
        self.engine(target.engine).platform(target.platform)
    }

    /// Start from an existing symbol table, so symbols captured by listeners
    /// stay valid.
    pub fn symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn address_listener<L>(mut self, listener: &Rc<L>) -> Self
    where
        L: ChangeListener<Symbol, Address> + 'static,
    {
        self.addresses.add_listener(listener);
        self
    }

    pub fn key_listener<L>(mut self, listener: &Rc<L>) -> Self
    where
        L: ChangeListener<Symbol, Value> + 'static,
    {
        self.keys.add_listener(listener);
        self
    }

    pub fn offset_listener<L>(mut self, listener: &Rc<L>) -> Self
    where
        L: ChangeListener<Symbol, i64> + 'static,
    {
        self.offsets.add_listener(listener);
        self
    }

    pub fn build(self) -> Config {
        let current = Target::current();
        Config {
            target: Target::new(
                self.engine.unwrap_or(current.engine),
                self.platform.unwrap_or(current.platform),
            ),
            symbols: self.symbols.unwrap_or_default(),
            addresses: self.addresses,
            keys: self.keys,
            offsets: self.offsets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Libraries;
    use crate::memory::ModuleImage;
    use crate::storage::CallbackCollector;
    use serde_json::json;
    use std::cell::Cell;

    fn config() -> Config {
        Config::builder()
            .engine(Engine::Cs2)
            .platform(Platform::Windows64)
            .build()
    }

    fn libraries() -> Libraries {
        let mut libraries = Libraries::new();
        libraries.insert(ModuleImage::new(
            "server",
            0x1000,
            vec![0x90, 0x90, 0xAA, 0xBB, 0xCC, 0xDD],
        ));
        libraries
    }

    #[test]
    fn test_missing_engine_section_fails() {
        let mut config = config();
        let mut messages = Diagnostics::new();
        let result = config.load(&libraries(), &json!({"dota": {}}), &mut messages);

        assert!(matches!(result, Err(Error::EngineSectionNotFound(_))));
        assert_eq!(messages.lines(), &["Failed to find \"csgo\" section".to_string()]);
    }

    #[test]
    fn test_absent_sections_are_silent() {
        let mut config = config();
        let mut messages = Diagnostics::new();
        let summary = config
            .load(&libraries(), &json!({"csgo": {}}), &mut messages)
            .unwrap();

        assert!(messages.is_empty());
        assert!(summary.is_complete());
        assert_eq!(summary.outcome(Section::Signatures), SectionOutcome::Absent);
    }

    #[test]
    fn test_failed_section_does_not_stop_later_sections() {
        let mut config = config();
        let mut messages = Diagnostics::new();
        let document = json!({
            "csgo": {
                "Signatures": {},
                "Offsets": { "m_iHealth": { "win64": "0x10" } }
            }
        });

        let summary = config.load(&libraries(), &document, &mut messages).unwrap();

        assert_eq!(summary.outcome(Section::Signatures), SectionOutcome::Failed);
        assert_eq!(config.get_offset("m_iHealth"), Some(16));
        assert_eq!(
            messages.lines(),
            &[
                "Failed to load \"Signatures\" section".to_string(),
                "\tSection is empty".to_string(),
            ]
        );
    }

    #[test]
    fn test_addresses_reference_signatures() {
        let mut config = config();
        let mut messages = Diagnostics::new();
        let document = json!({
            "csgo": {
                "Addresses": { "Bar": { "signature": "Foo", "offset": 4 } },
                "Signatures": { "Foo": { "library": "server", "win64": "AA BB ? DD" } }
            }
        });

        config.load(&libraries(), &document, &mut messages).unwrap();

        assert!(messages.is_empty(), "{}", messages);
        assert_eq!(config.get_address("foo"), Some(Address::new(0x1002)));
        assert_eq!(config.get_address("Bar"), Some(Address::new(0x1006)));
    }

    #[test]
    fn test_getters_return_none_on_miss() {
        let config = config();
        assert_eq!(config.get_address("Nope"), None);
        assert_eq!(config.get_offset("Nope"), None);
        assert_eq!(config.get_key("Nope"), None);
    }

    #[test]
    fn test_clear_values_keeps_listeners() {
        let seen = Rc::new(Cell::new(0i64));
        let collector = Rc::new(CallbackCollector::new());

        let mut config = config();
        let symbol = config.symbol("m_iHealth");
        {
            let seen = Rc::clone(&seen);
            collector.insert(symbol, move |_, value: &i64| seen.set(*value));
        }
        config.offsets_mut().add_listener(&collector);

        let mut messages = Diagnostics::new();
        let document = json!({"csgo": {"Offsets": {"m_iHealth": {"win64": 16}}}});
        config.load(&libraries(), &document, &mut messages).unwrap();
        assert_eq!(seen.get(), 16);

        config.clear_values();
        assert_eq!(config.get_offset("m_iHealth"), None);
        assert_eq!(config.find_symbol("m_iHealth"), Some(symbol));

        config.set_offset("m_iHealth", 32);
        seen.set(0);
        config.offsets().trigger_callbacks();
        assert_eq!(seen.get(), 32);
    }

    #[test]
    fn test_builder_listener_and_symbols() {
        let mut symbols = SymbolTable::new();
        let foo = symbols.get_symbol("Foo");

        let hit = Rc::new(Cell::new(0u64));
        let collector = Rc::new(CallbackCollector::new());
        {
            let hit = Rc::clone(&hit);
            collector.insert(foo, move |_, address: &Address| hit.set(address.get()));
        }

        let mut config = Config::builder()
            .engine(Engine::Cs2)
            .platform(Platform::Windows64)
            .symbols(symbols)
            .address_listener(&collector)
            .build();

        let document = json!({
            "csgo": { "Signatures": { "Foo": { "library": "server", "win64": "AA BB" } } }
        });
        let mut messages = Diagnostics::new();
        config.load(&libraries(), &document, &mut messages).unwrap();

        assert_eq!(hit.get(), 0x1002);
    }

    #[test]
    fn test_resolved_table_snapshot() {
        let mut config = config();
        config.set_address("Foo", Address::new(0x1000));
        config.set_offset("m_iHealth", 16);
        config.set_key("Name", json!("value"));

        let table = config.resolved();
        assert_eq!(table.addresses.get("foo"), Some(&Address::new(0x1000)));
        assert_eq!(table.offsets.get("m_ihealth"), Some(&16));
        assert_eq!(table.keys.get("name"), Some(&json!("value")));
        assert!(table.addresses.get("Foo").is_none());
    }
}
