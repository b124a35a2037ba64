//! # gamedata
//!
//! Configuration-driven binary resolver for Source2 game modules.
//!
//! A gamedata document describes, per engine and per platform, how to locate
//! things inside loaded libraries. This crate provides:
//! - A case-insensitive symbol interner
//! - Observable keyed stores with weakly held change listeners
//! - Compile-time platform and engine selection
//! - Signature scanning with nibble wildcards
//! - Address resolution through `offset`, `read` and `read_offs32` actions,
//!   including nested platform branches
//! - A [`Config`] facade that loads one engine section and exposes the results
//!
//! ## Feature Flags
//!
//! - `engine-cs2` (default): engine section `"csgo"`.
//! - `engine-dota`: engine section `"dota"`. Takes precedence when both are on.

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod host;
pub mod memory;
pub mod platform;
pub mod signature;
pub mod storage;
pub mod symbol;

pub use config::{
    Action, ActionList, AddressActions, Addresses, Config, ConfigBuilder, Keys, LoadSummary,
    Offsets, ResolvedTable, Section, SectionOutcome, SectionStats,
};
pub use diagnostics::Diagnostics;
pub use document::{load_document, parse_document, read_offset};
pub use error::{Error, ErrorKind, Result};
pub use host::{GameData, Libraries, Module};
pub use memory::{Address, ModuleImage, ProcessMemory, ReadMemory};
pub use platform::{Engine, Platform, Target, current_platform, engine_key, platform_key};
pub use signature::{PatternByte, find_all_patterns, find_pattern, format_pattern, parse_pattern};
pub use storage::{
    CallbackCollector, ChangeCallback, ChangeListener, MultiCallbackCollector, Storage,
};
pub use symbol::{Symbol, SymbolTable};
