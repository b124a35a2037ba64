//! Platform and engine selection.
//!
//! The compiled target decides which document branches apply. Every value here
//! is a compile-time constant; an unsupported target fails the build.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
compile_error!("gamedata supports only Windows, Linux and macOS targets");

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("gamedata supports only 32-bit and 64-bit targets");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Platform {
    #[strum(serialize = "win32")]
    #[serde(rename = "win32")]
    Windows32,
    #[strum(serialize = "win64")]
    #[serde(rename = "win64")]
    Windows64,
    #[strum(serialize = "linuxsteamrt32")]
    #[serde(rename = "linuxsteamrt32")]
    Linux32,
    #[strum(serialize = "linuxsteamrt64")]
    #[serde(rename = "linuxsteamrt64")]
    Linux64,
    #[strum(serialize = "osx32")]
    #[serde(rename = "osx32")]
    Mac32,
    #[strum(serialize = "osx64")]
    #[serde(rename = "osx64")]
    Mac64,
}

impl Platform {
    /// Platform of the compiled target.
    pub const fn current() -> Self {
        #[cfg(all(target_os = "windows", target_pointer_width = "64"))]
        return Self::Windows64;
        #[cfg(all(target_os = "windows", target_pointer_width = "32"))]
        return Self::Windows32;
        #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
        return Self::Linux64;
        #[cfg(all(target_os = "linux", target_pointer_width = "32"))]
        return Self::Linux32;
        #[cfg(all(target_os = "macos", target_pointer_width = "64"))]
        return Self::Mac64;
        #[cfg(all(target_os = "macos", target_pointer_width = "32"))]
        return Self::Mac32;
    }

    /// Canonical document key, e.g. `"win64"`.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Match a document member name against the known platform keys.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::iter().find(|platform| platform.key() == key)
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, Self::Windows64 | Self::Linux64 | Self::Mac64)
    }

    /// Size in bytes of a pointer on this platform.
    pub fn pointer_width(self) -> usize {
        if self.is_64bit() { 8 } else { 4 }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Engine {
    #[strum(serialize = "csgo")]
    #[serde(rename = "csgo")]
    Cs2,
    #[strum(serialize = "dota")]
    #[serde(rename = "dota")]
    Dota,
}

impl Engine {
    /// Engine selected by cargo features; `engine-dota` wins over the default.
    pub const fn current() -> Self {
        if cfg!(feature = "engine-dota") {
            Self::Dota
        } else {
            Self::Cs2
        }
    }

    /// Top-level document section name, e.g. `"csgo"`.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// Engine and platform pair a [`Config`](crate::Config) resolves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub engine: Engine,
    pub platform: Platform,
}

impl Target {
    pub const fn current() -> Self {
        Self {
            engine: Engine::current(),
            platform: Platform::current(),
        }
    }

    pub const fn new(engine: Engine, platform: Platform) -> Self {
        Self { engine, platform }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::current()
    }
}

pub fn current_platform() -> Platform {
    Platform::current()
}

pub fn platform_key(platform: Platform) -> &'static str {
    platform.key()
}

pub fn engine_key() -> &'static str {
    Engine::current().key()
}
