use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use strum::{Display, IntoStaticStr};

use crate::memory::Address;
use crate::platform::Target;

/// Engine subsections, in the order they are loaded.
///
/// `Addresses` runs last because its entries reference earlier results by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
pub enum Section {
    Signatures,
    VTables,
    Keys,
    Offsets,
    Addresses,
}

impl Section {
    pub const ORDER: [Section; 5] = [
        Section::Signatures,
        Section::VTables,
        Section::Keys,
        Section::Offsets,
        Section::Addresses,
    ];

    pub fn key(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionStats {
    pub resolved: usize,
    pub skipped: usize,
}

impl SectionStats {
    pub fn total(&self) -> usize {
        self.resolved + self.skipped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionOutcome {
    /// Not present in the document.
    Absent,
    Loaded(SectionStats),
    /// Empty or malformed; no entry was processed.
    Failed,
}

/// Per-section result of one [`Config::load`](crate::Config::load).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub target: Target,
    sections: Vec<(Section, SectionOutcome)>,
}

impl LoadSummary {
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            sections: Vec::with_capacity(Section::ORDER.len()),
        }
    }

    pub(crate) fn record(&mut self, section: Section, outcome: SectionOutcome) {
        self.sections.push((section, outcome));
    }

    pub fn outcome(&self, section: Section) -> SectionOutcome {
        self.sections
            .iter()
            .find(|(recorded, _)| *recorded == section)
            .map_or(SectionOutcome::Absent, |(_, outcome)| *outcome)
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, SectionOutcome)> + '_ {
        self.sections.iter().copied()
    }

    pub fn failed_sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections
            .iter()
            .filter(|(_, outcome)| *outcome == SectionOutcome::Failed)
            .map(|(section, _)| *section)
    }

    pub fn resolved(&self) -> usize {
        self.stats().map(|stats| stats.resolved).sum()
    }

    pub fn skipped(&self) -> usize {
        self.stats().map(|stats| stats.skipped).sum()
    }

    /// True when every present section loaded and no entry was skipped.
    pub fn is_complete(&self) -> bool {
        self.failed_sections().next().is_none() && self.skipped() == 0
    }

    fn stats(&self) -> impl Iterator<Item = SectionStats> + '_ {
        self.sections.iter().filter_map(|(_, outcome)| match outcome {
            SectionOutcome::Loaded(stats) => Some(*stats),
            _ => None,
        })
    }
}

/// Name-sorted snapshot of everything a [`Config`](crate::Config) resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedTable {
    pub addresses: BTreeMap<String, Address>,
    pub offsets: BTreeMap<String, i64>,
    pub keys: BTreeMap<String, Value>,
}

impl ResolvedTable {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.offsets.is_empty() && self.keys.is_empty()
    }
}
