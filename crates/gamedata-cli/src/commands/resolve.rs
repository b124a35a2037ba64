//! Resolve command implementation.
//!
//! Loads raw module dumps as [`ModuleImage`]s, runs a gamedata document against
//! them and prints the diagnostics followed by the resolved table.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use gamedata::{
    Config, Diagnostics, Engine, Libraries, LoadSummary, ModuleImage, Platform, ResolvedTable,
    SectionOutcome, load_document,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::info;

use super::hex_utils::parse_hex_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// `NAME=PATH[@BASE]`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    pub name: String,
    pub path: PathBuf,
    pub base: u64,
}

impl FromStr for ModuleSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=PATH[@BASE], got \"{}\"", s))?;
        if name.is_empty() {
            bail!("module name is empty in \"{}\"", s);
        }

        let (path, base) = match rest.rsplit_once('@') {
            Some((path, base)) => (path, parse_hex_address(base)?),
            None => (rest, 0),
        };
        if path.is_empty() {
            bail!("module path is empty in \"{}\"", s);
        }

        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
            base,
        })
    }
}

/// `LIBRARY:NAME=ADDRESS`
#[derive(Debug, Clone, PartialEq)]
pub struct VTableSpec {
    pub library: String,
    pub name: String,
    pub address: u64,
}

impl FromStr for VTableSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (target, address) = s
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("expected LIBRARY:NAME=ADDRESS, got \"{}\"", s))?;
        let (library, name) = target
            .split_once(':')
            .ok_or_else(|| anyhow!("expected LIBRARY:NAME=ADDRESS, got \"{}\"", s))?;
        if library.is_empty() || name.is_empty() {
            bail!("library and vtable name must not be empty in \"{}\"", s);
        }

        Ok(Self {
            library: library.to_string(),
            name: name.to_string(),
            address: parse_hex_address(address)?,
        })
    }
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a LoadSummary,
    messages: &'a [String],
    resolved: ResolvedTable,
}

pub fn run(
    document: &Path,
    modules: &[ModuleSpec],
    vtables: &[VTableSpec],
    engine: Option<Engine>,
    platform: Option<Platform>,
    format: OutputFormat,
) -> Result<()> {
    let libraries = load_libraries(modules, vtables)?;
    let document = load_document(document)
        .with_context(|| format!("Failed to load document {:?}", document))?;

    let mut builder = Config::builder();
    if let Some(engine) = engine {
        builder = builder.engine(engine);
    }
    if let Some(platform) = platform {
        builder = builder.platform(platform);
    }
    let mut config = builder.build();

    let mut messages = Diagnostics::new();
    let summary = match config.load(&libraries, &document, &mut messages) {
        Ok(summary) => summary,
        Err(e) => {
            print_diagnostics(&messages);
            return Err(e).context("Failed to load gamedata");
        }
    };

    match format {
        OutputFormat::Text => {
            print_diagnostics(&messages);
            print_summary(&summary);
            print_table(&config.resolved());
        }
        OutputFormat::Json => {
            let report = Report {
                summary: &summary,
                messages: messages.lines(),
                resolved: config.resolved(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_libraries(modules: &[ModuleSpec], vtables: &[VTableSpec]) -> Result<Libraries> {
    let mut libraries = Libraries::new();
    for spec in modules {
        let image = ModuleImage::from_file(&spec.name, &spec.path, spec.base)
            .with_context(|| format!("Failed to load module dump {:?}", spec.path))?;
        info!(
            "Loaded \"{}\" ({} bytes at 0x{:X})",
            spec.name,
            image.size(),
            spec.base
        );
        if libraries.insert(image).is_some() {
            bail!("Module \"{}\" given more than once", spec.name);
        }
    }

    for spec in vtables {
        let image = libraries
            .get_mut(&spec.library)
            .ok_or_else(|| anyhow!("Unknown library \"{}\" for vtable \"{}\"", spec.library, spec.name))?;
        image.add_vtable(&spec.name, spec.address);
    }

    Ok(libraries)
}

fn print_diagnostics(messages: &Diagnostics) {
    for line in messages.iter() {
        if line.starts_with('\t') {
            eprintln!("  {}", line.trim_start_matches('\t'));
        } else {
            eprintln!("{}", line.yellow());
        }
    }
}

fn print_summary(summary: &LoadSummary) {
    println!(
        "{} ({} / {})",
        "Gamedata".bold(),
        summary.target.engine,
        summary.target.platform
    );
    for (section, outcome) in summary.sections() {
        match outcome {
            SectionOutcome::Absent => println!("  {:<12} {}", section, "absent".dimmed()),
            SectionOutcome::Failed => println!("  {:<12} {}", section, "failed".red()),
            SectionOutcome::Loaded(stats) if stats.skipped > 0 => println!(
                "  {:<12} {} resolved, {}",
                section,
                stats.resolved,
                format!("{} skipped", stats.skipped).yellow()
            ),
            SectionOutcome::Loaded(stats) => {
                println!("  {:<12} {} resolved", section, stats.resolved.green())
            }
        }
    }
    println!();
}

fn print_table(table: &ResolvedTable) {
    if table.is_empty() {
        println!("{}", "Nothing resolved".dimmed());
        return;
    }

    let width = table
        .addresses
        .keys()
        .chain(table.offsets.keys())
        .chain(table.keys.keys())
        .map(String::len)
        .max()
        .unwrap_or(0);

    if !table.addresses.is_empty() {
        println!("{}", "Addresses".bold());
        for (name, address) in &table.addresses {
            println!("  {:<width$}  {}", name, address.cyan(), width = width);
        }
    }
    if !table.offsets.is_empty() {
        println!("{}", "Offsets".bold());
        for (name, offset) in &table.offsets {
            let hex = if *offset < 0 {
                format!("-0x{:X}", offset.unsigned_abs())
            } else {
                format!("0x{:X}", offset)
            };
            println!("  {:<width$}  {} ({})", name, hex.cyan(), offset, width = width);
        }
    }
    if !table.keys.is_empty() {
        println!("{}", "Keys".bold());
        for (name, value) in &table.keys {
            println!("  {:<width$}  {}", name, value, width = width);
        }
    }
}
