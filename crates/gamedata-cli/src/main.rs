use anyhow::Result;
use clap::{Parser, Subcommand};
use gamedata::{Engine, Platform};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::resolve::{ModuleSpec, OutputFormat, VTableSpec};

#[derive(Parser)]
#[command(name = "gamedata")]
#[command(about = "Resolve Source2 gamedata against module dumps")]
struct Args {
    /// Log every resolved entry
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a gamedata document and print what it resolves to
    Resolve {
        /// Gamedata document (JSON)
        document: PathBuf,

        /// Module dump to load, as NAME=PATH or NAME=PATH@BASE (hex)
        #[arg(short, long = "module", value_name = "NAME=PATH[@BASE]", required = true)]
        modules: Vec<ModuleSpec>,

        /// Virtual table location, as LIBRARY:NAME=ADDRESS (hex)
        #[arg(long = "vtable", value_name = "LIBRARY:NAME=ADDRESS")]
        vtables: Vec<VTableSpec>,

        /// Engine section to load [default: compiled engine]
        #[arg(short, long)]
        engine: Option<Engine>,

        /// Platform branches to follow [default: compiled platform]
        #[arg(short, long)]
        platform: Option<Platform>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find the first match of a byte pattern in a dump
    Scan {
        /// Raw module dump
        dump: PathBuf,

        /// Byte pattern, e.g. "48 8B 05 ? ? ? ?"
        pattern: String,

        /// Address the dump was taken at (hex)
        #[arg(short, long, default_value = "0")]
        base: String,
    },

    /// List platform keys and the compiled target
    Platforms,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose {
        "gamedata=debug"
    } else {
        "gamedata=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Resolve {
            document,
            modules,
            vtables,
            engine,
            platform,
            format,
        } => commands::resolve::run(&document, &modules, &vtables, engine, platform, format),
        Command::Scan {
            dump,
            pattern,
            base,
        } => commands::scan::run(&dump, &pattern, &base),
        Command::Platforms => commands::platforms::run(),
    }
}
