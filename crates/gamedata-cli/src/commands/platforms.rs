use anyhow::Result;
use gamedata::{Engine, Platform, Target};
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let current = Target::current();

    println!("{}", "Platforms".bold());
    for platform in Platform::all() {
        let marker = if platform == current.platform { "*" } else { " " };
        println!(
            "{} {:<16} {}-bit",
            marker.green(),
            platform.key(),
            platform.pointer_width() * 8
        );
    }

    println!("{}", "Engines".bold());
    for engine in Engine::all() {
        let marker = if engine == current.engine { "*" } else { " " };
        println!("{} {}", marker.green(), engine.key());
    }

    Ok(())
}
