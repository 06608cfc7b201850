//! Zone layout runner
//!
//! This binary:
//! 1. Loads the zone layout named by `ZONES_FILE` (default `zones.json`)
//! 2. Builds the world indexes and zone hierarchy
//! 3. Answers setting lookups read line by line from stdin
//!
//! Commands:
//! - `<world> <x> <y> <z> <setting> [user]` - Effective value at a point
//! - `zones <world> <x> <y> <z>` - Zones at a point, highest priority first
//! - `redundant <host> <setting>` - Whether a host repeats a superior's value
//! - `stats` - Index statistics
//! - `q` or `quit` - Quit

mod command;
mod keys;
mod layout;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use eyre::WrapErr;
use tracing::{info, warn};
use zone_hierarchy::SharedHierarchy;

use crate::command::Command;
use crate::layout::Layout;

fn main() -> eyre::Result<()> {
    // Logs go to stderr so answers on stdout stay machine readable
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("zone_runner=info".parse()?)
                .add_directive("zone_hierarchy=info".parse()?),
        )
        .init();

    let layout_path = std::env::var("ZONES_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("zones.json"));
    info!("Loading zone layout from {}", layout_path.display());

    let layout = Layout::load(&layout_path)?;
    let hierarchy = layout.build()?;
    hierarchy
        .verify()
        .wrap_err("zone layout produced an inconsistent hierarchy")?;

    let volumes: usize = hierarchy.domains().map(|world| world.tree().len()).sum();
    info!(
        worlds = hierarchy.domains().count(),
        zones = hierarchy.zones().count(),
        volumes,
        "Zone hierarchy ready"
    );

    let shared = SharedHierarchy::new(hierarchy);
    let mut stdout = io::stdout().lock();

    for line in io::stdin().lock().lines() {
        let line = line.wrap_err("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let answer = Command::parse(line).and_then(|command| {
            if command == Command::Quit {
                return Ok(None);
            }
            command::execute(&shared.read(), &command).map(Some)
        });
        match answer {
            Ok(Some(text)) => writeln!(stdout, "{text}")?,
            Ok(None) => break,
            Err(e) => {
                warn!("{e:#}");
                writeln!(stdout, "error: {e:#}")?;
            }
        }
        stdout.flush()?;
    }

    info!("Shutting down");
    Ok(())
}
