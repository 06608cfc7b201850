//! Query commands read from stdin.

use eyre::{WrapErr, bail, eyre};
use zone_hierarchy::{Hierarchy, Location, UserId};

use crate::keys;
use crate::layout::parse_user;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `<world> <x> <y> <z> <setting> [user]`
    Lookup {
        world: String,
        point: [f64; 3],
        setting: String,
        user: Option<UserId>,
    },
    /// `zones <world> <x> <y> <z>`
    Zones { world: String, point: [f64; 3] },
    /// `redundant <host> <setting>`
    Redundant { host: String, setting: String },
    Stats,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> eyre::Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            ["help" | "?"] => Self::Help,
            ["quit" | "q" | "exit"] => Self::Quit,
            ["stats"] => Self::Stats,
            ["zones", world, x, y, z] => Self::Zones {
                world: (*world).to_owned(),
                point: parse_point(x, y, z)?,
            },
            ["redundant", host, setting] => Self::Redundant {
                host: (*host).to_owned(),
                setting: (*setting).to_owned(),
            },
            [world, x, y, z, setting, rest @ ..] if rest.len() <= 1 => Self::Lookup {
                world: (*world).to_owned(),
                point: parse_point(x, y, z)?,
                setting: (*setting).to_owned(),
                user: rest.first().map(|user| parse_user(user)).transpose()?,
            },
            _ => bail!("unrecognized command {line:?}, try `help`"),
        };
        Ok(command)
    }
}

fn parse_point(x: &str, y: &str, z: &str) -> eyre::Result<[f64; 3]> {
    let mut point = [0.0; 3];
    for (slot, text) in point.iter_mut().zip([x, y, z]) {
        *slot = text
            .parse()
            .wrap_err_with(|| format!("{text:?} is not a coordinate"))?;
    }
    Ok(point)
}

fn locate(hierarchy: &Hierarchy, world: &str, [x, y, z]: [f64; 3]) -> eyre::Result<Location> {
    let world = hierarchy
        .domain_by_name(world)
        .ok_or_else(|| eyre!("unknown world {world:?}"))?;
    Ok(Location::at_point(world.id(), x, y, z))
}

/// Runs a command against the hierarchy and renders the answer.
pub fn execute(hierarchy: &Hierarchy, command: &Command) -> eyre::Result<String> {
    match command {
        Command::Lookup {
            world,
            point,
            setting,
            user,
        } => {
            let location = locate(hierarchy, world, *point)?;
            keys::describe(hierarchy, setting, *user, &location)
                .ok_or_else(|| eyre!("unknown setting {setting:?}"))
        }
        Command::Zones { world, point } => {
            let location = locate(hierarchy, world, *point)?;
            let zones: Vec<String> = hierarchy
                .zones_at(&location)
                .into_iter()
                .filter_map(|id| hierarchy.zone(id))
                .map(|zone| format!("{} ({})", zone.name(), zone.priority()))
                .collect();
            if zones.is_empty() {
                Ok("no zones".to_owned())
            } else {
                Ok(zones.join(", "))
            }
        }
        Command::Redundant { host, setting } => {
            let id = hierarchy
                .host_by_name(host)
                .ok_or_else(|| eyre!("unknown host {host:?}"))?;
            let superior = keys::identical_superior(hierarchy, id, setting)
                .ok_or_else(|| eyre!("unknown setting {setting:?}"))??;
            Ok(match superior {
                Some(same) if same == id => format!("{host} sets {setting} to its default"),
                Some(same) => format!(
                    "{host} repeats {setting} of {}",
                    hierarchy.host_name(same).unwrap_or_default()
                ),
                None => format!("{host} needs its own {setting}"),
            })
        }
        Command::Stats => {
            let mut worlds: Vec<_> = hierarchy.domains().collect();
            worlds.sort_by(|a, b| a.name().cmp(b.name()));
            let mut lines: Vec<String> = worlds
                .into_iter()
                .map(|world| match world.tree().stats() {
                    Some(stats) => format!(
                        "{}: {} volumes, {} nodes, {} leaves, largest leaf {}, largest span {}, depth {}",
                        world.name(),
                        stats.entries,
                        stats.nodes,
                        stats.leaves,
                        stats.largest_leaf,
                        stats.largest_span,
                        stats.max_depth
                    ),
                    None => format!("{}: not indexed", world.name()),
                })
                .collect();
            lines.push(format!("{} zones", hierarchy.zones().count()));
            Ok(lines.join("\n"))
        }
        Command::Help => Ok(format!(
            "<world> <x> <y> <z> <setting> [user]   effective value\n\
             zones <world> <x> <y> <z>             zones at a point\n\
             redundant <host> <setting>            redundancy check\n\
             stats                                 index statistics\n\
             quit\n\
             settings: {}",
            keys::NAMES.join(", ")
        )),
        Command::Quit => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    fn hierarchy() -> Hierarchy {
        Layout::from_json(
            r#"{
                "worlds": ["world"],
                "universe": { "pvp": false },
                "zones": [{
                    "name": "arena",
                    "priority": 3,
                    "volumes": [{ "world": "world", "volume": { "shape": "sphere", "center": [0.5, 64.5, 0.5], "radius": 8.0 } }],
                    "settings": { "pvp": true, "blocked-items": { "inverted": true, "elements": ["bow"] } }
                }]
            }"#,
        )
        .unwrap()
        .build()
        .unwrap()
    }

    fn run(hierarchy: &Hierarchy, line: &str) -> String {
        execute(hierarchy, &Command::parse(line).unwrap()).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse("world 1 2.5 -3 pvp").unwrap(),
            Command::Lookup {
                world: "world".to_owned(),
                point: [1.0, 2.5, -3.0],
                setting: "pvp".to_owned(),
                user: None,
            }
        );
        assert!(Command::parse("world 1 two 3 pvp").is_err());
        assert!(Command::parse("world 1 2 3 pvp user extra").is_err());
        assert!(Command::parse("zones world 1 2").is_err());
    }

    #[test]
    fn test_execute() {
        let hierarchy = hierarchy();
        assert_eq!(run(&hierarchy, "world 0 64 0 pvp"), "true");
        assert_eq!(run(&hierarchy, "world 100 64 0 pvp"), "false");
        assert_eq!(run(&hierarchy, "world 0 64 0 blocked-items"), "* except {bow}");
        assert_eq!(run(&hierarchy, "zones world 0 64 0"), "arena (3)");
        assert_eq!(run(&hierarchy, "zones world 100 64 0"), "no zones");
        assert_eq!(run(&hierarchy, "redundant arena pvp"), "arena needs its own pvp");
        assert_eq!(
            run(&hierarchy, "redundant _global pvp"),
            "_global needs its own pvp"
        );
        assert_eq!(
            run(&hierarchy, "stats"),
            "world: 1 volumes, 1 nodes, 1 leaves, largest leaf 1, largest span 0, depth 0\n1 zones"
        );
        assert!(execute(&hierarchy, &Command::parse("mars 0 0 0 pvp").unwrap()).is_err());
        assert!(execute(&hierarchy, &Command::parse("world 0 0 0 fly").unwrap()).is_err());
    }
}
