//! Zone layout file.
//!
//! ```json
//! {
//!   "config": { "max_cascade_depth": 4096 },
//!   "worlds": ["world"],
//!   "universe": { "pvp": true },
//!   "world_settings": { "world": { "max-entities": 300 } },
//!   "zones": [{
//!     "name": "spawn",
//!     "priority": 10,
//!     "volumes": [{ "world": "world", "volume": { "shape": "sphere", "center": [0, 64, 0], "radius": 32 } }],
//!     "settings": { "pvp": false },
//!     "users": { "0f4c6e0e-0b4d-4a0e-9f2c-1d9d7a3b2c10": { "build": true } }
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use eyre::{WrapErr, eyre};
use serde::Deserialize;
use tracing::debug;
use zone_hierarchy::{DomainId, Hierarchy, HierarchyConfig, HostId, UserId, Volume, ZoneSpec};

use crate::keys::SettingValues;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    #[serde(default)]
    pub config: HierarchyConfig,
    pub worlds: Vec<String>,
    #[serde(default)]
    pub universe: SettingValues,
    #[serde(default)]
    pub world_settings: BTreeMap<String, SettingValues>,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneDef {
    pub name: String,
    #[serde(default)]
    pub priority: u32,
    /// Name of the parent zone, which may appear anywhere in the file.
    #[serde(default)]
    pub parent: Option<String>,
    pub volumes: Vec<PlacedDef>,
    #[serde(default)]
    pub settings: SettingValues,
    /// Per-player values keyed by UUID.
    #[serde(default)]
    pub users: BTreeMap<String, SettingValues>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacedDef {
    pub world: String,
    pub volume: Volume,
}

impl Layout {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).wrap_err_with(|| format!("invalid layout in {}", path.display()))
    }

    pub fn from_json(text: &str) -> eyre::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Creates every world and zone and applies their settings.
    pub fn build(&self) -> eyre::Result<Hierarchy> {
        let mut hierarchy = Hierarchy::new(self.config.clone());
        for world in &self.worlds {
            hierarchy.create_domain(world.clone())?;
        }

        self.universe.apply(&mut hierarchy, HostId::Universe, None)?;
        for (world, values) in &self.world_settings {
            let id = world_id(&hierarchy, world)?;
            values
                .apply(&mut hierarchy, HostId::Domain(id), None)
                .wrap_err_with(|| format!("failed to apply settings of world {world}"))?;
        }

        for zone in &self.zones {
            let mut spec = ZoneSpec::new(zone.name.clone()).priority(zone.priority);
            for placed in &zone.volumes {
                spec = spec.volume(world_id(&hierarchy, &placed.world)?, placed.volume.clone());
            }
            let id = hierarchy
                .add_zone(spec)
                .wrap_err_with(|| format!("failed to add zone {}", zone.name))?;

            zone.settings.apply(&mut hierarchy, HostId::Zone(id), None)?;
            for (user, values) in &zone.users {
                values.apply(&mut hierarchy, HostId::Zone(id), Some(parse_user(user)?))?;
            }
            debug!(zone = %zone.name, "zone loaded");
        }

        for zone in &self.zones {
            let Some(parent) = &zone.parent else {
                continue;
            };
            let child = zone_id(&hierarchy, &zone.name)?;
            let parent = zone_id(&hierarchy, parent)
                .wrap_err_with(|| format!("zone {} names a missing parent", zone.name))?;
            hierarchy.set_parent(child, Some(parent))?;
        }

        Ok(hierarchy)
    }
}

fn world_id(hierarchy: &Hierarchy, name: &str) -> eyre::Result<DomainId> {
    hierarchy
        .domain_by_name(name)
        .map(|world| world.id())
        .ok_or_else(|| eyre!("unknown world {name:?}"))
}

fn zone_id(hierarchy: &Hierarchy, name: &str) -> eyre::Result<zone_hierarchy::ZoneId> {
    hierarchy
        .zone_by_name(name)
        .map(|zone| zone.id())
        .ok_or_else(|| eyre!("unknown zone {name:?}"))
}

/// Parses a player UUID, with or without dashes.
pub fn parse_user(text: &str) -> eyre::Result<UserId> {
    let digits: String = text.chars().filter(|&c| c != '-').collect();
    if digits.len() != 32 {
        return Err(eyre!("{text:?} is not a UUID"));
    }
    let value =
        u128::from_str_radix(&digits, 16).wrap_err_with(|| format!("{text:?} is not a UUID"))?;
    Ok(UserId(value))
}

#[cfg(test)]
mod tests {
    use zone_hierarchy::{BlockPos, Location};

    use super::*;
    use crate::keys::{BUILD, GREETING, MAX_ENTITIES, PVP};

    const LAYOUT: &str = r#"{
        "worlds": ["world", "nether"],
        "universe": { "max-entities": 500 },
        "world_settings": { "nether": { "pvp": false } },
        "zones": [
            {
                "name": "plot",
                "priority": 2,
                "parent": "town",
                "volumes": [{ "world": "world", "volume": { "shape": "cuboid", "min": { "x": 0, "y": 0, "z": 0 }, "max": { "x": 8, "y": 256, "z": 8 } } }],
                "settings": { "build": false },
                "users": { "00000000-0000-0000-0000-00000000000a": { "build": true } }
            },
            {
                "name": "town",
                "volumes": [
                    { "world": "world", "volume": { "shape": "cylinder", "center_x": 0.0, "center_z": 0.0, "radius": 64.0, "min_y": 0, "max_y": 256 } }
                ],
                "settings": { "greeting": "Welcome to town", "max-entities": 50 }
            }
        ]
    }"#;

    #[test]
    fn test_build_layout() {
        let hierarchy = Layout::from_json(LAYOUT).unwrap().build().unwrap();
        hierarchy.verify().unwrap();
        let world = hierarchy.domain_by_name("world").unwrap().id();
        let nether = hierarchy.domain_by_name("nether").unwrap().id();
        let plot = hierarchy.zone_by_name("plot").unwrap();
        let town = hierarchy.zone_by_name("town").unwrap();
        assert_eq!(plot.parent(), Some(town.id()));

        let inside_plot = Location::new(world, BlockPos::new(2, 70, 2));
        let owner = parse_user("0000000000000000000000000000000a").unwrap();
        assert!(!hierarchy.lookup_anonymous(&BUILD, &inside_plot));
        assert!(hierarchy.lookup(&BUILD, Some(owner), &inside_plot));
        assert_eq!(hierarchy.lookup_anonymous(&GREETING, &inside_plot), "Welcome to town");
        assert_eq!(hierarchy.lookup_anonymous(&MAX_ENTITIES, &inside_plot), 50);

        let in_nether = Location::new(nether, BlockPos::new(2, 70, 2));
        assert!(!hierarchy.lookup_anonymous(&PVP, &in_nether));
        assert_eq!(hierarchy.lookup_anonymous(&MAX_ENTITIES, &in_nether), 500);
    }

    #[test]
    fn test_invalid_layouts_are_rejected() {
        let unknown_world = r#"{ "worlds": [], "zones": [{ "name": "a", "volumes": [{ "world": "mars", "volume": { "shape": "slab", "min_y": 0, "max_y": 1 } }] }] }"#;
        assert!(Layout::from_json(unknown_world).unwrap().build().is_err());

        let inverted = r#"{ "worlds": ["world"], "zones": [{ "name": "a", "volumes": [{ "world": "world", "volume": { "shape": "slab", "min_y": 5, "max_y": 1 } }] }] }"#;
        assert!(Layout::from_json(inverted).is_err());

        let unknown_setting = r#"{ "worlds": ["world"], "universe": { "fly": true } }"#;
        assert!(Layout::from_json(unknown_setting).is_err());
    }

    #[test]
    fn test_parse_user() {
        assert_eq!(parse_user("00000000-0000-0000-0000-0000000000ff").unwrap(), UserId(255));
        assert!(parse_user("steve").is_err());
    }
}
