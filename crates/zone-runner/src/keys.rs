//! Settings known to the runner.

use serde::Deserialize;
use zone_hierarchy::{
    AltSet, Flag, Hierarchy, HierarchyResult, HostId, Location, Number, SetSetting, Setting, Text,
    UserId,
};

pub const PVP: Flag = Flag::new("pvp", true);
pub const BUILD: Flag = Flag::new("build", true);
pub const GREETING: Text = Text::new("greeting", "");
pub const MAX_ENTITIES: Number = Number::new("max-entities", 200);
pub const BLOCKED_ITEMS: SetSetting<String> = SetSetting::new("blocked-items");

pub const NAMES: [&str; 5] = [
    "pvp",
    "build",
    "greeting",
    "max-entities",
    "blocked-items",
];

/// Explicit values for one host, as written in the layout file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingValues {
    pub pvp: Option<bool>,
    pub build: Option<bool>,
    pub greeting: Option<String>,
    pub max_entities: Option<i64>,
    pub blocked_items: Option<AltSet<String>>,
}

impl SettingValues {
    /// Stores every present value on `host`, for `user` when given.
    pub fn apply(
        &self,
        hierarchy: &mut Hierarchy,
        host: HostId,
        user: Option<UserId>,
    ) -> HierarchyResult<()> {
        if let Some(value) = self.pvp {
            store(hierarchy, host, &PVP, user, value)?;
        }
        if let Some(value) = self.build {
            store(hierarchy, host, &BUILD, user, value)?;
        }
        if let Some(value) = &self.greeting {
            store(hierarchy, host, &GREETING, user, value.clone())?;
        }
        if let Some(value) = self.max_entities {
            store(hierarchy, host, &MAX_ENTITIES, user, value)?;
        }
        if let Some(value) = &self.blocked_items {
            store(hierarchy, host, &BLOCKED_ITEMS, user, value.clone())?;
        }
        Ok(())
    }
}

fn store<S: Setting>(
    hierarchy: &mut Hierarchy,
    host: HostId,
    key: &S,
    user: Option<UserId>,
    value: S::Value,
) -> HierarchyResult<()> {
    match user {
        Some(user) => hierarchy.set_user_setting(host, key, user, value)?,
        None => hierarchy.set_setting(host, key, value)?,
    };
    Ok(())
}

/// Effective value of the named setting, rendered for display.
pub fn describe(
    hierarchy: &Hierarchy,
    setting: &str,
    user: Option<UserId>,
    location: &Location,
) -> Option<String> {
    let rendered = match setting {
        "pvp" => hierarchy.lookup(&PVP, user, location).to_string(),
        "build" => hierarchy.lookup(&BUILD, user, location).to_string(),
        "greeting" => format!("{:?}", hierarchy.lookup(&GREETING, user, location)),
        "max-entities" => hierarchy.lookup(&MAX_ENTITIES, user, location).to_string(),
        "blocked-items" => hierarchy.lookup(&BLOCKED_ITEMS, user, location).to_string(),
        _ => return None,
    };
    Some(rendered)
}

/// Redundancy check for the named setting; `None` for unknown settings.
pub fn identical_superior(
    hierarchy: &Hierarchy,
    host: HostId,
    setting: &str,
) -> Option<HierarchyResult<Option<HostId>>> {
    let result = match setting {
        "pvp" => hierarchy.find_identical_superior(host, &PVP),
        "build" => hierarchy.find_identical_superior(host, &BUILD),
        "greeting" => hierarchy.find_identical_superior(host, &GREETING),
        "max-entities" => hierarchy.find_identical_superior(host, &MAX_ENTITIES),
        "blocked-items" => hierarchy.find_identical_superior(host, &BLOCKED_ITEMS),
        _ => return None,
    };
    Some(result)
}
