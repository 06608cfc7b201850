//! Setting keys and value extraction.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use zone_altset::AltSet;

use crate::{HostChain, Location, UserId};

/// A typed setting key.
///
/// The hierarchy only builds the [`HostChain`]; the key decides how the
/// explicit values along it merge into the effective value.
pub trait Setting: Send + Sync + 'static {
    type Value: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Storage name. Must be unique per value type.
    fn name(&self) -> &'static str;

    /// Value when no host configures the setting.
    fn default_value(&self) -> Self::Value;

    /// Merges the chain into the effective value.
    ///
    /// Defaults to "most specific explicit value wins", where a host's value
    /// for `user` beats that host's general value.
    fn extract(&self, chain: &HostChain<'_>, user: Option<UserId>, _location: &Location) -> Self::Value {
        chain
            .most_specific(self, user)
            .cloned()
            .unwrap_or_else(|| self.default_value())
    }
}

/// On/off setting, e.g. `pvp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flag {
    name: &'static str,
    default: bool,
}

impl Flag {
    #[must_use]
    pub const fn new(name: &'static str, default: bool) -> Self {
        Self { name, default }
    }
}

impl Setting for Flag {
    type Value = bool;

    fn name(&self) -> &'static str {
        self.name
    }

    fn default_value(&self) -> bool {
        self.default
    }
}

/// Free text setting, e.g. a greeting message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Text {
    name: &'static str,
    default: &'static str,
}

impl Text {
    #[must_use]
    pub const fn new(name: &'static str, default: &'static str) -> Self {
        Self { name, default }
    }
}

impl Setting for Text {
    type Value = String;

    fn name(&self) -> &'static str {
        self.name
    }

    fn default_value(&self) -> String {
        self.default.to_owned()
    }
}

/// Integer setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Number {
    name: &'static str,
    default: i64,
}

impl Number {
    #[must_use]
    pub const fn new(name: &'static str, default: i64) -> Self {
        Self { name, default }
    }
}

impl Setting for Number {
    type Value = i64;

    fn name(&self) -> &'static str {
        self.name
    }

    fn default_value(&self) -> i64 {
        self.default
    }
}

/// Multi-value setting whose effective value is the union of every host's
/// explicit set, accumulated from the least specific host up.
pub struct SetSetting<T> {
    name: &'static str,
    marker: PhantomData<fn() -> T>,
}

impl<T> SetSetting<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            marker: PhantomData,
        }
    }
}

impl<T> Clone for SetSetting<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SetSetting<T> {}

impl<T> fmt::Debug for SetSetting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SetSetting").field(&self.name).finish()
    }
}

impl<T> Setting for SetSetting<T>
where
    T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    type Value = AltSet<T>;

    fn name(&self) -> &'static str {
        self.name
    }

    fn default_value(&self) -> AltSet<T> {
        AltSet::new()
    }

    fn extract(&self, chain: &HostChain<'_>, user: Option<UserId>, _location: &Location) -> AltSet<T> {
        chain
            .iter()
            .rev()
            .filter_map(|link| link.settings.resolve(self, user))
            .fold(self.default_value(), |acc, set| acc.union(set))
    }
}

#[cfg(test)]
mod tests {
    use zone_volume::BlockPos;

    use super::*;
    use crate::{ChainLink, DomainId, HostId, Settings, ZoneId};

    fn location() -> Location {
        Location::new(DomainId(0), BlockPos::new(0, 0, 0))
    }

    fn chain<'a>(hosts: &[(HostId, &'a Settings)]) -> HostChain<'a> {
        HostChain::from_links(
            hosts
                .iter()
                .map(|&(host, settings)| ChainLink {
                    host,
                    priority: None,
                    settings,
                })
                .collect(),
        )
    }

    #[test]
    fn test_most_specific_wins() {
        let key = Number::new("max-entities", 100);
        let mut zone = Settings::new();
        let mut world = Settings::new();
        zone.set(&key, 5).unwrap();
        world.set(&key, 50).unwrap();

        let chain = chain(&[(HostId::Zone(ZoneId(0)), &zone), (HostId::Domain(DomainId(0)), &world)]);
        assert_eq!(key.extract(&chain, None, &location()), 5);
        assert_eq!(key.extract(&HostChain::default(), None, &location()), 100);
    }

    #[test]
    fn test_user_value_on_less_specific_host_loses() {
        let key = Flag::new("build", true);
        let user = UserId(9);
        let mut zone = Settings::new();
        let mut world = Settings::new();
        zone.set(&key, false).unwrap();
        world.set_for_user(&key, user, true).unwrap();

        let chain = chain(&[(HostId::Zone(ZoneId(0)), &zone), (HostId::Domain(DomainId(0)), &world)]);
        assert!(!key.extract(&chain, Some(user), &location()));
    }

    #[test]
    fn test_set_setting_accumulates() {
        let key = SetSetting::<String>::new("blocked-items");
        let mut zone = Settings::new();
        let mut universe = Settings::new();
        zone.set(&key, ["tnt".to_owned()].into_iter().collect()).unwrap();
        universe.set(&key, ["bedrock".to_owned()].into_iter().collect()).unwrap();

        let chain = chain(&[(HostId::Zone(ZoneId(0)), &zone), (HostId::Universe, &universe)]);
        let value = key.extract(&chain, None, &location());
        assert!(value.contains(&"tnt".to_owned()));
        assert!(value.contains(&"bedrock".to_owned()));
        assert!(!value.contains(&"dirt".to_owned()));
    }

    #[test]
    fn test_text_default() {
        let key = Text::new("greeting", "hello");
        assert_eq!(key.default_value(), "hello");
        assert_eq!(key.name(), "greeting");
    }
}
