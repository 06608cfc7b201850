//! Read-only queries: host chains, lookups, superiors and redundancy.

use std::cmp::Ordering;

use hashbrown::HashSet;
use tracing::{error, warn};
use zone_volume::BlockPos;

use crate::{
    ChainLink, Domain, Hierarchy, HierarchyError, HierarchyResult, HostChain, HostId, Location,
    Setting, UserId, Zone, ZoneId,
};

/// Higher priority first, then by name.
fn by_precedence(a: &Zone, b: &Zone) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name))
}

impl Hierarchy {
    /// Effective value of `key` at `location` for `user`.
    pub fn lookup<S: Setting>(&self, key: &S, user: Option<UserId>, location: &Location) -> S::Value {
        let chain = self.host_chain(key, location);
        key.extract(&chain, user, location)
    }

    /// Effective value of `key` at `location` for nobody in particular.
    pub fn lookup_anonymous<S: Setting>(&self, key: &S, location: &Location) -> S::Value {
        self.lookup(key, None, location)
    }

    /// Hosts that explicitly set `key` and apply at `location`, most
    /// specific first.
    ///
    /// Zones containing the block come first by descending priority, then
    /// the ancestors of those zones nearest first, then the world, then the
    /// universe. Each host appears at most once.
    pub fn host_chain<S: Setting>(&self, key: &S, location: &Location) -> HostChain<'_> {
        let mut links = Vec::new();

        match self.domains.get(&location.domain) {
            Some(domain) => {
                let containing = self.zones_containing(domain, location.pos);
                let mut seen: HashSet<ZoneId> = containing.iter().map(|zone| zone.id).collect();
                let mut ancestors = Vec::new();
                for zone in &containing {
                    for ancestor in self.ancestors(zone.id) {
                        // Already walked from an earlier zone.
                        if !seen.insert(ancestor) {
                            break;
                        }
                        ancestors.extend(self.zones.get(&ancestor));
                    }
                }

                for zone in containing.into_iter().chain(ancestors) {
                    if zone.settings.is_set(key) {
                        links.push(ChainLink {
                            host: HostId::Zone(zone.id),
                            priority: Some(zone.priority),
                            settings: &zone.settings,
                        });
                    }
                }
                if domain.settings.is_set(key) {
                    links.push(ChainLink {
                        host: HostId::Domain(domain.id),
                        priority: None,
                        settings: &domain.settings,
                    });
                }
            }
            None => warn!(world = location.domain.0, setting = key.name(), "lookup in unknown world"),
        }

        if self.universe.is_set(key) {
            links.push(ChainLink {
                host: HostId::Universe,
                priority: None,
                settings: &self.universe,
            });
        }
        HostChain::from_links(links)
    }

    /// Zones whose volumes contain `location`, highest priority first.
    #[must_use]
    pub fn zones_at(&self, location: &Location) -> Vec<ZoneId> {
        self.domains
            .get(&location.domain)
            .map(|domain| {
                self.zones_containing(domain, location.pos)
                    .into_iter()
                    .map(Zone::id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn zones_containing(&self, domain: &Domain, pos: BlockPos) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = domain
            .tree
            .containing(pos)
            .into_iter()
            .filter_map(|id| {
                let zone = self.zones.get(&id);
                if zone.is_none() {
                    error!(zone = id.0, world = %domain.name, "index returned an unloaded zone");
                }
                zone
            })
            .collect();
        zones.sort_by(|a, b| by_precedence(a, b));
        zones
    }

    /// Hosts that structurally outrank `host`.
    ///
    /// For a zone: the worlds of its volumes, every other zone wholly
    /// containing all of its volumes (circumscribed approximation) with
    /// their ancestors, its own ancestors, and the universe. For a world:
    /// the universe. For the universe: nothing.
    pub fn superiors(&self, host: HostId) -> HierarchyResult<HashSet<HostId>> {
        let mut superiors = HashSet::new();
        match host {
            HostId::Universe => {}
            HostId::Domain(id) => {
                if !self.domains.contains_key(&id) {
                    return Err(HierarchyError::UnknownDomain(id));
                }
                superiors.insert(HostId::Universe);
            }
            HostId::Zone(id) => {
                let zone = self.zones.get(&id).ok_or(HierarchyError::UnknownZone(id))?;
                superiors.insert(HostId::Universe);

                let mut holders: Option<HashSet<ZoneId>> = None;
                for placed in &zone.volumes {
                    superiors.insert(HostId::Domain(placed.domain));
                    let around = self
                        .domains
                        .get(&placed.domain)
                        .map(|domain| domain.tree.containing_volume(&placed.volume, true))
                        .unwrap_or_default();
                    holders = Some(match holders {
                        None => around,
                        Some(previous) => previous.intersection(&around).copied().collect(),
                    });
                }

                for holder in holders.unwrap_or_default() {
                    superiors.insert(HostId::Zone(holder));
                    superiors.extend(self.ancestors(holder).map(HostId::Zone));
                }
                superiors.extend(self.ancestors(id).map(HostId::Zone));
                superiors.remove(&host);
            }
        }
        Ok(superiors)
    }

    /// The superior whose explicit value of `key` makes `host`'s own general
    /// value redundant.
    ///
    /// Superiors are scanned zones first by descending priority, then worlds,
    /// then the universe. Zones not outranking `host` by priority are
    /// skipped. The first superior setting `key` decides: equal value
    /// returns it, a different value returns `None`. When no superior sets
    /// `key`, a value equal to the default returns `host` itself.
    ///
    /// Returns `None` when `host` has no general value for `key`.
    pub fn find_identical_superior<S: Setting>(
        &self,
        host: HostId,
        key: &S,
    ) -> HierarchyResult<Option<HostId>> {
        let Some(own) = self.checked_settings(host)?.get(key) else {
            return Ok(None);
        };
        let own_priority = self.host_priority(host);

        let mut superiors: Vec<HostId> = self.superiors(host)?.into_iter().collect();
        superiors.sort_by(|&a, &b| self.compare_hosts(a, b));

        for superior in superiors {
            if let (Some(mine), Some(theirs)) = (own_priority, self.host_priority(superior)) {
                if theirs <= mine {
                    continue;
                }
            }
            let Some(value) = self.host_settings(superior).and_then(|settings| settings.get(key))
            else {
                continue;
            };
            return Ok((value == own).then_some(superior));
        }

        Ok((*own == key.default_value()).then_some(host))
    }

    /// Zones by precedence, then worlds by name, then the universe.
    fn compare_hosts(&self, a: HostId, b: HostId) -> Ordering {
        const fn rank(host: HostId) -> u8 {
            match host {
                HostId::Zone(_) => 0,
                HostId::Domain(_) => 1,
                HostId::Universe => 2,
            }
        }

        match (a, b) {
            (HostId::Zone(a), HostId::Zone(b)) => match (self.zones.get(&a), self.zones.get(&b)) {
                (Some(a), Some(b)) => by_precedence(a, b),
                _ => a.cmp(&b),
            },
            (HostId::Domain(a), HostId::Domain(b)) => {
                match (self.domains.get(&a), self.domains.get(&b)) {
                    (Some(a), Some(b)) => a.name.cmp(&b.name),
                    _ => a.cmp(&b),
                }
            }
            _ => rank(a).cmp(&rank(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use zone_volume::Volume;

    use super::*;
    use crate::{DomainId, Flag, ZoneSpec};

    const PVP: Flag = Flag::new("pvp", true);

    fn cube(min: i32, size: i32) -> Volume {
        Volume::cuboid(
            BlockPos::new(min, min, min),
            BlockPos::new(min + size, min + size, min + size),
        )
        .unwrap()
    }

    fn setup() -> (Hierarchy, DomainId) {
        let mut hierarchy = Hierarchy::default();
        let world = hierarchy.create_domain("world").unwrap();
        (hierarchy, world)
    }

    #[test]
    fn test_chain_skips_hosts_without_setting() {
        let (mut hierarchy, w) = setup();
        let outer = hierarchy.add_zone(ZoneSpec::new("outer").priority(1).volume(w, cube(0, 20))).unwrap();
        let inner = hierarchy.add_zone(ZoneSpec::new("inner").priority(2).volume(w, cube(5, 5))).unwrap();
        hierarchy.set_setting(HostId::Zone(outer), &PVP, false).unwrap();
        hierarchy.set_setting(HostId::Universe, &PVP, true).unwrap();

        let location = Location::new(w, BlockPos::new(6, 6, 6));
        let chain = hierarchy.host_chain(&PVP, &location);
        assert_eq!(chain.hosts(), vec![HostId::Zone(outer), HostId::Universe]);
        assert_eq!(hierarchy.zones_at(&location), vec![inner, outer]);
        assert!(!hierarchy.lookup_anonymous(&PVP, &location));
    }

    #[test]
    fn test_chain_includes_ancestors_once() {
        let (mut hierarchy, w) = setup();
        let town = hierarchy.add_zone(ZoneSpec::new("town").volume(w, cube(1000, 10))).unwrap();
        let a = hierarchy
            .add_zone(ZoneSpec::new("a").priority(3).parent(town).volume(w, cube(0, 10)))
            .unwrap();
        let b = hierarchy
            .add_zone(ZoneSpec::new("b").priority(4).parent(town).volume(w, cube(2, 4)))
            .unwrap();
        for zone in [town, a, b] {
            hierarchy.set_setting(HostId::Zone(zone), &PVP, false).unwrap();
        }
        hierarchy.set_setting(HostId::Domain(w), &PVP, true).unwrap();

        let chain = hierarchy.host_chain(&PVP, &Location::new(w, BlockPos::new(3, 3, 3)));
        assert_eq!(
            chain.hosts(),
            vec![HostId::Zone(b), HostId::Zone(a), HostId::Zone(town), HostId::Domain(w)]
        );
    }

    #[test]
    fn test_unknown_world_uses_universe_only() {
        let (mut hierarchy, _) = setup();
        hierarchy.set_setting(HostId::Universe, &PVP, false).unwrap();
        let nowhere = Location::new(DomainId(99), BlockPos::new(0, 0, 0));
        assert_eq!(hierarchy.host_chain(&PVP, &nowhere).hosts(), vec![HostId::Universe]);
        assert!(!hierarchy.lookup_anonymous(&PVP, &nowhere));
    }

    #[test]
    fn test_superiors() {
        let (mut hierarchy, w) = setup();
        let region = hierarchy.add_zone(ZoneSpec::new("region").volume(w, cube(-500, 1000))).unwrap();
        let outer = hierarchy
            .add_zone(ZoneSpec::new("outer").priority(1).parent(region).volume(w, cube(0, 20)))
            .unwrap();
        let inner = hierarchy.add_zone(ZoneSpec::new("inner").priority(2).volume(w, cube(5, 5))).unwrap();
        let elsewhere = hierarchy.add_zone(ZoneSpec::new("elsewhere").volume(w, cube(5000, 5))).unwrap();

        let superiors = hierarchy.superiors(HostId::Zone(inner)).unwrap();
        let expected: HashSet<HostId> = [
            HostId::Universe,
            HostId::Domain(w),
            HostId::Zone(outer),
            HostId::Zone(region),
        ]
        .into_iter()
        .collect();
        assert_eq!(superiors, expected);
        assert!(!superiors.contains(&HostId::Zone(elsewhere)));

        assert_eq!(
            hierarchy.superiors(HostId::Domain(w)).unwrap(),
            [HostId::Universe].into_iter().collect::<HashSet<_>>()
        );
        assert!(hierarchy.superiors(HostId::Universe).unwrap().is_empty());
        assert!(hierarchy.superiors(HostId::Zone(ZoneId(77))).is_err());
    }

    #[test]
    fn test_identical_superior_skips_lower_priority_zones() {
        let (mut hierarchy, w) = setup();
        let big = hierarchy.add_zone(ZoneSpec::new("big").priority(0).volume(w, cube(0, 50))).unwrap();
        let small = hierarchy.add_zone(ZoneSpec::new("small").priority(1).volume(w, cube(10, 5))).unwrap();
        hierarchy.set_setting(HostId::Zone(big), &PVP, true).unwrap();
        hierarchy.set_setting(HostId::Zone(small), &PVP, false).unwrap();
        hierarchy.set_setting(HostId::Domain(w), &PVP, false).unwrap();

        // `big` contains `small` but has lower priority, so the world decides.
        assert_eq!(
            hierarchy.find_identical_superior(HostId::Zone(small), &PVP).unwrap(),
            Some(HostId::Domain(w))
        );
        assert_eq!(hierarchy.find_identical_superior(HostId::Zone(big), &PVP).unwrap(), None);
    }

    #[test]
    fn test_identical_superior_without_own_value() {
        let (hierarchy, w) = setup();
        assert_eq!(hierarchy.find_identical_superior(HostId::Domain(w), &PVP).unwrap(), None);
    }
}
