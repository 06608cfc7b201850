//! Priority collision avoidance and structural checks.
//!
//! Zones whose volumes intersect must never share a priority, otherwise
//! their order in a host chain would be arbitrary. Intersection uses the
//! conservative circumscribed-box test of the world indexes, so zones that
//! merely come close may also be kept apart.
//!
//! ```text
//! set_priority(Z, P)
//!   Z.priority = P
//!   for each zone Y intersecting Z with Y.priority == P:
//!       set_priority(Y, P + 1)        // cascades
//! ```
//!
//! Every step strictly raises one zone's priority, so a cascade ends; the
//! configured depth cap turns a runaway cascade into an error instead.

use hashbrown::HashSet;
use tracing::{debug, error};

use crate::{Hierarchy, HierarchyError, HierarchyResult, Zone, ZoneId};

impl Hierarchy {
    /// Moves a freshly added zone to the lowest priority at or above
    /// `requested` that no intersecting zone holds. Existing zones keep
    /// their priorities.
    pub(crate) fn settle_priority(&mut self, zone: ZoneId, requested: u32) -> HierarchyResult<()> {
        let mut priority = requested;
        for _ in 0..=self.config.max_cascade_depth {
            if self.colliding(zone, priority).is_empty() {
                if let Some(settled) = self.zones.get_mut(&zone) {
                    settled.priority = priority;
                }
                if priority != requested {
                    debug!(zone = zone.0, requested, priority, "new zone moved above colliding zones");
                }
                return Ok(());
            }
            priority = priority
                .checked_add(1)
                .ok_or(HierarchyError::PriorityOverflow(zone))?;
        }

        error!(zone = zone.0, requested, "no free priority within the cascade limit");
        Err(HierarchyError::CascadeLimit {
            zone,
            depth: self.config.max_cascade_depth,
        })
    }

    /// Assigns `priority` to `zone` and bumps colliding zones, saving every
    /// zone the cascade touched even when it fails part way.
    pub(crate) fn fixup_priority(&mut self, zone: ZoneId, priority: u32) -> HierarchyResult<()> {
        let mut touched = Vec::new();
        let result = self.assign_priority(zone, priority, 0, &mut touched);
        if let Err(err) = &result {
            error!(zone = zone.0, priority, %err, "priority cascade aborted");
        }

        touched.sort_unstable();
        touched.dedup();
        for id in touched {
            self.save(id);
        }
        result
    }

    fn assign_priority(
        &mut self,
        zone: ZoneId,
        priority: u32,
        depth: usize,
        touched: &mut Vec<ZoneId>,
    ) -> HierarchyResult<()> {
        if depth > self.config.max_cascade_depth {
            return Err(HierarchyError::CascadeLimit { zone, depth });
        }
        let current = self
            .zones
            .get_mut(&zone)
            .ok_or(HierarchyError::UnknownZone(zone))?;
        current.priority = priority;
        touched.push(zone);

        for other in self.colliding(zone, priority) {
            // An earlier bump in this loop may already have moved it.
            if self.zones.get(&other).is_some_and(|z| z.priority == priority) {
                let bumped = priority
                    .checked_add(1)
                    .ok_or(HierarchyError::PriorityOverflow(other))?;
                debug!(zone = other.0, from = priority, to = bumped, cause = zone.0, "priority bumped");
                self.assign_priority(other, bumped, depth + 1, touched)?;
            }
        }
        Ok(())
    }

    /// Other zones intersecting `zone` that hold `priority`, ordered by name.
    pub(crate) fn colliding(&self, zone: ZoneId, priority: u32) -> Vec<ZoneId> {
        let Some(current) = self.zones.get(&zone) else {
            return Vec::new();
        };

        let mut intersecting = HashSet::new();
        for domain in current.domains() {
            if let Some(world) = self.domains.get(&domain) {
                let volumes = current
                    .volumes
                    .iter()
                    .filter(|placed| placed.domain == domain)
                    .map(|placed| &placed.volume);
                intersecting.extend(world.tree.intersecting_any(volumes));
            }
        }

        let mut colliding: Vec<&Zone> = intersecting
            .iter()
            .filter(|&&id| id != zone)
            .filter_map(|id| self.zones.get(id))
            .filter(|other| other.priority == priority)
            .collect();
        colliding.sort_by(|a, b| a.name.cmp(&b.name));
        colliding.into_iter().map(Zone::id).collect()
    }

    /// Checks the structural invariants and reports the first violation.
    ///
    /// Every zone volume must be indexed in its world under that zone, every
    /// indexed volume must belong to a loaded zone, parents must exist
    /// without cycles, indexes must be current, and intersecting zones must
    /// have distinct priorities.
    pub fn verify(&self) -> HierarchyResult<()> {
        for zone in self.zones.values() {
            if zone.volumes.is_empty() {
                return Err(inconsistent(format!("zone {} has no volumes", zone.name)));
            }
            if let Some(parent) = zone.parent {
                if !self.zones.contains_key(&parent) {
                    return Err(inconsistent(format!(
                        "zone {} has unloaded parent {}",
                        zone.name, parent.0
                    )));
                }
                if self
                    .ancestors(zone.id)
                    .take(self.zones.len())
                    .any(|ancestor| ancestor == zone.id)
                {
                    return Err(HierarchyError::ParentCycle {
                        child: zone.id,
                        parent,
                    });
                }
            }
            for placed in &zone.volumes {
                let world = self
                    .domains
                    .get(&placed.domain)
                    .ok_or(HierarchyError::UnknownDomain(placed.domain))?;
                match world.tree.get(placed.id) {
                    Some((_, owner)) if owner == zone.id => {}
                    _ => {
                        return Err(inconsistent(format!(
                            "volume {} of zone {} is not indexed in world {}",
                            placed.id.0, zone.name, world.name
                        )));
                    }
                }
            }
            if let Some(&other) = self.colliding(zone.id, zone.priority).first() {
                return Err(HierarchyError::PriorityCollision(zone.id, other, zone.priority));
            }
        }

        for world in self.domains.values() {
            if world.tree.is_stale() {
                return Err(inconsistent(format!("index of world {} is stale", world.name)));
            }
            for (volume, _, owner) in world.tree.entries() {
                let owned = self
                    .zones
                    .get(&owner)
                    .is_some_and(|zone| zone.volumes.iter().any(|placed| placed.id == volume));
                if !owned {
                    return Err(inconsistent(format!(
                        "world {} indexes volume {} for zone {} which does not own it",
                        world.name, volume.0, owner.0
                    )));
                }
            }
        }
        Ok(())
    }
}

fn inconsistent(message: String) -> HierarchyError {
    HierarchyError::Inconsistent(message)
}

#[cfg(test)]
mod tests {
    use zone_volume::{BlockPos, Volume};

    use crate::{DomainId, Hierarchy, HierarchyConfig, HierarchyError, ZoneSpec};

    fn cube(min: i32, size: i32) -> Volume {
        Volume::cuboid(
            BlockPos::new(min, min, min),
            BlockPos::new(min + size, min + size, min + size),
        )
        .unwrap()
    }

    fn world(hierarchy: &mut Hierarchy) -> DomainId {
        hierarchy.create_domain("world").unwrap()
    }

    #[test]
    fn test_new_zone_climbs_above_colliding() {
        let mut hierarchy = Hierarchy::default();
        let w = world(&mut hierarchy);
        let a = hierarchy.add_zone(ZoneSpec::new("a").priority(5).volume(w, cube(0, 10))).unwrap();
        let b = hierarchy.add_zone(ZoneSpec::new("b").priority(6).volume(w, cube(2, 5))).unwrap();
        let c = hierarchy.add_zone(ZoneSpec::new("c").priority(5).volume(w, cube(3, 2))).unwrap();

        assert_eq!(hierarchy.zone(a).unwrap().priority(), 5);
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 6);
        assert_eq!(hierarchy.zone(c).unwrap().priority(), 7);
        hierarchy.verify().unwrap();
    }

    #[test]
    fn test_set_priority_cascades() {
        let mut hierarchy = Hierarchy::default();
        let w = world(&mut hierarchy);
        let a = hierarchy.add_zone(ZoneSpec::new("a").priority(1).volume(w, cube(0, 10))).unwrap();
        let b = hierarchy.add_zone(ZoneSpec::new("b").priority(2).volume(w, cube(2, 5))).unwrap();
        let c = hierarchy.add_zone(ZoneSpec::new("c").priority(3).volume(w, cube(3, 2))).unwrap();

        hierarchy.set_priority(a, 2).unwrap();
        assert_eq!(hierarchy.zone(a).unwrap().priority(), 2);
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 3);
        assert_eq!(hierarchy.zone(c).unwrap().priority(), 4);
        hierarchy.verify().unwrap();
    }

    #[test]
    fn test_disjoint_zones_may_share_priority() {
        let mut hierarchy = Hierarchy::default();
        let w = world(&mut hierarchy);
        let a = hierarchy.add_zone(ZoneSpec::new("a").priority(3).volume(w, cube(0, 4))).unwrap();
        let b = hierarchy.add_zone(ZoneSpec::new("b").priority(3).volume(w, cube(100, 4))).unwrap();
        assert_eq!(hierarchy.zone(a).unwrap().priority(), 3);
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 3);
        hierarchy.set_priority(a, 3).unwrap();
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 3);
    }

    #[test]
    fn test_cascade_limit() {
        let config = HierarchyConfig {
            max_cascade_depth: 2,
            ..HierarchyConfig::default()
        };
        let mut hierarchy = Hierarchy::new(config);
        let w = world(&mut hierarchy);
        let zones: Vec<_> = (0u32..5)
            .map(|i| {
                hierarchy
                    .add_zone(ZoneSpec::new(format!("z{i}")).priority(10 + i).volume(w, cube(0, 8)))
                    .unwrap()
            })
            .collect();

        let err = hierarchy.set_priority(zones[0], 11).unwrap_err();
        assert!(matches!(err, HierarchyError::CascadeLimit { .. }), "{err}");
    }

    #[test]
    fn test_priority_overflow() {
        let mut hierarchy = Hierarchy::default();
        let w = world(&mut hierarchy);
        hierarchy
            .add_zone(ZoneSpec::new("top").priority(u32::MAX).volume(w, cube(0, 4)))
            .unwrap();
        let err = hierarchy
            .add_zone(ZoneSpec::new("other").priority(u32::MAX).volume(w, cube(1, 2)))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::PriorityOverflow(_)), "{err}");
        assert!(hierarchy.zone_by_name("other").is_none());
        hierarchy.verify().unwrap();
    }

    #[test]
    fn test_added_volume_reruns_avoidance() {
        let mut hierarchy = Hierarchy::default();
        let w = world(&mut hierarchy);
        let a = hierarchy.add_zone(ZoneSpec::new("a").priority(4).volume(w, cube(0, 4))).unwrap();
        let b = hierarchy.add_zone(ZoneSpec::new("b").priority(4).volume(w, cube(50, 4))).unwrap();

        hierarchy.add_volume(a, w, cube(51, 2)).unwrap();
        assert_eq!(hierarchy.zone(a).unwrap().priority(), 4);
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 5);
        hierarchy.verify().unwrap();
    }

    #[test]
    fn test_collisions_checked_per_world() {
        let mut hierarchy = Hierarchy::default();
        let w1 = world(&mut hierarchy);
        let w2 = hierarchy.create_domain("nether").unwrap();
        let a = hierarchy
            .add_zone(
                ZoneSpec::new("a")
                    .priority(4)
                    .volume(w1, cube(0, 4))
                    .volume(w1, cube(20, 4))
                    .volume(w2, cube(100, 4)),
            )
            .unwrap();
        // Same coordinates as a's nether volume, other world.
        let c = hierarchy.add_zone(ZoneSpec::new("c").priority(4).volume(w1, cube(100, 4))).unwrap();
        let b = hierarchy.add_zone(ZoneSpec::new("b").priority(4).volume(w2, cube(101, 2))).unwrap();
        let d = hierarchy.add_zone(ZoneSpec::new("d").priority(4).volume(w1, cube(21, 2))).unwrap();

        assert_eq!(hierarchy.zone(a).unwrap().priority(), 4);
        assert_eq!(hierarchy.zone(c).unwrap().priority(), 4);
        assert_eq!(hierarchy.zone(b).unwrap().priority(), 5);
        assert_eq!(hierarchy.zone(d).unwrap().priority(), 5);
        assert_eq!(hierarchy.colliding(a, 5), vec![b, d]);
        hierarchy.verify().unwrap();
    }
}
