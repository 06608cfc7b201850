//! The host registry and its administrative mutations.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, error, info};
use zone_tree::VolumeId;
use zone_volume::Volume;

use crate::{
    Domain, DomainId, HierarchyConfig, HierarchyError, HierarchyResult, HostId, NullStore,
    PlacedVolume, Setting, Settings, UserId, Zone, ZoneId, ZoneSpec, ZoneStore,
};

/// Name of the universe host, after the reserved prefix.
const UNIVERSE_NAME: &str = "global";

/// Owns every host and the per-world indexes.
///
/// Not internally synchronized; wrap it in a
/// [`SharedHierarchy`](crate::SharedHierarchy) to share it between threads.
pub struct Hierarchy {
    pub(crate) config: HierarchyConfig,
    pub(crate) universe: Settings,
    pub(crate) domains: HashMap<DomainId, Domain>,
    domain_names: HashMap<String, DomainId>,
    pub(crate) zones: HashMap<ZoneId, Zone>,
    zone_names: HashMap<String, ZoneId>,
    next_domain: u32,
    next_zone: u32,
    next_volume: u32,
    store: Box<dyn ZoneStore>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new(HierarchyConfig::default())
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("config", &self.config)
            .field("domains", &self.domains.len())
            .field("zones", &self.zones.len())
            .finish_non_exhaustive()
    }
}

impl Hierarchy {
    /// Empty hierarchy that persists nothing.
    #[must_use]
    pub fn new(config: HierarchyConfig) -> Self {
        Self::with_store(config, NullStore)
    }

    #[must_use]
    pub fn with_store(config: HierarchyConfig, store: impl ZoneStore + 'static) -> Self {
        Self {
            config,
            universe: Settings::new(),
            domains: HashMap::new(),
            domain_names: HashMap::new(),
            zones: HashMap::new(),
            zone_names: HashMap::new(),
            next_domain: 0,
            next_zone: 0,
            next_volume: 0,
            store: Box::new(store),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    #[must_use]
    pub const fn universe_settings(&self) -> &Settings {
        &self.universe
    }

    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    #[must_use]
    pub fn domain(&self, id: DomainId) -> Option<&Domain> {
        self.domains.get(&id)
    }

    #[must_use]
    pub fn domain_by_name(&self, name: &str) -> Option<&Domain> {
        self.domain_names.get(name).and_then(|id| self.domains.get(id))
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    #[must_use]
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zone_names.get(name).and_then(|id| self.zones.get(id))
    }

    /// Resolves a host name: zones by their own name, worlds as
    /// `<prefix><world>`, the universe as `<prefix>global`.
    #[must_use]
    pub fn host_by_name(&self, name: &str) -> Option<HostId> {
        match name.strip_prefix(self.config.reserved_prefix) {
            Some(UNIVERSE_NAME) => Some(HostId::Universe),
            Some(world) => self.domain_names.get(world).copied().map(HostId::Domain),
            None => self.zone_names.get(name).copied().map(HostId::Zone),
        }
    }

    /// Inverse of [`host_by_name`](Self::host_by_name).
    #[must_use]
    pub fn host_name(&self, host: HostId) -> Option<String> {
        let prefix = self.config.reserved_prefix;
        match host {
            HostId::Universe => Some(format!("{prefix}{UNIVERSE_NAME}")),
            HostId::Domain(id) => self.domains.get(&id).map(|d| format!("{prefix}{}", d.name)),
            HostId::Zone(id) => self.zones.get(&id).map(|z| z.name.clone()),
        }
    }

    #[must_use]
    pub fn host_settings(&self, host: HostId) -> Option<&Settings> {
        match host {
            HostId::Universe => Some(&self.universe),
            HostId::Domain(id) => self.domains.get(&id).map(Domain::settings),
            HostId::Zone(id) => self.zones.get(&id).map(Zone::settings),
        }
    }

    /// Zone priority; worlds and the universe have none.
    #[must_use]
    pub fn host_priority(&self, host: HostId) -> Option<u32> {
        match host {
            HostId::Zone(id) => self.zones.get(&id).map(Zone::priority),
            HostId::Domain(_) | HostId::Universe => None,
        }
    }

    pub(crate) fn checked_settings(&self, host: HostId) -> HierarchyResult<&Settings> {
        self.host_settings(host).ok_or_else(|| unknown_host(host))
    }

    /// Parent, grandparent, ... of `zone`.
    pub fn ancestors(&self, zone: ZoneId) -> impl Iterator<Item = ZoneId> + '_ {
        let parent_of = move |id: &ZoneId| self.zones.get(id).and_then(Zone::parent);
        std::iter::successors(parent_of(&zone), parent_of)
    }

    // ========================================================================
    // Worlds
    // ========================================================================

    /// Registers a loaded world with an empty, constructed index.
    pub fn create_domain(&mut self, name: impl Into<String>) -> HierarchyResult<DomainId> {
        let name = name.into();
        if name.is_empty() || name == UNIVERSE_NAME || name.chars().any(char::is_whitespace) {
            return Err(HierarchyError::InvalidDomainName(name));
        }
        if self.domain_names.contains_key(&name) {
            return Err(HierarchyError::DuplicateDomain(name));
        }

        let id = DomainId(self.next_domain);
        self.next_domain += 1;
        info!(world = %name, id = id.0, "world registered");
        self.domain_names.insert(name.clone(), id);
        self.domains.insert(id, Domain::new(id, name));
        Ok(id)
    }

    /// Drops a world at unload. Zones with volumes in it must be unloaded
    /// first.
    pub fn remove_domain(&mut self, id: DomainId) -> HierarchyResult<Domain> {
        let domain = self.domains.get(&id).ok_or(HierarchyError::UnknownDomain(id))?;
        let zones: HashSet<ZoneId> = domain.tree.entries().map(|(_, _, zone)| zone).collect();
        if !zones.is_empty() {
            return Err(HierarchyError::DomainInUse {
                domain: id,
                zones: zones.len(),
            });
        }

        let domain = self.domains.remove(&id).ok_or(HierarchyError::UnknownDomain(id))?;
        self.domain_names.remove(&domain.name);
        info!(world = %domain.name, id = id.0, "world removed");
        Ok(domain)
    }

    // ========================================================================
    // Zones
    // ========================================================================

    /// Adds a zone and indexes all its volumes with one rebuild per world.
    ///
    /// If another intersecting zone already holds the requested priority,
    /// the new zone climbs to the lowest priority above it that is free.
    /// When no such priority exists the zone is not added.
    pub fn add_zone(&mut self, spec: ZoneSpec) -> HierarchyResult<ZoneId> {
        let ZoneSpec {
            name,
            priority,
            parent,
            volumes,
        } = spec;

        self.validate_zone_name(&name)?;
        if volumes.is_empty() {
            return Err(HierarchyError::NoVolumes(name));
        }
        if let Some(&(domain, _)) = volumes.iter().find(|(d, _)| !self.domains.contains_key(d)) {
            return Err(HierarchyError::UnknownDomain(domain));
        }
        if let Some(parent) = parent.filter(|p| !self.zones.contains_key(p)) {
            return Err(HierarchyError::UnknownParent(parent));
        }

        let id = ZoneId(self.next_zone);
        self.next_zone += 1;
        let placed: Vec<PlacedVolume> = volumes
            .into_iter()
            .map(|(domain, volume)| PlacedVolume {
                id: self.allocate_volume(),
                domain,
                volume,
            })
            .collect();

        self.index_volumes(id, &placed)?;
        info!(
            zone = %name,
            id = id.0,
            priority,
            volumes = placed.len(),
            "zone added"
        );
        self.zone_names.insert(name.clone(), id);
        self.zones.insert(
            id,
            Zone {
                id,
                name,
                priority,
                volumes: placed,
                parent,
                settings: Settings::new(),
            },
        );

        if let Err(err) = self.settle_priority(id, priority) {
            if let Err(rollback) = self.detach_zone(id, false) {
                error!(zone = id.0, %rollback, "failed to roll back zone after priority error");
            }
            return Err(err);
        }
        self.save(id);
        Ok(id)
    }

    /// Removes a zone for good and tells the store to destroy it.
    ///
    /// Children move up to the removed zone's parent.
    pub fn remove_zone(&mut self, id: ZoneId) -> HierarchyResult<Zone> {
        let zone = self.detach_zone(id, true)?;
        self.store.destroy(&zone);
        info!(zone = %zone.name, id = id.0, "zone removed");
        Ok(zone)
    }

    /// Removes a zone from memory without destroying it, e.g. when its world
    /// unloads.
    pub fn unload_zone(&mut self, id: ZoneId) -> HierarchyResult<Zone> {
        let zone = self.detach_zone(id, false)?;
        info!(zone = %zone.name, id = id.0, "zone unloaded");
        Ok(zone)
    }

    /// Adds a volume to an existing zone, rebuilding its world's index.
    pub fn add_volume(
        &mut self,
        zone: ZoneId,
        domain: DomainId,
        volume: Volume,
    ) -> HierarchyResult<VolumeId> {
        let priority = self
            .zones
            .get(&zone)
            .map(Zone::priority)
            .ok_or(HierarchyError::UnknownZone(zone))?;
        let id = self.allocate_volume();
        let world = self
            .domains
            .get_mut(&domain)
            .ok_or(HierarchyError::UnknownDomain(domain))?;
        world.tree.put(id, volume.clone(), zone, true);

        if let Some(owner) = self.zones.get_mut(&zone) {
            owner.volumes.push(PlacedVolume { id, domain, volume });
        }
        debug!(zone = zone.0, volume = id.0, world = domain.0, "volume added");

        self.fixup_priority(zone, priority)?;
        Ok(id)
    }

    /// Removes one volume of a zone, rebuilding its world's index.
    pub fn remove_volume(&mut self, zone: ZoneId, volume: VolumeId) -> HierarchyResult<Volume> {
        let owner = self.zones.get_mut(&zone).ok_or(HierarchyError::UnknownZone(zone))?;
        let index = owner
            .volumes
            .iter()
            .position(|placed| placed.id == volume)
            .ok_or(HierarchyError::UnknownVolume { zone, volume })?;
        if owner.volumes.len() == 1 {
            return Err(HierarchyError::LastVolume(zone));
        }
        let placed = owner.volumes.remove(index);
        let priority = owner.priority;

        let removed = self
            .domains
            .get_mut(&placed.domain)
            .and_then(|world| world.tree.remove(volume, true));
        match removed {
            Some((_, indexed_owner)) if indexed_owner == zone => {}
            _ => {
                return Err(HierarchyError::Inconsistent(format!(
                    "volume {} of zone {} was not indexed in world {}",
                    volume.0, zone.0, placed.domain.0
                )));
            }
        }
        debug!(zone = zone.0, volume = volume.0, world = placed.domain.0, "volume removed");

        self.fixup_priority(zone, priority)?;
        Ok(placed.volume)
    }

    /// Sets a zone's priority, bumping intersecting zones that hold the same
    /// priority.
    pub fn set_priority(&mut self, zone: ZoneId, priority: u32) -> HierarchyResult<()> {
        if !self.zones.contains_key(&zone) {
            return Err(HierarchyError::UnknownZone(zone));
        }
        self.fixup_priority(zone, priority)
    }

    /// Nests `zone` under `parent`, or makes it top level with `None`.
    pub fn set_parent(&mut self, zone: ZoneId, parent: Option<ZoneId>) -> HierarchyResult<()> {
        if !self.zones.contains_key(&zone) {
            return Err(HierarchyError::UnknownZone(zone));
        }
        if let Some(parent) = parent {
            if !self.zones.contains_key(&parent) {
                return Err(HierarchyError::UnknownParent(parent));
            }
            if parent == zone || self.ancestors(parent).any(|ancestor| ancestor == zone) {
                return Err(HierarchyError::ParentCycle { child: zone, parent });
            }
        }

        if let Some(child) = self.zones.get_mut(&zone) {
            child.parent = parent;
        }
        debug!(zone = zone.0, parent = ?parent, "parent changed");
        self.save(zone);
        Ok(())
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Stores the general value of `key` on `host`.
    pub fn set_setting<S: Setting>(
        &mut self,
        host: HostId,
        key: &S,
        value: S::Value,
    ) -> HierarchyResult<Option<S::Value>> {
        let previous = self.settings_mut(host)?.set(key, value)?;
        self.setting_changed(host, key.name());
        Ok(previous)
    }

    /// Stores a value of `key` for one user on `host`.
    pub fn set_user_setting<S: Setting>(
        &mut self,
        host: HostId,
        key: &S,
        user: UserId,
        value: S::Value,
    ) -> HierarchyResult<Option<S::Value>> {
        let previous = self.settings_mut(host)?.set_for_user(key, user, value)?;
        self.setting_changed(host, key.name());
        Ok(previous)
    }

    pub fn clear_setting<S: Setting>(
        &mut self,
        host: HostId,
        key: &S,
    ) -> HierarchyResult<Option<S::Value>> {
        let previous = self.settings_mut(host)?.clear(key)?;
        self.setting_changed(host, key.name());
        Ok(previous)
    }

    pub fn clear_user_setting<S: Setting>(
        &mut self,
        host: HostId,
        key: &S,
        user: UserId,
    ) -> HierarchyResult<Option<S::Value>> {
        let previous = self.settings_mut(host)?.clear_for_user(key, user)?;
        self.setting_changed(host, key.name());
        Ok(previous)
    }

    fn settings_mut(&mut self, host: HostId) -> HierarchyResult<&mut Settings> {
        match host {
            HostId::Universe => Ok(&mut self.universe),
            HostId::Domain(id) => self
                .domains
                .get_mut(&id)
                .map(|domain| &mut domain.settings)
                .ok_or(HierarchyError::UnknownDomain(id)),
            HostId::Zone(id) => self
                .zones
                .get_mut(&id)
                .map(|zone| &mut zone.settings)
                .ok_or(HierarchyError::UnknownZone(id)),
        }
    }

    fn setting_changed(&self, host: HostId, setting: &'static str) {
        debug!(%host, setting, "setting changed");
        if let HostId::Zone(id) = host {
            self.save(id);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn save(&self, zone: ZoneId) {
        if let Some(zone) = self.zones.get(&zone) {
            self.store.save(zone);
        }
    }

    fn allocate_volume(&mut self) -> VolumeId {
        let id = VolumeId(self.next_volume);
        self.next_volume += 1;
        id
    }

    fn validate_zone_name(&self, name: &str) -> HierarchyResult<()> {
        let reason = if name.is_empty() {
            Some("empty")
        } else if name.starts_with(self.config.reserved_prefix) {
            Some("starts with the reserved prefix")
        } else if name.chars().any(char::is_whitespace) {
            Some("contains whitespace")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(HierarchyError::InvalidZoneName {
                name: name.to_owned(),
                reason,
            });
        }
        if self.zone_names.contains_key(name) {
            return Err(HierarchyError::DuplicateZone(name.to_owned()));
        }
        Ok(())
    }

    /// Registers volumes in their worlds, constructing each touched world's
    /// index once.
    fn index_volumes(&mut self, zone: ZoneId, placed: &[PlacedVolume]) -> HierarchyResult<()> {
        let mut touched = HashSet::new();
        for volume in placed {
            let world = self
                .domains
                .get_mut(&volume.domain)
                .ok_or(HierarchyError::UnknownDomain(volume.domain))?;
            world.tree.put(volume.id, volume.volume.clone(), zone, false);
            touched.insert(volume.domain);
        }
        self.construct(&touched);
        Ok(())
    }

    /// Deregisters volumes, constructing each touched world's index once.
    fn unindex_volumes(&mut self, zone: ZoneId, placed: &[PlacedVolume]) -> HierarchyResult<()> {
        let mut touched = HashSet::new();
        let mut missing = Vec::new();
        for volume in placed {
            let removed = self
                .domains
                .get_mut(&volume.domain)
                .and_then(|world| world.tree.remove(volume.id, false));
            match removed {
                Some((_, owner)) if owner == zone => {
                    touched.insert(volume.domain);
                }
                _ => missing.push(volume.id.0),
            }
        }
        self.construct(&touched);

        if missing.is_empty() {
            Ok(())
        } else {
            Err(HierarchyError::Inconsistent(format!(
                "volumes {missing:?} of zone {} were not indexed",
                zone.0
            )))
        }
    }

    fn construct(&mut self, domains: &HashSet<DomainId>) {
        for id in domains {
            if let Some(world) = self.domains.get_mut(id) {
                world.tree.construct();
            }
        }
    }

    fn detach_zone(&mut self, id: ZoneId, persist_children: bool) -> HierarchyResult<Zone> {
        let zone = self.zones.remove(&id).ok_or(HierarchyError::UnknownZone(id))?;
        self.zone_names.remove(&zone.name);
        let unindexed = self.unindex_volumes(id, &zone.volumes);

        let children: Vec<ZoneId> = self
            .zones
            .values()
            .filter(|child| child.parent == Some(id))
            .map(Zone::id)
            .collect();
        for child in &children {
            if let Some(child) = self.zones.get_mut(child) {
                child.parent = zone.parent;
            }
            if persist_children {
                self.save(*child);
            }
        }

        unindexed.map(|()| zone)
    }
}

fn unknown_host(host: HostId) -> HierarchyError {
    match host {
        HostId::Zone(id) => HierarchyError::UnknownZone(id),
        HostId::Domain(id) => HierarchyError::UnknownDomain(id),
        HostId::Universe => HierarchyError::Inconsistent("universe has no settings".to_owned()),
    }
}
