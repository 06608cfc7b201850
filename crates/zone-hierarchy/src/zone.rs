//! Zone and world hosts.

use zone_tree::{VolumeId, VolumeTree};
use zone_volume::Volume;

use crate::{DomainId, Settings, ZoneId};

/// A volume registered in a world's index on behalf of a zone.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedVolume {
    pub id: VolumeId,
    pub domain: DomainId,
    pub volume: Volume,
}

/// A named, prioritized region made of one or more volumes.
#[derive(Debug)]
pub struct Zone {
    pub(crate) id: ZoneId,
    pub(crate) name: String,
    pub(crate) priority: u32,
    pub(crate) volumes: Vec<PlacedVolume>,
    pub(crate) parent: Option<ZoneId>,
    pub(crate) settings: Settings,
}

impl Zone {
    #[must_use]
    pub const fn id(&self) -> ZoneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Volumes in insertion order.
    #[must_use]
    pub fn volumes(&self) -> &[PlacedVolume] {
        &self.volumes
    }

    #[must_use]
    pub const fn parent(&self) -> Option<ZoneId> {
        self.parent
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Worlds this zone has volumes in, without duplicates.
    pub fn domains(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.volumes
            .iter()
            .enumerate()
            .filter(|&(i, placed)| self.volumes[..i].iter().all(|seen| seen.domain != placed.domain))
            .map(|(_, placed)| placed.domain)
    }
}

/// Description of a zone to add.
///
/// ```ignore
/// let spec = ZoneSpec::new("spawn")
///     .priority(10)
///     .volume(overworld, Volume::cuboid(min, max)?);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneSpec {
    pub name: String,
    pub priority: u32,
    pub parent: Option<ZoneId>,
    pub volumes: Vec<(DomainId, Volume)>,
}

impl ZoneSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn parent(mut self, parent: ZoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn volume(mut self, domain: DomainId, volume: Volume) -> Self {
        self.volumes.push((domain, volume));
        self
    }
}

/// A loaded world: its index of zone volumes and its own settings.
#[derive(Debug)]
pub struct Domain {
    pub(crate) id: DomainId,
    pub(crate) name: String,
    pub(crate) tree: VolumeTree<ZoneId>,
    pub(crate) settings: Settings,
}

impl Domain {
    pub(crate) fn new(id: DomainId, name: String) -> Self {
        let mut tree = VolumeTree::new();
        tree.construct();
        Self {
            id,
            name,
            tree,
            settings: Settings::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> DomainId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The world's spatial index.
    #[must_use]
    pub const fn tree(&self) -> &VolumeTree<ZoneId> {
        &self.tree
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }
}
