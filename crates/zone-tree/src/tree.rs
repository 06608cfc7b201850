//! The volume tree: a registry of `(volume, zone)` pairs plus a published,
//! immutable query snapshot.

use std::hash::Hash;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use zone_volume::{BlockBox, BlockPos, Volume};

use crate::node::{Candidates, Node, TreeStats};
use crate::split::Split;

/// Handle identifying one registered volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(pub u32);

#[derive(Debug)]
struct Entry<Z> {
    id: VolumeId,
    volume: Volume,
    zone: Z,
}

/// An immutable, fully built index.
///
/// Snapshots are shared through `Arc`; a rebuild produces a new snapshot and
/// swaps the reference, so readers never observe a half-built tree.
#[derive(Debug)]
pub struct TreeSnapshot<Z> {
    entries: Vec<Entry<Z>>,
    bounds: Vec<BlockBox>,
    root: Node,
    stats: TreeStats,
}

impl<Z: Copy + Eq + Hash> TreeSnapshot<Z> {
    fn build(mut entries: Vec<Entry<Z>>) -> Self {
        // Deterministic input order keeps rebuilds reproducible.
        entries.sort_unstable_by_key(|entry| entry.id);
        let bounds: Vec<BlockBox> = entries.iter().map(|e| e.volume.circumscribed()).collect();

        let mut stats = TreeStats {
            entries: entries.len(),
            ..TreeStats::default()
        };
        let subset: Candidates = (0..entries.len() as u32).collect();
        let root = Node::build(&bounds, subset, Split::FIRST, 0, 0, &mut stats);

        Self {
            entries,
            bounds,
            root,
            stats,
        }
    }

    /// Zones with a volume that exactly contains `pos`.
    #[must_use]
    pub fn containing(&self, pos: BlockPos) -> HashSet<Z> {
        let mut zones = HashSet::new();
        self.root.for_each_at(pos, &mut |candidates| {
            for &i in candidates {
                let i = i as usize;
                if self.bounds[i].contains(pos) && self.entries[i].volume.contains_block(pos) {
                    zones.insert(self.entries[i].zone);
                }
            }
        });
        zones
    }

    /// Zones whose approximate box holds every corner of `volume`'s
    /// approximate box.
    ///
    /// With `discriminating` both sides use circumscribed boxes, otherwise
    /// inscribed boxes. A volume without an inscribed box matches nothing.
    #[must_use]
    pub fn containing_volume(&self, volume: &Volume, discriminating: bool) -> HashSet<Z> {
        let mut zones = HashSet::new();
        let Some(query) = approximation(volume, discriminating) else {
            return zones;
        };
        // Any box containing the query contains its min corner, and routing
        // is conservative for circumscribed boxes, so one path suffices.
        self.root.for_each_at(query.min, &mut |candidates| {
            for &i in candidates {
                let entry = &self.entries[i as usize];
                if approximation(&entry.volume, discriminating)
                    .is_some_and(|outer| outer.contains_box(&query))
                {
                    zones.insert(entry.zone);
                }
            }
        });
        zones
    }

    /// Zones with a volume whose circumscribed box overlaps the
    /// circumscribed box of `volume`.
    ///
    /// Conservative: may report zones that share no block with `volume`,
    /// never misses one that does.
    #[must_use]
    pub fn intersecting(&self, volume: &Volume) -> HashSet<Z> {
        let mut zones = HashSet::new();
        self.collect_intersecting(&volume.circumscribed(), &mut zones);
        zones
    }

    /// Union of [`intersecting`](Self::intersecting) over several volumes.
    #[must_use]
    pub fn intersecting_any<'a>(&self, volumes: impl IntoIterator<Item = &'a Volume>) -> HashSet<Z> {
        let mut zones = HashSet::new();
        for volume in volumes {
            self.collect_intersecting(&volume.circumscribed(), &mut zones);
        }
        zones
    }

    fn collect_intersecting(&self, query: &BlockBox, zones: &mut HashSet<Z>) {
        self.root.for_each_in(query, &mut |candidates| {
            for &i in candidates {
                let i = i as usize;
                if self.bounds[i].overlaps(query) {
                    zones.insert(self.entries[i].zone);
                }
            }
        });
    }

    #[must_use]
    pub const fn stats(&self) -> TreeStats {
        self.stats
    }
}

fn approximation(volume: &Volume, discriminating: bool) -> Option<BlockBox> {
    if discriminating {
        Some(volume.circumscribed())
    } else {
        volume.inscribed()
    }
}

/// Spatial index answering "which zones contain this block".
///
/// Mutations only touch the registry. Queries run against the snapshot
/// published by the last [`construct`](Self::construct); querying before the
/// first construction is a programming error and panics.
#[derive(Debug)]
pub struct VolumeTree<Z> {
    registry: HashMap<VolumeId, (Volume, Z)>,
    snapshot: Option<Arc<TreeSnapshot<Z>>>,
    stale: bool,
}

impl<Z> Default for VolumeTree<Z> {
    fn default() -> Self {
        Self {
            registry: HashMap::new(),
            snapshot: None,
            stale: true,
        }
    }
}

impl<Z: Copy + Eq + Hash> VolumeTree<Z> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a volume.
    ///
    /// With `rebuild_now == false` the caller must call
    /// [`construct`](Self::construct) once the batch is done.
    pub fn put(&mut self, id: VolumeId, volume: Volume, zone: Z, rebuild_now: bool) {
        debug_assert!(volume.is_valid(), "invalid volume reached the index: {volume}");
        self.registry.insert(id, (volume, zone));
        self.stale = true;
        if rebuild_now {
            self.construct();
        }
    }

    /// Deregisters a volume, returning it with its zone.
    pub fn remove(&mut self, id: VolumeId, rebuild_now: bool) -> Option<(Volume, Z)> {
        let removed = self.registry.remove(&id);
        if removed.is_some() {
            self.stale = true;
            if rebuild_now {
                self.construct();
            }
        }
        removed
    }

    /// Builds a fresh snapshot from the registry and publishes it.
    pub fn construct(&mut self) {
        let entries = self
            .registry
            .iter()
            .map(|(&id, (volume, zone))| Entry {
                id,
                volume: volume.clone(),
                zone: *zone,
            })
            .collect();
        let snapshot = TreeSnapshot::build(entries);
        let stats = snapshot.stats();
        tracing::debug!(
            entries = stats.entries,
            nodes = stats.nodes,
            leaves = stats.leaves,
            largest_leaf = stats.largest_leaf,
            largest_span = stats.largest_span,
            max_depth = stats.max_depth,
            "volume tree rebuilt"
        );
        self.snapshot = Some(Arc::new(snapshot));
        self.stale = false;
    }

    /// The published snapshot, shareable with readers.
    ///
    /// # Panics
    ///
    /// Panics if [`construct`](Self::construct) was never called.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TreeSnapshot<Z>> {
        Arc::clone(self.published())
    }

    fn published(&self) -> &Arc<TreeSnapshot<Z>> {
        match &self.snapshot {
            Some(snapshot) => snapshot,
            None => panic!("volume tree queried before construct()"),
        }
    }

    /// See [`TreeSnapshot::containing`].
    #[must_use]
    pub fn containing(&self, pos: BlockPos) -> HashSet<Z> {
        self.published().containing(pos)
    }

    /// See [`TreeSnapshot::containing_volume`].
    #[must_use]
    pub fn containing_volume(&self, volume: &Volume, discriminating: bool) -> HashSet<Z> {
        self.published().containing_volume(volume, discriminating)
    }

    /// See [`TreeSnapshot::intersecting`].
    #[must_use]
    pub fn intersecting(&self, volume: &Volume) -> HashSet<Z> {
        self.published().intersecting(volume)
    }

    /// See [`TreeSnapshot::intersecting_any`].
    #[must_use]
    pub fn intersecting_any<'a>(&self, volumes: impl IntoIterator<Item = &'a Volume>) -> HashSet<Z> {
        self.published().intersecting_any(volumes)
    }

    /// Registered volume and owner.
    #[must_use]
    pub fn get(&self, id: VolumeId) -> Option<(&Volume, Z)> {
        self.registry.get(&id).map(|(volume, zone)| (volume, *zone))
    }

    /// All registered entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (VolumeId, &Volume, Z)> {
        self.registry
            .iter()
            .map(|(&id, (volume, zone))| (id, volume, *zone))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Whether the registry changed since the last construction.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Shape of the published snapshot, if any.
    #[must_use]
    pub fn stats(&self) -> Option<TreeStats> {
        self.snapshot.as_ref().map(|snapshot| snapshot.stats())
    }
}
