//! Shared handle for one writer and many readers.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Hierarchy, Location, Setting, UserId};

/// Clonable handle to a [`Hierarchy`].
///
/// Lookups take the read lock and run in parallel. Administrative mutations
/// take the write lock, which also serializes priority cascades.
#[derive(Clone, Debug, Default)]
pub struct SharedHierarchy {
    inner: Arc<RwLock<Hierarchy>>,
}

impl SharedHierarchy {
    #[must_use]
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(hierarchy)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Hierarchy> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Hierarchy> {
        self.inner.write()
    }

    /// See [`Hierarchy::lookup`].
    pub fn lookup<S: Setting>(&self, key: &S, user: Option<UserId>, location: &Location) -> S::Value {
        self.inner.read().lookup(key, user, location)
    }

    /// See [`Hierarchy::lookup_anonymous`].
    pub fn lookup_anonymous<S: Setting>(&self, key: &S, location: &Location) -> S::Value {
        self.inner.read().lookup_anonymous(key, location)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use zone_volume::{BlockPos, Volume};

    use super::*;
    use crate::{Flag, HostId, ZoneSpec};

    const PVP: Flag = Flag::new("pvp", true);

    #[test]
    fn test_readers_see_published_changes() {
        let shared = SharedHierarchy::default();
        let (world, arena) = {
            let mut hierarchy = shared.write();
            let world = hierarchy.create_domain("world").unwrap();
            let arena = hierarchy
                .add_zone(ZoneSpec::new("arena").volume(
                    world,
                    Volume::cuboid(BlockPos::new(0, 0, 0), BlockPos::new(16, 16, 16)).unwrap(),
                ))
                .unwrap();
            (world, arena)
        };
        let inside = Location::new(world, BlockPos::new(8, 8, 8));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || (0..100).all(|_| shared.lookup_anonymous(&PVP, &inside)))
            })
            .collect();
        for reader in readers {
            assert!(reader.join().unwrap());
        }

        shared
            .write()
            .set_setting(HostId::Zone(arena), &PVP, false)
            .unwrap();
        assert!(!shared.lookup_anonymous(&PVP, &inside));
    }
}
