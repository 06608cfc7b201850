//! Persistence hooks.

use crate::Zone;

/// Receives zone changes for persistence.
///
/// Called while the hierarchy is borrowed mutably, so implementations must
/// not block: queue the work and return.
pub trait ZoneStore: Send + Sync {
    /// The zone was added or changed.
    fn save(&self, zone: &Zone);

    /// The zone was removed for good.
    fn destroy(&self, zone: &Zone);
}

/// Store that keeps nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl ZoneStore for NullStore {
    fn save(&self, _zone: &Zone) {}

    fn destroy(&self, _zone: &Zone) {}
}
