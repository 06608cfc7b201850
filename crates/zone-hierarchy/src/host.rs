//! Host identifiers and query locations.

use std::fmt;

use zone_volume::BlockPos;

/// Identifier of a loaded zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u32);

/// Identifier of a loaded world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub u32);

/// A player's UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u128);

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({:032x})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Anything that carries settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostId {
    /// The process-wide root.
    Universe,
    /// A world.
    Domain(DomainId),
    /// A zone.
    Zone(ZoneId),
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Universe => write!(f, "universe"),
            Self::Domain(id) => write!(f, "world#{}", id.0),
            Self::Zone(id) => write!(f, "zone#{}", id.0),
        }
    }
}

/// A block in a specific world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub domain: DomainId,
    pub pos: BlockPos,
}

impl Location {
    #[must_use]
    pub const fn new(domain: DomainId, pos: BlockPos) -> Self {
        Self { domain, pos }
    }

    /// Location of the block containing an entity position.
    #[must_use]
    pub fn at_point(domain: DomainId, x: f64, y: f64, z: f64) -> Self {
        Self {
            domain,
            pos: BlockPos::containing_point(x, y, z),
        }
    }
}
