//! Hierarchy error types.

use thiserror::Error;
use zone_tree::VolumeId;
use zone_volume::VolumeError;

use crate::{DomainId, ZoneId};

/// Hierarchy error type.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Zone name is empty or starts with the reserved prefix.
    #[error("invalid zone name {name:?}: {reason}")]
    InvalidZoneName { name: String, reason: &'static str },

    /// World name is empty or collides with the universe host name.
    #[error("invalid world name {0:?}")]
    InvalidDomainName(String),

    /// A zone with this name already exists.
    #[error("zone {0:?} already exists")]
    DuplicateZone(String),

    /// A world with this name already exists.
    #[error("world {0:?} already exists")]
    DuplicateDomain(String),

    #[error("unknown zone: {0:?}")]
    UnknownZone(ZoneId),

    #[error("unknown world: {0:?}")]
    UnknownDomain(DomainId),

    #[error("unknown parent zone: {0:?}")]
    UnknownParent(ZoneId),

    /// The zone does not own this volume.
    #[error("zone {zone:?} has no volume {volume:?}")]
    UnknownVolume { zone: ZoneId, volume: VolumeId },

    /// Zones need at least one volume.
    #[error("zone {0:?} must have at least one volume")]
    NoVolumes(String),

    /// Removing the volume would leave the zone empty.
    #[error("cannot remove the last volume of zone {0:?}")]
    LastVolume(ZoneId),

    /// The world still indexes volumes of loaded zones.
    #[error("world {domain:?} still holds volumes of {zones} zone(s)")]
    DomainInUse { domain: DomainId, zones: usize },

    /// Assigning the parent would make a zone its own ancestor.
    #[error("zone {child:?} cannot be nested under {parent:?}: cycle")]
    ParentCycle { child: ZoneId, parent: ZoneId },

    /// The priority fixup cascaded deeper than configured.
    #[error("priority cascade exceeded depth {depth} at zone {zone:?}")]
    CascadeLimit { zone: ZoneId, depth: usize },

    /// A collision bump would overflow the priority range.
    #[error("priority of zone {0:?} cannot be raised past u32::MAX")]
    PriorityOverflow(ZoneId),

    /// Two intersecting zones share a priority.
    #[error("zones {0:?} and {1:?} intersect with equal priority {2}")]
    PriorityCollision(ZoneId, ZoneId, u32),

    /// A setting of this name is stored with another value type.
    #[error("setting {0:?} is stored with a different value type")]
    SettingType(&'static str),

    /// Internal bookkeeping disagrees with an index.
    #[error("inconsistent hierarchy: {0}")]
    Inconsistent(String),

    #[error("invalid volume: {0}")]
    Volume(#[from] VolumeError),
}

/// Result type for hierarchy operations.
pub type HierarchyResult<T> = Result<T, HierarchyError>;
