//! Zone hierarchy and setting resolution.
//!
//! Settings live on three kinds of host:
//!
//! ```text
//!                 Universe            (process wide)
//!                    │
//!        ┌───────────┼───────────┐
//!     Domain      Domain      Domain  (one per world, owns a VolumeTree)
//!        │
//!   ┌────┴─────┐
//!  Zone      Zone                     (prioritized, optionally nested)
//!   │
//!  Zone (child)
//! ```
//!
//! A lookup asks the world's index which zones contain the block, adds
//! their ancestors, world and universe, keeps the hosts that configure the
//! setting and hands them to the [`Setting`] key, most specific first.
//! Intersecting zones never share a priority, so that order is well defined.
//!
//! # Example
//!
//! ```ignore
//! const PVP: Flag = Flag::new("pvp", true);
//!
//! let mut hierarchy = Hierarchy::default();
//! let world = hierarchy.create_domain("world")?;
//! let spawn = hierarchy.add_zone(ZoneSpec::new("spawn").volume(world, volume))?;
//! hierarchy.set_setting(HostId::Zone(spawn), &PVP, false)?;
//!
//! let here = Location::at_point(world, 0.5, 64.0, 0.5);
//! assert!(!hierarchy.lookup_anonymous(&PVP, &here));
//! ```

mod chain;
mod config;
mod error;
mod hierarchy;
mod host;
mod priority;
mod resolve;
mod setting;
mod settings;
mod shared;
mod store;
mod zone;

pub use chain::{ChainLink, HostChain};
pub use config::HierarchyConfig;
pub use error::{HierarchyError, HierarchyResult};
pub use hierarchy::Hierarchy;
pub use host::{DomainId, HostId, Location, UserId, ZoneId};
pub use setting::{Flag, Number, SetSetting, Setting, Text};
pub use settings::{SettingEntry, Settings};
pub use shared::SharedHierarchy;
pub use store::{NullStore, ZoneStore};
pub use zone::{Domain, PlacedVolume, Zone, ZoneSpec};
pub use zone_altset::AltSet;
pub use zone_tree::VolumeId;
pub use zone_volume::{BlockPos, Volume};
