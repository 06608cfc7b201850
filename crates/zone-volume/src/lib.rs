//! Volume geometry for zones.
//!
//! A [`Volume`] is an immutable shape (cuboid, vertical cylinder, sphere or
//! horizontal slab) that answers exact block containment and exposes two
//! block-box approximations used by the spatial index:
//!
//! ```text
//!   circumscribed  ┌───────────┐   never misses a contained block
//!                  │  ╭─────╮  │
//!   inscribed      │ ┌┼─────┼┐ │   every block inside is contained
//!                  │ └┼─────┼┘ │
//!                  │  ╰─────╯  │
//!                  └───────────┘
//! ```
//!
//! Both approximations are computed once at construction. Invalid shapes
//! (inverted bounds, non-positive radius, non-finite centres) are rejected
//! by the constructors, so every `Volume` in circulation is valid.

mod error;
mod pos;
mod volume;

pub use error::{VolumeError, VolumeResult};
pub use pos::{Axis, BlockBox, BlockPos};
pub use volume::{
    Cuboid, Cylinder, Slab, Sphere, UpperCorner, Volume, VolumeDef, VolumeKind,
};
