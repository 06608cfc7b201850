//! Volume shapes.
//!
//! Every shape answers an exact containment test and carries two cached
//! approximations:
//!
//! - `circumscribed`: smallest enclosing block box. Never excludes a block the
//!   shape contains, so indexes can prune with it.
//! - `inscribed`: largest enclosed block box. Every block inside it is
//!   contained by the shape, so it is safe for "wholly contains" checks.
//!
//! Round shapes test the centre of a block (`pos + 0.5`) against the shape.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Axis, BlockBox, BlockPos, VolumeError, VolumeResult};

/// Discriminant of a [`Volume`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    Cuboid,
    Cylinder,
    Sphere,
    Slab,
}

impl VolumeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cuboid => "cuboid",
            Self::Cylinder => "cylinder",
            Self::Sphere => "sphere",
            Self::Slab => "slab",
        }
    }
}

/// An immutable, validated shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VolumeDef", into = "VolumeDef")]
pub enum Volume {
    Cuboid(Cuboid),
    Cylinder(Cylinder),
    Sphere(Sphere),
    Slab(Slab),
}

/// Axis-aligned box.
#[derive(Clone, Debug, PartialEq)]
pub struct Cuboid {
    bounds: BlockBox,
}

/// Vertical cylinder with a circular cross-section.
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    center_x: f64,
    center_z: f64,
    radius: f64,
    radius_sq: f64,
    min_y: i32,
    max_y: i32,
    circumscribed: BlockBox,
    inscribed: Option<BlockBox>,
}

/// Ball around a centre point.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    center: [f64; 3],
    radius: f64,
    radius_sq: f64,
    circumscribed: BlockBox,
    inscribed: Option<BlockBox>,
}

/// Horizontal layer of infinite horizontal extent.
#[derive(Clone, Debug, PartialEq)]
pub struct Slab {
    bounds: BlockBox,
}

impl Volume {
    /// Box covering `min..max` (upper bound exclusive) on every axis.
    pub fn cuboid(min: BlockPos, max: BlockPos) -> VolumeResult<Self> {
        Self::cuboid_to(min, UpperCorner::from(max))
    }

    /// Box covering `min..max` where `max` may sit one past `i32::MAX`.
    pub fn cuboid_to(min: BlockPos, max: UpperCorner) -> VolumeResult<Self> {
        let mut inclusive_max = [0; 3];
        for (slot, axis) in inclusive_max.iter_mut().zip(Axis::ALL) {
            let upper = max.get(axis);
            check_interval(axis, min.get(axis).into(), upper)?;
            *slot = i32::try_from(upper - 1).map_err(|_| VolumeError::OutOfRange(upper))?;
        }
        let [x, y, z] = inclusive_max;
        Ok(Self::Cuboid(Cuboid {
            bounds: BlockBox::new(min, BlockPos::new(x, y, z)),
        }))
    }

    /// Cuboid holding exactly one block.
    #[must_use]
    pub const fn single_block(pos: BlockPos) -> Self {
        Self::Cuboid(Cuboid {
            bounds: BlockBox::single(pos),
        })
    }

    /// Vertical cylinder spanning heights `min_y..max_y`.
    pub fn cylinder(
        center_x: f64,
        center_z: f64,
        radius: f64,
        min_y: i32,
        max_y: i32,
    ) -> VolumeResult<Self> {
        check_finite(center_x)?;
        check_finite(center_z)?;
        check_radius(radius, &[center_x, center_z])?;
        check_interval(Axis::Y, min_y.into(), max_y.into())?;

        let (min_x, max_x) = outer_range(center_x, radius);
        let (min_z, max_z) = outer_range(center_z, radius);
        let circumscribed = BlockBox::new(
            BlockPos::new(min_x, min_y, min_z),
            BlockPos::new(max_x, max_y - 1, max_z),
        );

        let mut cylinder = Cylinder {
            center_x,
            center_z,
            radius,
            radius_sq: radius * radius,
            min_y,
            max_y,
            circumscribed,
            inscribed: None,
        };

        let half_side = radius * FRAC_1_SQRT_2;
        cylinder.inscribed = inner_range(center_x, half_side)
            .zip(inner_range(center_z, half_side))
            .map(|((lo_x, hi_x), (lo_z, hi_z))| {
                BlockBox::new(
                    BlockPos::new(lo_x, min_y, lo_z),
                    BlockPos::new(hi_x, max_y - 1, hi_z),
                )
            })
            .and_then(|candidate| {
                shrink_to_fit(candidate, false, |pos| cylinder.contains_block(pos))
            });

        Ok(Self::Cylinder(cylinder))
    }

    /// Ball of the given radius.
    pub fn sphere(center: [f64; 3], radius: f64) -> VolumeResult<Self> {
        for c in center {
            check_finite(c)?;
        }
        check_radius(radius, &center)?;

        let ranges = center.map(|c| outer_range(c, radius));
        let circumscribed = BlockBox::new(
            BlockPos::new(ranges[0].0, ranges[1].0, ranges[2].0),
            BlockPos::new(ranges[0].1, ranges[1].1, ranges[2].1),
        );

        let mut sphere = Sphere {
            center,
            radius,
            radius_sq: radius * radius,
            circumscribed,
            inscribed: None,
        };

        let half_side = radius / 3f64.sqrt();
        let inner = center.map(|c| inner_range(c, half_side));
        sphere.inscribed = match inner {
            [Some(x), Some(y), Some(z)] => shrink_to_fit(
                BlockBox::new(BlockPos::new(x.0, y.0, z.0), BlockPos::new(x.1, y.1, z.1)),
                true,
                |pos| sphere.contains_block(pos),
            ),
            _ => None,
        };

        Ok(Self::Sphere(sphere))
    }

    /// Layer spanning heights `min_y..max_y` and every horizontal coordinate.
    pub fn slab(min_y: i32, max_y: i32) -> VolumeResult<Self> {
        check_interval(Axis::Y, min_y.into(), max_y.into())?;
        Ok(Self::Slab(Slab {
            bounds: BlockBox::new(
                BlockPos::new(i32::MIN, min_y, i32::MIN),
                BlockPos::new(i32::MAX, max_y - 1, i32::MAX),
            ),
        }))
    }

    #[must_use]
    pub const fn kind(&self) -> VolumeKind {
        match self {
            Self::Cuboid(_) => VolumeKind::Cuboid,
            Self::Cylinder(_) => VolumeKind::Cylinder,
            Self::Sphere(_) => VolumeKind::Sphere,
            Self::Slab(_) => VolumeKind::Slab,
        }
    }

    /// Exact test for a block.
    #[must_use]
    pub fn contains_block(&self, pos: BlockPos) -> bool {
        match self {
            Self::Cuboid(c) => c.bounds.contains(pos),
            Self::Slab(s) => s.bounds.min.y <= pos.y && pos.y <= s.bounds.max.y,
            Self::Cylinder(c) => c.contains_block(pos),
            Self::Sphere(s) => s.contains_block(pos),
        }
    }

    /// Exact test for an arbitrary point.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        match self {
            Self::Cuboid(c) => {
                let b = &c.bounds;
                in_half_open(x, b.min.x, b.max.x)
                    && in_half_open(y, b.min.y, b.max.y)
                    && in_half_open(z, b.min.z, b.max.z)
            }
            Self::Slab(s) => in_half_open(y, s.bounds.min.y, s.bounds.max.y),
            Self::Cylinder(c) => c.contains_point(x, y, z),
            Self::Sphere(s) => s.contains_point(x, y, z),
        }
    }

    /// Smallest enclosing block box.
    #[must_use]
    pub const fn circumscribed(&self) -> BlockBox {
        match self {
            Self::Cuboid(c) => c.bounds,
            Self::Slab(s) => s.bounds,
            Self::Cylinder(c) => c.circumscribed,
            Self::Sphere(s) => s.circumscribed,
        }
    }

    /// Largest enclosed block box, `None` when not even one block fits.
    #[must_use]
    pub const fn inscribed(&self) -> Option<BlockBox> {
        match self {
            Self::Cuboid(c) => Some(c.bounds),
            Self::Slab(s) => Some(s.bounds),
            Self::Cylinder(c) => c.inscribed,
            Self::Sphere(s) => s.inscribed,
        }
    }

    /// Re-checks the construction invariants.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let circumscribed = self.circumscribed();
        let ordered = Axis::ALL
            .iter()
            .all(|&axis| circumscribed.min(axis) <= circumscribed.max(axis));
        let nested = self
            .inscribed()
            .is_none_or(|inscribed| circumscribed.contains_box(&inscribed));
        let round_ok = match self {
            Self::Cylinder(c) => c.radius > 0.0 && c.min_y < c.max_y,
            Self::Sphere(s) => s.radius > 0.0,
            Self::Cuboid(_) | Self::Slab(_) => true,
        };
        ordered && nested && round_ok
    }
}

impl Cuboid {
    #[must_use]
    pub const fn bounds(&self) -> BlockBox {
        self.bounds
    }
}

impl Cylinder {
    #[must_use]
    pub const fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_z)
    }

    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Height range, upper bound exclusive.
    #[must_use]
    pub const fn heights(&self) -> (i32, i32) {
        (self.min_y, self.max_y)
    }

    fn contains_block(&self, pos: BlockPos) -> bool {
        if pos.y < self.min_y || pos.y >= self.max_y {
            return false;
        }
        let [x, _, z] = pos.center();
        self.in_disc(x, z)
    }

    fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        f64::from(self.min_y) <= y && y < f64::from(self.max_y) && self.in_disc(x, z)
    }

    fn in_disc(&self, x: f64, z: f64) -> bool {
        let dx = x - self.center_x;
        let dz = z - self.center_z;
        dx * dx + dz * dz <= self.radius_sq
    }
}

impl Sphere {
    #[must_use]
    pub const fn center(&self) -> [f64; 3] {
        self.center
    }

    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    fn contains_block(&self, pos: BlockPos) -> bool {
        let [x, y, z] = pos.center();
        self.contains_point(x, y, z)
    }

    fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        let dx = x - self.center[0];
        let dy = y - self.center[1];
        let dz = z - self.center[2];
        dx * dx + dy * dy + dz * dz <= self.radius_sq
    }
}

impl Slab {
    /// Height range, upper bound exclusive.
    #[must_use]
    pub const fn heights(&self) -> (i32, i32) {
        (self.bounds.min.y, self.bounds.max.y + 1)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cuboid(c) => write!(f, "cuboid {}", c.bounds),
            Self::Cylinder(c) => write!(
                f,
                "cylinder at ({}, {}) r={} y={}..{}",
                c.center_x, c.center_z, c.radius, c.min_y, c.max_y
            ),
            Self::Sphere(s) => write!(
                f,
                "sphere at ({}, {}, {}) r={}",
                s.center[0], s.center[1], s.center[2], s.radius
            ),
            Self::Slab(s) => {
                let (min_y, max_y) = s.heights();
                write!(f, "slab y={min_y}..{max_y}")
            }
        }
    }
}

/// Exclusive upper corner of a cuboid.
///
/// Wider than [`BlockPos`] so a box ending on the last block of an axis can
/// still name the bound one past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpperCorner {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl UpperCorner {
    #[must_use]
    pub const fn get(self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// One past the inclusive corner `pos`.
    #[must_use]
    pub fn past(pos: BlockPos) -> Self {
        Self {
            x: i64::from(pos.x) + 1,
            y: i64::from(pos.y) + 1,
            z: i64::from(pos.z) + 1,
        }
    }
}

impl From<BlockPos> for UpperCorner {
    fn from(pos: BlockPos) -> Self {
        Self {
            x: pos.x.into(),
            y: pos.y.into(),
            z: pos.z.into(),
        }
    }
}

/// Serialized form of a [`Volume`]. Deserializing goes through validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum VolumeDef {
    Cuboid {
        min: BlockPos,
        max: UpperCorner,
    },
    Cylinder {
        center_x: f64,
        center_z: f64,
        radius: f64,
        min_y: i32,
        max_y: i32,
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    Slab {
        min_y: i32,
        max_y: i32,
    },
}

impl TryFrom<VolumeDef> for Volume {
    type Error = VolumeError;

    fn try_from(def: VolumeDef) -> VolumeResult<Self> {
        match def {
            VolumeDef::Cuboid { min, max } => Self::cuboid_to(min, max),
            VolumeDef::Cylinder {
                center_x,
                center_z,
                radius,
                min_y,
                max_y,
            } => Self::cylinder(center_x, center_z, radius, min_y, max_y),
            VolumeDef::Sphere { center, radius } => Self::sphere(center, radius),
            VolumeDef::Slab { min_y, max_y } => Self::slab(min_y, max_y),
        }
    }
}

impl From<Volume> for VolumeDef {
    fn from(volume: Volume) -> Self {
        match volume {
            Volume::Cuboid(c) => Self::Cuboid {
                min: c.bounds.min,
                max: UpperCorner::past(c.bounds.max),
            },
            Volume::Cylinder(c) => Self::Cylinder {
                center_x: c.center_x,
                center_z: c.center_z,
                radius: c.radius,
                min_y: c.min_y,
                max_y: c.max_y,
            },
            Volume::Sphere(s) => Self::Sphere {
                center: s.center,
                radius: s.radius,
            },
            Volume::Slab(s) => {
                let (min_y, max_y) = s.heights();
                Self::Slab { min_y, max_y }
            }
        }
    }
}

fn check_interval(axis: Axis, min: i64, max: i64) -> VolumeResult<()> {
    if min < max {
        Ok(())
    } else {
        Err(VolumeError::InvertedBounds { axis, min, max })
    }
}

fn check_finite(value: f64) -> VolumeResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VolumeError::NonFinite(value))
    }
}

/// Radius must be positive and keep the circumscribed box inside `i32`.
fn check_radius(radius: f64, centers: &[f64]) -> VolumeResult<()> {
    let fits = centers.iter().all(|&c| {
        c - radius >= f64::from(i32::MIN) && c + radius <= f64::from(i32::MAX)
    });
    if radius.is_finite() && radius > 0.0 && fits {
        Ok(())
    } else {
        Err(VolumeError::InvalidRadius(radius))
    }
}

/// Inclusive block range whose centres can lie within `c ± r`.
fn outer_range(c: f64, r: f64) -> (i32, i32) {
    ((c - r).floor() as i32, (c + r).ceil() as i32 - 1)
}

/// Inclusive block range whose centres all lie within `c ± half_side`.
fn inner_range(c: f64, half_side: f64) -> Option<(i32, i32)> {
    let lo = (c - half_side - 0.5).ceil() as i32;
    let hi = (c + half_side - 0.5).floor() as i32;
    (lo <= hi).then_some((lo, hi))
}

/// Pulls the faces of `candidate` inward until every corner block passes
/// `contains`. Absorbs floating point error at the exact boundary. Y faces
/// only move when `shrink_y` is set.
fn shrink_to_fit(
    mut candidate: BlockBox,
    shrink_y: bool,
    contains: impl Fn(BlockPos) -> bool,
) -> Option<BlockBox> {
    loop {
        if Axis::ALL
            .iter()
            .any(|&axis| candidate.min(axis) > candidate.max(axis))
        {
            return None;
        }
        if candidate.corners().iter().all(|&corner| contains(corner)) {
            return Some(candidate);
        }
        candidate.min.x += 1;
        candidate.max.x -= 1;
        candidate.min.z += 1;
        candidate.max.z -= 1;
        if shrink_y {
            candidate.min.y += 1;
            candidate.max.y -= 1;
        }
    }
}

fn in_half_open(value: f64, min: i32, inclusive_max: i32) -> bool {
    f64::from(min) <= value && value < f64::from(inclusive_max) + 1.0
}
