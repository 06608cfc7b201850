//! Block coordinates and inclusive block boxes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// World axis. Y is up; X and Z are the horizontal axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Coordinates of a block in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing the given point.
    #[must_use]
    pub fn containing_point(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    /// Coordinate along one axis.
    #[must_use]
    pub const fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Centre of the block as a point.
    #[must_use]
    pub fn center(self) -> [f64; 3] {
        [
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        ]
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned box of blocks with inclusive bounds on both ends.
///
/// Inclusive bounds keep boxes spanning the whole `i32` range representable,
/// which slabs need for their horizontal extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockBox {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockBox {
    /// Box spanning `min..=max`. Callers guarantee `min <= max` per axis.
    #[must_use]
    pub const fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    /// Box holding exactly one block.
    #[must_use]
    pub const fn single(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Lower inclusive bound along an axis.
    #[must_use]
    pub const fn min(&self, axis: Axis) -> i32 {
        self.min.get(axis)
    }

    /// Upper inclusive bound along an axis.
    #[must_use]
    pub const fn max(&self, axis: Axis) -> i32 {
        self.max.get(axis)
    }

    #[must_use]
    pub fn contains(&self, pos: BlockPos) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.min(axis) <= pos.get(axis) && pos.get(axis) <= self.max(axis))
    }

    /// Whether `other` lies entirely inside this box.
    #[must_use]
    pub fn contains_box(&self, other: &BlockBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    #[must_use]
    pub fn overlaps(&self, other: &BlockBox) -> bool {
        Axis::ALL.iter().all(|&axis| {
            self.min(axis) <= other.max(axis) && other.min(axis) <= self.max(axis)
        })
    }

    /// The eight corner blocks (duplicates when the box is flat).
    #[must_use]
    pub fn corners(&self) -> [BlockPos; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            BlockPos::new(lo.x, lo.y, lo.z),
            BlockPos::new(hi.x, lo.y, lo.z),
            BlockPos::new(lo.x, hi.y, lo.z),
            BlockPos::new(hi.x, hi.y, lo.z),
            BlockPos::new(lo.x, lo.y, hi.z),
            BlockPos::new(hi.x, lo.y, hi.z),
            BlockPos::new(lo.x, hi.y, hi.z),
            BlockPos::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Number of blocks along an axis, saturating for full-range boxes.
    #[must_use]
    pub fn extent(&self, axis: Axis) -> u64 {
        (i64::from(self.max(axis)) - i64::from(self.min(axis)) + 1) as u64
    }
}

impl fmt::Display for BlockBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
