//! Divider kinds used while partitioning.

use zone_volume::{Axis, BlockBox};

/// Which bound of which horizontal axis a divider splits on.
///
/// Construction cycles through the kinds in declaration order, so the axis
/// alternates every level and the bound kind every two levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    MinX,
    MinZ,
    MaxX,
    MaxZ,
}

impl Split {
    /// Kind used at the root.
    pub const FIRST: Split = Split::MinX;

    /// Next kind in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::MinX => Self::MinZ,
            Self::MinZ => Self::MaxX,
            Self::MaxX => Self::MaxZ,
            Self::MaxZ => Self::MinX,
        }
    }

    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::MinX | Self::MaxX => Axis::X,
            Self::MinZ | Self::MaxZ => Axis::Z,
        }
    }

    #[must_use]
    pub const fn is_min(self) -> bool {
        matches!(self, Self::MinX | Self::MinZ)
    }

    /// The bound this kind sorts by (upper bounds are inclusive).
    #[must_use]
    pub const fn key(self, bounds: &BlockBox) -> i32 {
        if self.is_min() {
            bounds.min(self.axis())
        } else {
            bounds.max(self.axis())
        }
    }

    /// Routing for a single coordinate.
    ///
    /// Min dividers send `coord < divider` left, max dividers send
    /// `coord <= divider` left.
    #[must_use]
    pub const fn routes_left(self, coord: i32, divider: i32) -> bool {
        if self.is_min() {
            coord < divider
        } else {
            coord <= divider
        }
    }

    /// Whether any coordinate of `bounds` routes left.
    #[must_use]
    pub const fn reaches_left(self, bounds: &BlockBox, divider: i32) -> bool {
        self.routes_left(bounds.min(self.axis()), divider)
    }

    /// Whether any coordinate of `bounds` routes right.
    #[must_use]
    pub const fn reaches_right(self, bounds: &BlockBox, divider: i32) -> bool {
        !self.routes_left(bounds.max(self.axis()), divider)
    }
}
