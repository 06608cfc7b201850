//! Volume validation errors.

use thiserror::Error;

use crate::Axis;

/// Reasons a volume cannot be constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VolumeError {
    /// Lower bound is not strictly below the (exclusive) upper bound.
    #[error("inverted or empty bounds on {axis:?}: min {min} is not below max {max}")]
    InvertedBounds { axis: Axis, min: i64, max: i64 },

    /// An exclusive upper bound lies beyond the last representable block.
    #[error("upper bound {0} is out of range")]
    OutOfRange(i64),

    /// Radius is zero, negative or too large to index.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),

    /// A centre coordinate is NaN or infinite.
    #[error("non-finite coordinate: {0}")]
    NonFinite(f64),
}

/// Result type for volume construction.
pub type VolumeResult<T> = Result<T, VolumeError>;
