//! Volume tree - spatial index over zone volumes.
//!
//! Answers "which zones contain block (x, y, z)?" for worlds that are wide
//! horizontally and shallow vertically. The index is a binary space
//! partition over the two horizontal axes only; the vertical axis is left
//! to the exact tests in the leaves.
//!
//! # Build
//!
//! ```text
//! depth 0: split on min X ─┐
//! depth 1: split on min Z  │ the cycle repeats
//! depth 2: split on max X  │
//! depth 3: split on max Z ─┘
//! ```
//!
//! Each step sorts the candidates by the current bound, divides at the
//! median (moved past runs of equal bounds) and sends every candidate to the
//! side its circumscribed box reaches. Straddlers stay on the divider and are
//! scanned by every query passing through it, so each volume is stored once.
//! A subset becomes a leaf when it holds one candidate, when every candidate
//! straddles, or when four consecutive steps failed to shrink it.
//!
//! # Usage
//!
//! ```ignore
//! let mut tree = VolumeTree::new();
//! tree.put(VolumeId(0), spawn_volume, spawn_zone, false);
//! tree.put(VolumeId(1), market_volume, market_zone, false);
//! tree.construct(); // one rebuild for the whole batch
//!
//! let zones = tree.containing(BlockPos::new(10, 64, -3));
//! ```

mod node;
mod split;
mod tree;

pub use node::TreeStats;
pub use split::Split;
pub use tree::{TreeSnapshot, VolumeId, VolumeTree};
