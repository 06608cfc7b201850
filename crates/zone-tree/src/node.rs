//! Tree nodes and the recursive partitioning build.

use smallvec::SmallVec;
use zone_volume::{BlockBox, BlockPos};

use crate::split::Split;

/// Consecutive non-shrinking steps after which a subset becomes a leaf.
pub(crate) const MAX_UNCHANGED: u32 = 4;

/// Indices into the snapshot's entry list.
pub(crate) type Candidates = SmallVec<[u32; 8]>;

/// A node of the partition tree.
#[derive(Debug)]
pub(crate) enum Node {
    /// No candidate reaches this region.
    Empty,
    /// Candidates scanned linearly with exact tests.
    Leaf(Candidates),
    /// Routes on one bound of one horizontal axis.
    ///
    /// Candidates reaching both sides stay here and are scanned by every
    /// query passing through, so each candidate lives in exactly one node.
    Divider {
        split: Split,
        value: i32,
        spanning: Candidates,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Shape counters collected while building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Registered volumes.
    pub entries: usize,
    /// Total nodes, dividers included.
    pub nodes: usize,
    /// Leaf nodes (empty nodes excluded).
    pub leaves: usize,
    /// Candidates held by the largest leaf.
    pub largest_leaf: usize,
    /// Most candidates held at a single divider.
    pub largest_span: usize,
    /// Depth of the deepest node, the root being depth 0.
    pub max_depth: usize,
}

impl Node {
    /// Partitions `subset` recursively.
    ///
    /// `bounds[i]` is the circumscribed box of entry `i`.
    pub(crate) fn build(
        bounds: &[BlockBox],
        mut subset: Candidates,
        split: Split,
        unchanged: u32,
        depth: usize,
        stats: &mut TreeStats,
    ) -> Self {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(depth);

        if subset.is_empty() {
            return Self::Empty;
        }
        if subset.len() == 1 || unchanged >= MAX_UNCHANGED {
            return Self::leaf(subset, stats);
        }

        subset.sort_unstable_by_key(|&i| split.key(&bounds[i as usize]));
        let keys: SmallVec<[i32; 8]> = subset
            .iter()
            .map(|&i| split.key(&bounds[i as usize]))
            .collect();
        let value = divider_value(&keys, split.is_min());

        let len = subset.len();
        let mut left = Candidates::new();
        let mut right = Candidates::new();
        let mut spanning = Candidates::new();
        for i in subset.iter().copied() {
            let b = &bounds[i as usize];
            match (split.reaches_left(b, value), split.reaches_right(b, value)) {
                (true, true) => spanning.push(i),
                (true, false) => left.push(i),
                (false, _) => right.push(i),
            }
        }

        // Nothing left to route: scanning here is all a divider could do.
        if left.is_empty() && right.is_empty() {
            return Self::leaf(subset, stats);
        }
        stats.largest_span = stats.largest_span.max(spanning.len());

        let left_unchanged = if left.len() == len { unchanged + 1 } else { 0 };
        let right_unchanged = if right.len() == len { unchanged + 1 } else { 0 };

        let next = split.next();
        let left = Self::build(bounds, left, next, left_unchanged, depth + 1, stats);
        let right = Self::build(bounds, right, next, right_unchanged, depth + 1, stats);

        Self::Divider {
            split,
            value,
            spanning,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn leaf(subset: Candidates, stats: &mut TreeStats) -> Self {
        stats.leaves += 1;
        stats.largest_leaf = stats.largest_leaf.max(subset.len());
        Self::Leaf(subset)
    }

    /// Visits every candidate list on the path of a single block.
    pub(crate) fn for_each_at(&self, pos: BlockPos, visit: &mut impl FnMut(&Candidates)) {
        let mut node = self;
        loop {
            match node {
                Self::Empty => return,
                Self::Leaf(candidates) => {
                    visit(candidates);
                    return;
                }
                Self::Divider {
                    split,
                    value,
                    spanning,
                    left,
                    right,
                } => {
                    visit(spanning);
                    node = if split.routes_left(pos.get(split.axis()), *value) {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Visits every candidate list a box can reach.
    pub(crate) fn for_each_in(&self, query: &BlockBox, visit: &mut impl FnMut(&Candidates)) {
        match self {
            Self::Empty => {}
            Self::Leaf(candidates) => visit(candidates),
            Self::Divider {
                split,
                value,
                spanning,
                left,
                right,
            } => {
                visit(spanning);
                if split.reaches_left(query, *value) {
                    left.for_each_in(query, visit);
                }
                if split.reaches_right(query, *value) {
                    right.for_each_in(query, visit);
                }
            }
        }
    }
}

/// Picks the divider from sorted keys.
///
/// Starts at the median and moves past any run of equal keys so that equal
/// bounds always land on the same side. Falls back to searching below the
/// median, and to the extreme key when every key is equal (the split then
/// excludes nothing and the unchanged count takes over).
fn divider_value(keys: &[i32], is_min: bool) -> i32 {
    let len = keys.len();
    let median = len / 2;
    let boundary = (median.max(1)..len)
        .find(|&i| keys[i] != keys[i - 1])
        .or_else(|| (1..median).rev().find(|&i| keys[i] != keys[i - 1]));

    match (boundary, is_min) {
        // First key of the upper run: everything below it goes left only.
        (Some(i), true) => keys[i],
        // Last key of the lower run: everything up to it stays left only.
        (Some(i), false) => keys[i - 1],
        (None, true) => keys[0],
        (None, false) => keys[len - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divider_skips_equal_run() {
        assert_eq!(divider_value(&[1, 2, 3, 4], true), 3);
        assert_eq!(divider_value(&[1, 2, 2, 2, 5], true), 5);
        assert_eq!(divider_value(&[1, 2, 2, 2, 5], false), 2);
        // Run reaches the end: fall back below the median.
        assert_eq!(divider_value(&[1, 4, 4, 4], true), 4);
        assert_eq!(divider_value(&[1, 4, 4, 4], false), 1);
        assert_eq!(divider_value(&[7, 7, 7], true), 7);
        assert_eq!(divider_value(&[7, 7, 7], false), 7);
    }

    fn cell(x: i32, z: i32) -> BlockBox {
        BlockBox::new(BlockPos::new(x, 0, z), BlockPos::new(x + 3, 10, z + 3))
    }

    fn build(bounds: &[BlockBox]) -> (Node, TreeStats) {
        let mut stats = TreeStats::default();
        let subset: Candidates = (0..bounds.len() as u32).collect();
        let root = Node::build(bounds, subset, Split::FIRST, 0, 0, &mut stats);
        (root, stats)
    }

    fn candidates_at(root: &Node, pos: BlockPos) -> Vec<u32> {
        let mut found = Vec::new();
        root.for_each_at(pos, &mut |candidates| found.extend_from_slice(candidates));
        found.sort_unstable();
        found
    }

    #[test]
    fn test_disjoint_boxes_split_into_small_leaves() {
        let bounds: Vec<BlockBox> = (0..8)
            .flat_map(|x| (0..8).map(move |z| cell(x * 10, z * 10)))
            .collect();
        let (root, stats) = build(&bounds);

        assert_eq!(stats.largest_leaf, 1);
        assert_eq!(stats.largest_span, 0);
        let found = candidates_at(&root, BlockPos::new(31, 5, 52));
        assert_eq!(found.len(), 1);
        assert_eq!(bounds[found[0] as usize], cell(30, 50));
    }

    #[test]
    fn test_identical_boxes_stop_at_unchanged_limit() {
        let bounds = vec![cell(0, 0); 6];
        let (root, stats) = build(&bounds);

        assert_eq!(stats.largest_leaf, 6);
        assert!(stats.max_depth <= MAX_UNCHANGED as usize);
        assert_eq!(candidates_at(&root, BlockPos::new(1, 1, 1)).len(), 6);
    }

    #[test]
    fn test_nested_boxes_stay_linear() {
        // Concentric squares: every box straddles every divider of the
        // boxes it encloses.
        let n = 2000;
        let bounds: Vec<BlockBox> = (0..n)
            .map(|k| {
                BlockBox::new(
                    BlockPos::new(k, 0, k),
                    BlockPos::new(1_000_000 - k - 1, 64, 1_000_000 - k - 1),
                )
            })
            .collect();
        let (root, stats) = build(&bounds);

        assert!(stats.nodes <= 4 * bounds.len(), "{stats:?}");
        assert!(stats.largest_leaf < bounds.len(), "{stats:?}");

        // The centre lies in every box, each reported exactly once.
        let centre = candidates_at(&root, BlockPos::new(500_000, 10, 500_000));
        assert_eq!(centre, (0..n as u32).collect::<Vec<_>>());
        // Near the edge only the outer rings hold the block.
        let edge = BlockPos::new(9, 10, 500_000);
        let ring: Vec<u32> = candidates_at(&root, edge)
            .into_iter()
            .filter(|&i| bounds[i as usize].contains(edge))
            .collect();
        assert_eq!(ring, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_candidate_stored_once() {
        let mut bounds: Vec<BlockBox> = (0..20).map(|k| cell(k * 2, k * 3)).collect();
        bounds.extend((0..20).map(|k| {
            BlockBox::new(BlockPos::new(-k, 0, -k), BlockPos::new(100 + k, 10, 100 + k))
        }));
        let (root, _) = build(&bounds);

        let mut seen = Vec::new();
        let everything = BlockBox::new(
            BlockPos::new(i32::MIN, i32::MIN, i32::MIN),
            BlockPos::new(i32::MAX, i32::MAX, i32::MAX),
        );
        root.for_each_in(&everything, &mut |candidates| seen.extend_from_slice(candidates));
        seen.sort_unstable();
        assert_eq!(seen, (0..bounds.len() as u32).collect::<Vec<_>>());
    }
}
