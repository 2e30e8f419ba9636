//! An ordered partition of the Unicode code-point space `[0, 0x110000)` into
//! disjoint half-open intervals `[lo, hi)`, each carrying a dense integer
//! class id once the partition is finalized.
//!
//! Structured as an AVL tree of intervals where inserting an overlapping
//! interval splits the existing nodes along every boundary so the tree
//! remains a disjoint partition, and every node caches the min `lo`/max
//! `hi` of its subtree to prune non-overlapping branches during insert and
//! search.
use std::cmp::max;

use crate::util::{BuildLogger, Log};

const FULL_RANGE_HI: u32 = 0x0011_0000;

struct Node {
    lo: u32,
    hi: u32,
    /// Dense class id, assigned by [RangeMap::finalize]; `None` until then.
    class_id: Option<u32>,
    height: i32,
    subtree_min: u32,
    subtree_max: u32,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(lo: u32, hi: u32) -> Self {
        Self {
            lo,
            hi,
            class_id: None,
            height: 1,
            subtree_min: lo,
            subtree_max: hi,
            left: None,
            right: None,
        }
    }

    fn height_of(node: &Option<Box<Node>>) -> i32 {
        node.as_ref().map_or(0, |n| n.height)
    }

    fn balance_factor(&self) -> i32 {
        Self::height_of(&self.left) - Self::height_of(&self.right)
    }

    /// Recompute `height` and the `subtree_min`/`subtree_max` containment
    /// cache from this node's children. Called "__maintain" in the source.
    fn maintain(&mut self) {
        self.height = 1 + max(Self::height_of(&self.left), Self::height_of(&self.right));
        self.subtree_min = self.lo;
        self.subtree_max = self.hi;
        if let Some(l) = &self.left {
            self.subtree_min = self.subtree_min.min(l.subtree_min);
            self.subtree_max = self.subtree_max.max(l.subtree_max);
        }
        if let Some(r) = &self.right {
            self.subtree_min = self.subtree_min.min(r.subtree_min);
            self.subtree_max = self.subtree_max.max(r.subtree_max);
        }
    }

    fn rotate_left(mut self: Box<Self>) -> Box<Self> {
        let mut new_root = self.right.take().expect("rotate_left requires a right child");
        self.right = new_root.left.take();
        self.maintain();
        new_root.left = Some(self);
        new_root.maintain();
        new_root
    }

    fn rotate_right(mut self: Box<Self>) -> Box<Self> {
        let mut new_root = self.left.take().expect("rotate_right requires a left child");
        self.left = new_root.right.take();
        self.maintain();
        new_root.right = Some(self);
        new_root.maintain();
        new_root
    }

    fn rebalance(mut self: Box<Self>) -> Box<Self> {
        self.maintain();
        let balance = self.balance_factor();
        if balance > 1 {
            if self.left.as_ref().unwrap().balance_factor() < 0 {
                self.left = Some(self.left.take().unwrap().rotate_left());
            }
            return self.rotate_right();
        }
        if balance < -1 {
            if self.right.as_ref().unwrap().balance_factor() > 0 {
                self.right = Some(self.right.take().unwrap().rotate_right());
            }
            return self.rotate_left();
        }
        self
    }
}

/// An AVL tree of disjoint half-open intervals over the Unicode code-point
/// space, assigning each a dense class id once [finalize][RangeMap::finalize]
/// is called.
pub struct RangeMap {
    root: Option<Box<Node>>,
    finalized: bool,
    debug: Option<Log<&'static str>>,
}

impl BuildLogger for RangeMap {
    fn debug_label(&self) -> Option<&Log<&'static str>> {
        self.debug.as_ref()
    }
}

impl Default for RangeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeMap {
    pub fn new() -> Self {
        Self {
            root: None,
            finalized: false,
            debug: None,
        }
    }

    pub fn with_debug_label(mut self, label: Log<&'static str>) -> Self {
        self.debug = Some(label);
        self
    }

    /// Insert `[lo, hi)`, splitting any overlapping existing interval along
    /// every boundary so the tree remains a disjoint partition. Panics on
    /// out-of-range or empty intervals: callers must have already validated
    /// the regex class bounds.
    pub fn insert(&mut self, lo: u32, hi: u32) {
        assert!(lo < hi, "empty interval [{}, {})", lo, hi);
        assert!(hi <= FULL_RANGE_HI, "interval [{}, {}) out of range", lo, hi);
        self.finalized = false;
        self.log_enter("insert");
        let root = self.root.take();
        self.root = Some(Self::insert_into(root, lo, hi));
        self.log_success("insert", (lo, hi));
    }

    fn insert_into(node: Option<Box<Node>>, lo: u32, hi: u32) -> Box<Node> {
        let mut node = match node {
            None => return Box::new(Node::leaf(lo, hi)),
            Some(n) => n,
        };

        // Prune: this interval cannot overlap anything in a subtree whose
        // cached bounds don't reach it.
        if hi <= node.subtree_min || lo >= node.subtree_max {
            if hi <= node.lo {
                node.left = Some(Self::insert_into(node.left.take(), lo, hi));
            } else {
                node.right = Some(Self::insert_into(node.right.take(), lo, hi));
            }
            return node.rebalance();
        }

        if hi <= node.lo {
            node.left = Some(Self::insert_into(node.left.take(), lo, hi));
            return node.rebalance();
        }
        if lo >= node.hi {
            node.right = Some(Self::insert_into(node.right.take(), lo, hi));
            return node.rebalance();
        }

        // Overlap with this node: split into up to three pieces and
        // reinsert each piece (the middle piece, shared by both, collapses
        // to a single node since it's identical on both sides).
        let (node_lo, node_hi) = (node.lo, node.hi);
        let left_child = node.left.take();
        let right_child = node.right.take();

        let mut pieces: Vec<(u32, u32)> = Vec::with_capacity(3);
        let overlap_lo = lo.max(node_lo);
        let overlap_hi = hi.min(node_hi);
        if node_lo < overlap_lo {
            pieces.push((node_lo, overlap_lo));
        }
        pieces.push((overlap_lo, overlap_hi));
        if overlap_hi < node_hi {
            pieces.push((overlap_hi, node_hi));
        }
        if lo < overlap_lo {
            pieces.push((lo, overlap_lo));
        }
        if overlap_hi < hi {
            pieces.push((overlap_hi, hi));
        }

        let mut rebuilt = Self::rebuild_leaves(left_child, right_child);
        for (piece_lo, piece_hi) in pieces {
            rebuilt = Some(Self::insert_into(rebuilt, piece_lo, piece_hi));
        }
        rebuilt.expect("at least one piece was inserted")
    }

    /// Re-fold a node's two children (minus the node itself, which was just
    /// split into pieces) back into a single subtree by reinserting one
    /// side into the other.
    fn rebuild_leaves(left: Option<Box<Node>>, right: Option<Box<Node>>) -> Option<Box<Node>> {
        match (left, right) {
            (None, None) => None,
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (Some(l), Some(r)) => {
                let mut pieces = Vec::new();
                Self::in_order_collect(&r, &mut |lo, hi| pieces.push((lo, hi)));
                let mut root = Some(l);
                for (lo, hi) in pieces {
                    root = Some(Self::insert_into(root, lo, hi));
                }
                root
            }
        }
    }

    fn in_order_collect(node: &Node, visit: &mut impl FnMut(u32, u32)) {
        if let Some(l) = &node.left {
            Self::in_order_collect(l, visit);
        }
        visit(node.lo, node.hi);
        if let Some(r) = &node.right {
            Self::in_order_collect(r, visit);
        }
    }

    /// Assign dense class ids in left-to-right order. Idempotent: calling
    /// twice without an intervening `insert` reassigns the same ids.
    pub fn finalize(&mut self) {
        self.log_enter("finalize");
        let mut next_id = 0u32;
        Self::assign_ids(&mut self.root, &mut next_id);
        self.finalized = true;
        self.log_result("finalize", next_id);
    }

    fn assign_ids(node: &mut Option<Box<Node>>, next_id: &mut u32) {
        if let Some(n) = node {
            Self::assign_ids(&mut n.left, next_id);
            n.class_id = Some(*next_id);
            *next_id += 1;
            Self::assign_ids(&mut n.right, next_id);
        }
    }

    /// Look up the class id of a code point. Requires [finalize] to have
    /// been called since the last [insert]; returns `None` for a code point
    /// not covered by any inserted interval.
    pub fn search(&self, code_point: u32) -> Option<u32> {
        debug_assert!(self.finalized, "search before finalize");
        Self::search_in(&self.root, code_point)
    }

    fn search_in(node: &Option<Box<Node>>, code_point: u32) -> Option<u32> {
        let n = node.as_ref()?;
        if code_point < n.subtree_min || code_point >= n.subtree_max {
            return None;
        }
        if code_point < n.lo {
            Self::search_in(&n.left, code_point)
        } else if code_point >= n.hi {
            Self::search_in(&n.right, code_point)
        } else {
            n.class_id
        }
    }

    /// In-order traversal yielding `(lo, hi, class_id)` for every interval.
    pub fn intervals(&self) -> Vec<(u32, u32, u32)> {
        let mut out = Vec::new();
        Self::collect_intervals(&self.root, &mut out);
        out
    }

    fn collect_intervals(node: &Option<Box<Node>>, out: &mut Vec<(u32, u32, u32)>) {
        if let Some(n) = node {
            Self::collect_intervals(&n.left, out);
            out.push((n.lo, n.hi, n.class_id.unwrap_or(u32::MAX)));
            Self::collect_intervals(&n.right, out);
        }
    }

    /// Rebuild a [RangeMap] from a previously-persisted `(lo, hi, class_id)`
    /// sequence (spec round-trip property), in in-order sequence.
    pub fn from_intervals(intervals: &[(u32, u32, u32)]) -> Self {
        let mut map = Self::new();
        for &(lo, hi, _) in intervals {
            let root = map.root.take();
            map.root = Some(Self::insert_into(root, lo, hi));
        }
        let mut next_id = 0u32;
        Self::assign_ids(&mut map.root, &mut next_id);
        map.finalized = true;
        map
    }

    pub fn class_count(&self) -> u32 {
        self.intervals().len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_after_overlapping_inserts() {
        let mut map = RangeMap::new();
        map.insert(10, 30);
        map.insert(20, 40);
        map.insert(0, 15);
        map.finalize();

        let intervals = map.intervals();
        for pair in intervals.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlap: {:?}", pair);
        }
        // every boundary point that was inserted should appear in the partition
        let los: Vec<u32> = intervals.iter().map(|(lo, _, _)| *lo).collect();
        assert!(los.contains(&0));
        assert!(los.contains(&10));
        assert!(los.contains(&20));
        assert!(los.contains(&30));
    }

    #[test]
    fn search_resolves_to_class_id() {
        let mut map = RangeMap::new();
        map.insert(b'a' as u32, b'z' as u32 + 1);
        map.insert(b'0' as u32, b'9' as u32 + 1);
        map.finalize();

        let digit_class = map.search(b'5' as u32).unwrap();
        let alpha_class = map.search(b'q' as u32).unwrap();
        assert_ne!(digit_class, alpha_class);
        assert_eq!(map.search(b'5' as u32).unwrap(), digit_class);
        assert!(map.search(b' ' as u32).is_none());
    }

    #[test]
    fn round_trips_through_intervals() {
        let mut map = RangeMap::new();
        map.insert(5, 10);
        map.insert(20, 25);
        map.finalize();
        let rebuilt = RangeMap::from_intervals(&map.intervals());
        assert_eq!(rebuilt.intervals(), map.intervals());
    }
}
