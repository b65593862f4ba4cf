use super::Entries;
use crate::ids::EntryId;

#[derive(Debug)]
struct Node {
    /// Elementary interval indexes covered: `[lo, hi)` over the coordinate table
    lo: usize,
    hi: usize,
    left: Option<usize>,
    right: Option<usize>,
    entries: Entries,
}

impl Node {
    fn new(lo: usize, hi: usize) -> Self {
        Self {
            lo,
            hi,
            left: None,
            right: None,
            entries: Entries::new(),
        }
    }
}

/// Static stabbing index over half-open integer ranges
///
/// Coordinates are `i128` so a range may end at `i64::MAX + 1`. Range boundaries
/// are compressed into a sorted coordinate table; elementary interval `i` is
/// `[coords[i], coords[i + 1])`. Every range is stored on the O(log n) canonical
/// nodes covering it, and a point query collects the node lists along one root-to-leaf
/// path. Children are allocated only when an insertion reaches them.
#[derive(Debug, Default)]
pub struct SegmentTree {
    coords: Vec<i128>,
    nodes: Vec<Node>,
}

impl SegmentTree {
    /// Build from `(l, r, entry)` triples; empty ranges (`l >= r`) are ignored
    pub fn build(ranges: &[(i128, i128, EntryId)]) -> Self {
        let mut coords: Vec<i128> = ranges
            .iter()
            .filter(|(l, r, _)| l < r)
            .flat_map(|&(l, r, _)| [l, r])
            .collect();
        coords.sort_unstable();
        coords.dedup();

        let mut tree = Self {
            coords,
            nodes: Vec::new(),
        };
        if tree.coords.len() < 2 {
            return tree;
        }

        tree.nodes.push(Node::new(0, tree.coords.len() - 1));
        for &(l, r, entry) in ranges.iter().filter(|(l, r, _)| l < r) {
            let lo = tree.coords.partition_point(|&c| c < l);
            let hi = tree.coords.partition_point(|&c| c < r);
            tree.insert(0, lo, hi, entry);
        }
        for node in &mut tree.nodes {
            node.entries.compile();
        }
        tree
    }

    fn insert(&mut self, node: usize, lo: usize, hi: usize, entry: EntryId) {
        let (node_lo, node_hi) = (self.nodes[node].lo, self.nodes[node].hi);
        if lo <= node_lo && node_hi <= hi {
            self.nodes[node].entries.push(entry);
            return;
        }

        let mid = node_lo + (node_hi - node_lo) / 2;
        if lo < mid {
            let child = self.child(node, true);
            self.insert(child, lo, hi, entry);
        }
        if hi > mid {
            let child = self.child(node, false);
            self.insert(child, lo, hi, entry);
        }
    }

    fn child(&mut self, node: usize, left: bool) -> usize {
        let existing = if left {
            self.nodes[node].left
        } else {
            self.nodes[node].right
        };
        if let Some(idx) = existing {
            return idx;
        }

        let (lo, hi) = (self.nodes[node].lo, self.nodes[node].hi);
        let mid = lo + (hi - lo) / 2;
        let idx = self.nodes.len();
        if left {
            self.nodes.push(Node::new(lo, mid));
            self.nodes[node].left = Some(idx);
        } else {
            self.nodes.push(Node::new(mid, hi));
            self.nodes[node].right = Some(idx);
        }
        idx
    }

    /// Non-empty node lists whose ranges contain `x`, tagged with their node index
    pub fn stab(&self, x: i64) -> Vec<(usize, &Entries)> {
        let mut found = Vec::new();
        let x = i128::from(x);
        let (Some(&first), Some(&last)) = (self.coords.first(), self.coords.last()) else {
            return found;
        };
        if self.nodes.is_empty() || x < first || x >= last {
            return found;
        }

        let slot = self.coords.partition_point(|&c| c <= x) - 1;
        let mut cursor = Some(0);
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if !node.entries.is_empty() {
                found.push((idx, &node.entries));
            }
            let mid = node.lo + (node.hi - node.lo) / 2;
            cursor = if slot < mid { node.left } else { node.right };
        }
        found
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn entry_count(&self) -> usize {
        self.nodes.iter().map(|n| n.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
