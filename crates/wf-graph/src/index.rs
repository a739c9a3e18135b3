//! R-tree over node positions.
//!
//! Attachment prefers splitting the nearest road segment; when a query point
//! has no perpendicular foot on any segment (or a vertex is strictly closer)
//! it snaps to the nearest vertex found here.  The index is a snapshot: the
//! owner rebuilds it whenever scenario splits change the node set.  Query
//! attachment nodes are never indexed.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use wf_core::{NodeId, Point};

use crate::store::GraphStore;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── NodeIndex ─────────────────────────────────────────────────────────────────

/// Nearest-vertex lookup for one vehicle graph.
pub struct NodeIndex {
    tree: RTree<NodeEntry>,
}

impl NodeIndex {
    /// Bulk-load an index over every node currently in `store`.
    ///
    /// O(N log N); much faster than N single inserts.
    pub fn build(store: &GraphStore) -> Self {
        let entries: Vec<NodeEntry> = store
            .nodes()
            .map(|(id, pos)| NodeEntry { point: pos.to_array(), id })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// An index with no nodes.
    pub fn empty() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The nearest indexed node to `pos` and its distance.
    ///
    /// Equidistant nodes are resolved by id so the answer does not depend
    /// on tree layout.
    pub fn nearest(&self, pos: Point) -> Option<(NodeId, f64)> {
        let query = pos.to_array();
        let mut iter = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = iter.next()?;
        let mut best = first.id;
        for (entry, d2) in iter {
            if d2 > best_d2 {
                break;
            }
            best = best.min(entry.id);
        }
        Some((best, best_d2.sqrt()))
    }

    /// Up to `k` nearest nodes to `pos`, nearest first.
    pub fn k_nearest(&self, pos: Point, k: usize) -> Vec<NodeId> {
        self.tree
            .nearest_neighbor_iter(&pos.to_array())
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::empty()
    }
}
