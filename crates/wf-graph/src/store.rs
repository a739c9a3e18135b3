//! Per-vehicle road graph storage.
//!
//! # Data layout
//!
//! Unlike a frozen CSR graph, the store has to accept edge splits while it is
//! being routed over, so it keeps four hash maps:
//!
//! ```text
//! positions : NodeId  → Point
//! adjacency : NodeId  → Vec<NodeId>      (ordered successor list)
//! original  : EdgeKey → f64              (length-derived base cost)
//! current   : EdgeKey → f64              (original × active penalties)
//! ```
//!
//! Every node has an adjacency entry (possibly empty).  Every weight key has
//! both endpoints in `positions`, and every listed successor has a weight
//! entry.  The mutation primitives below preserve those invariants or fail
//! without touching the maps.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use wf_core::{CoordinateFrame, EdgeKey, NodeId, Point};

use crate::loader::{EdgeRow, NodeRow};
use crate::{GraphError, GraphResult};

// ── EdgeWeights ───────────────────────────────────────────────────────────────

/// Original and currently effective cost of one directed edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeWeights {
    pub original: f64,
    pub current:  f64,
}

impl EdgeWeights {
    /// Unpenalised weights: `current == original`.
    #[inline]
    pub fn uniform(weight: f64) -> Self {
        Self { original: weight, current: weight }
    }

    /// Active penalty multiplier, `current / original`.  A zero-cost edge
    /// reports 1.0 rather than dividing by zero.
    #[inline]
    pub fn penalty_ratio(self) -> f64 {
        if self.original == 0.0 { 1.0 } else { self.current / self.original }
    }

    /// The share `fraction` of this edge, keeping the penalty ratio.
    #[inline]
    pub fn portion(self, fraction: f64) -> Self {
        let original = self.original * fraction;
        Self { original, current: original * self.penalty_ratio() }
    }
}

// ── LoadSummary ───────────────────────────────────────────────────────────────

/// Outcome of [`GraphStore::load`].
///
/// Rows that cannot be loaded are reported here and skipped; they never
/// abort the load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub nodes:   usize,
    pub edges:   usize,
    pub dropped: Vec<GraphError>,
}

// ── GraphStore ────────────────────────────────────────────────────────────────

/// Directed weighted road graph for one vehicle class.
///
/// Equality compares the graph content (positions, adjacency order and both
/// weight maps) and ignores bookkeeping such as the transaction generation
/// counter, so `before == after` is exactly the rollback guarantee.
#[derive(Clone, Debug)]
pub struct GraphStore {
    positions: FxHashMap<NodeId, Point>,
    adjacency: FxHashMap<NodeId, Vec<NodeId>>,
    in_degree: FxHashMap<NodeId, usize>,
    original:  FxHashMap<EdgeKey, f64>,
    current:   FxHashMap<EdgeKey, f64>,

    /// Lower bound on `weight / euclidean length` over every edge ever
    /// inserted.  Scales the A* heuristic so it never overestimates.
    heuristic_scale: f64,
    /// Product of every sub-1 factor applied since the last weight reset.
    /// Current weights never fall below `original × discount`.
    discount:        f64,

    next_generation: u32,
}

impl GraphStore {
    /// An empty graph.
    pub fn new() -> Self {
        Self {
            positions:       FxHashMap::default(),
            adjacency:       FxHashMap::default(),
            in_degree:       FxHashMap::default(),
            original:        FxHashMap::default(),
            current:         FxHashMap::default(),
            heuristic_scale: f64::INFINITY,
            discount:        1.0,
            next_generation: 0,
        }
    }

    /// Bulk-build a graph from storage rows.
    ///
    /// Positions are converted with `frame`.  Duplicate node rows keep the
    /// first occurrence.  Edges referencing a missing node, duplicate edges
    /// and edges with a negative or non-finite weight are dropped and
    /// reported in the returned [`LoadSummary`].
    pub fn load(nodes: &[NodeRow], edges: &[EdgeRow], frame: &CoordinateFrame) -> (Self, LoadSummary) {
        let mut store = GraphStore::with_capacity(nodes.len(), edges.len());
        let mut summary = LoadSummary::default();

        for row in nodes {
            let id = NodeId::Persistent(row.id);
            match store.insert_node(id, frame.to_engine(row.x, row.y)) {
                Ok(()) => summary.nodes += 1,
                Err(e) => {
                    warn!(node = %id, "dropping node row: {e}");
                    summary.dropped.push(e);
                }
            }
        }

        for row in edges {
            let key = EdgeKey::new(row.node_from, row.node_to);
            let result = if !(row.weight.is_finite() && row.weight >= 0.0) {
                Err(GraphError::InvalidWeight { edge: key, weight: row.weight })
            } else {
                store.insert_edge(key, EdgeWeights::uniform(row.weight))
            };
            match result {
                Ok(()) => summary.edges += 1,
                Err(e) => {
                    warn!(edge = %key, "dropping edge row: {e}");
                    summary.dropped.push(e);
                }
            }
        }

        info!(
            nodes   = summary.nodes,
            edges   = summary.edges,
            dropped = summary.dropped.len(),
            "graph loaded"
        );
        (store, summary)
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            positions: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            adjacency: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            in_degree: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            original:  FxHashMap::with_capacity_and_hasher(edges, Default::default()),
            current:   FxHashMap::with_capacity_and_hasher(edges, Default::default()),
            ..Self::new()
        }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    #[inline]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    #[inline]
    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.original.contains_key(&key)
    }

    /// Successors of `id` in insertion order.  Empty for unknown nodes.
    #[inline]
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn out_degree(&self, id: NodeId) -> usize {
        self.neighbors(id).len()
    }

    #[inline]
    pub fn original_weight(&self, key: EdgeKey) -> Option<f64> {
        self.original.get(&key).copied()
    }

    #[inline]
    pub fn current_weight(&self, key: EdgeKey) -> Option<f64> {
        self.current.get(&key).copied()
    }

    #[inline]
    pub fn weights(&self, key: EdgeKey) -> Option<EdgeWeights> {
        Some(EdgeWeights {
            original: self.original_weight(key)?,
            current:  self.current_weight(key)?,
        })
    }

    /// Endpoint positions of `key`.
    #[inline]
    pub fn segment(&self, key: EdgeKey) -> Option<(Point, Point)> {
        if !self.contains_edge(key) {
            return None;
        }
        Some((self.position(key.from)?, self.position(key.to)?))
    }

    /// Lower bound on `current weight / euclidean length` over every edge.
    ///
    /// The original-weight bound, lowered by any discount (factor below 1)
    /// applied since the last [`reset_current_weights`](Self::reset_current_weights).
    /// 1.0 for a graph without edges of positive length.
    pub fn heuristic_scale(&self) -> f64 {
        let base = if self.heuristic_scale.is_finite() { self.heuristic_scale } else { 1.0 };
        base * self.discount
    }

    // ── Iteration ─────────────────────────────────────────────────────────

    /// All nodes, in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Point)> + '_ {
        self.positions.iter().map(|(&id, &p)| (id, p))
    }

    /// All edges, in unspecified order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, EdgeWeights)> + '_ {
        self.original.iter().map(|(&key, &original)| {
            let current = self.current.get(&key).copied().unwrap_or(original);
            (key, EdgeWeights { original, current })
        })
    }

    /// Every edge as `(key, from position, to position)`.
    pub fn segments(&self) -> impl Iterator<Item = (EdgeKey, Point, Point)> + '_ {
        self.original.keys().filter_map(|&key| {
            let (a, b) = self.segment(key)?;
            Some((key, a, b))
        })
    }

    /// Sorted snapshot of every edge key.  Scans that split edges iterate
    /// over this instead of the live map.
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        let mut keys: Vec<EdgeKey> = self.original.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    // ── Weight mutation ───────────────────────────────────────────────────

    /// Multiply the current weight of `key` by `factor`.
    ///
    /// Returns `false` (and changes nothing) if the edge does not exist.
    pub fn multiply_current_weight(&mut self, key: EdgeKey, factor: f64) -> bool {
        match self.current.get_mut(&key) {
            Some(w) => {
                *w *= factor;
                if factor < 1.0 {
                    self.discount *= factor;
                }
                true
            }
            None => false,
        }
    }

    /// Set every current weight back to its original weight.  O(E).
    pub fn reset_current_weights(&mut self) {
        for (key, &original) in &self.original {
            if let Some(w) = self.current.get_mut(key) {
                *w = original;
            }
        }
        self.discount = 1.0;
    }

    /// Allocate a fresh generation for a transaction's ephemeral node ids.
    pub fn begin_generation(&mut self) -> u32 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }

    // ── Structural mutation ───────────────────────────────────────────────

    pub fn insert_node(&mut self, id: NodeId, pos: Point) -> GraphResult<()> {
        if self.positions.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.positions.insert(id, pos);
        self.adjacency.insert(id, Vec::new());
        Ok(())
    }

    /// Remove a node that has no incident edges left.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Point> {
        if !self.positions.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        if self.out_degree(id) > 0 || self.in_degree.get(&id).copied().unwrap_or(0) > 0 {
            return Err(GraphError::NodeInUse(id));
        }
        self.adjacency.remove(&id);
        self.in_degree.remove(&id);
        self.positions.remove(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Append a new directed edge to the end of `key.from`'s successor list.
    pub fn insert_edge(&mut self, key: EdgeKey, weights: EdgeWeights) -> GraphResult<()> {
        self.check_new_edge(key)?;
        if let Some(succ) = self.adjacency.get_mut(&key.from) {
            succ.push(key.to);
        }
        self.link(key, weights);
        Ok(())
    }

    /// Remove a directed edge, returning its weights.
    pub fn remove_edge(&mut self, key: EdgeKey) -> GraphResult<EdgeWeights> {
        let weights = self.weights(key).ok_or(GraphError::EdgeNotFound(key))?;
        if let Some(succ) = self.adjacency.get_mut(&key.from) {
            if let Some(slot) = succ.iter().position(|&n| n == key.to) {
                succ.remove(slot);
            }
        }
        self.unlink(key);
        Ok(weights)
    }

    /// Atomically replace `old` with `(old.from, new_to)` carrying `weights`.
    ///
    /// The new successor takes the old successor's slot in `old.from`'s
    /// adjacency list, so replacing back restores the exact original order.
    /// Returns the weights `old` had.
    pub fn replace_edge(&mut self, old: EdgeKey, new_to: NodeId, weights: EdgeWeights) -> GraphResult<EdgeWeights> {
        let previous = self.weights(old).ok_or(GraphError::EdgeNotFound(old))?;
        let new = EdgeKey { from: old.from, to: new_to };
        self.check_new_edge(new)?;

        let succ = self
            .adjacency
            .get_mut(&old.from)
            .ok_or(GraphError::NodeNotFound(old.from))?;
        let slot = succ
            .iter()
            .position(|&n| n == old.to)
            .ok_or(GraphError::EdgeNotFound(old))?;
        succ[slot] = new_to;

        self.unlink(old);
        self.link(new, weights);
        Ok(previous)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn check_new_edge(&self, key: EdgeKey) -> GraphResult<()> {
        for node in [key.from, key.to] {
            if !self.positions.contains_key(&node) {
                return Err(GraphError::MissingEndpoint { edge: key, node });
            }
        }
        if self.original.contains_key(&key) {
            return Err(GraphError::DuplicateEdge(key));
        }
        Ok(())
    }

    /// Weight maps and degree bookkeeping for an edge whose adjacency entry
    /// has already been written.
    fn link(&mut self, key: EdgeKey, weights: EdgeWeights) {
        self.original.insert(key, weights.original);
        self.current.insert(key, weights.current);
        *self.in_degree.entry(key.to).or_insert(0) += 1;

        if let Some((a, b)) = self.segment(key) {
            let len = a.distance(b);
            if len > 0.0 {
                self.heuristic_scale = self.heuristic_scale.min(weights.original / len);
            }
        }
    }

    fn unlink(&mut self, key: EdgeKey) {
        self.original.remove(&key);
        self.current.remove(&key);
        if let Some(d) = self.in_degree.get_mut(&key.to) {
            *d = d.saturating_sub(1);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for GraphStore {
    fn eq(&self, other: &Self) -> bool {
        self.positions == other.positions
            && self.adjacency == other.adjacency
            && self.original == other.original
            && self.current == other.current
    }
}
