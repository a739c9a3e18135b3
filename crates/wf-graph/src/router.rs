//! Point-to-point routing: attachment, A* and result summary.
//!
//! # Query lifecycle
//!
//! ```text
//! begin transaction
//!   attach start ─┐  nearest in-segment projection → split (or reuse an
//!   attach end   ─┘  endpoint); no projection → nearest vertex
//!   A* over current weights
//!   summarise path (positions read while attachment nodes still exist)
//! roll back  ← always, whatever the search returned
//! ```
//!
//! # Cost units
//!
//! `distance` sums **original** weights and `cost` sums **current** weights;
//! both are multiplied by [`SearchOptions::unit_scale`].  A cost above
//! [`SearchOptions::blocked_cost_threshold`] is reported as
//! [`TravelEstimate::Blocked`] instead of a travel time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::debug;

use wf_core::{EdgeKey, EngineConfig, NodeId, Point};

use crate::geometry::nearest_edge_projection;
use crate::index::NodeIndex;
use crate::store::GraphStore;
use crate::transaction::EdgeTransaction;
use crate::GraphResult;

// ── Query / result types ──────────────────────────────────────────────────────

/// A point-to-point request in engine coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathQuery {
    pub start: Point,
    pub end:   Point,
    /// Travel speed in map units per second.  Non-positive or non-finite
    /// speeds are treated as 1.
    pub speed: f64,
}

/// One node of a returned path.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PathNode {
    pub node_id: NodeId,
    pub x:       f64,
    pub y:       f64,
}

/// Travel time derived from the weighted cost.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelEstimate {
    Seconds(f64),
    /// The weighted cost exceeds the blocked threshold; the route exists
    /// but is impassable for practical purposes.
    Blocked,
}

/// A found route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathResult {
    pub path:       Vec<PathNode>,
    pub node_count: usize,
    /// Scaled sum of original weights.
    pub distance:   f64,
    /// Scaled sum of current weights.
    pub cost:       f64,
    pub travel:     TravelEstimate,
}

impl PathResult {
    pub fn is_blocked(&self) -> bool {
        self.travel == TravelEstimate::Blocked
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.path.iter().map(|n| n.node_id).collect()
    }
}

/// Tunables for one path finder.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchOptions {
    pub unit_scale:             f64,
    pub blocked_cost_threshold: f64,
    pub attach_epsilon:         f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SearchOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            unit_scale:             config.unit_scale,
            blocked_cost_threshold: config.blocked_cost_threshold,
            attach_epsilon:         config.attach_epsilon,
        }
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable point-to-point search.
///
/// The store is borrowed mutably because attachment splits edges; an
/// implementation must leave it equal to its input state when it returns,
/// whether it found a path or not.  `Ok(None)` means no route (or an empty
/// graph); `Err` is reserved for invariant violations.
pub trait PathFinder: Send + Sync {
    fn find_path(
        &self,
        store: &mut GraphStore,
        index: &NodeIndex,
        query: &PathQuery,
    ) -> GraphResult<Option<PathResult>>;
}

// ── AStarPathFinder ───────────────────────────────────────────────────────────

/// A* over current weights with a Euclidean heuristic.
///
/// The heuristic is scaled by [`GraphStore::heuristic_scale`] so it never
/// exceeds the true remaining cost, even for edges whose stored weight is
/// shorter than their drawn length.  Factors below 1 lower that scale until
/// the next weight reset, which keeps it admissible under any penalty.
#[derive(Clone, Debug, Default)]
pub struct AStarPathFinder {
    options: SearchOptions,
}

impl AStarPathFinder {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }
}

impl PathFinder for AStarPathFinder {
    fn find_path(
        &self,
        store: &mut GraphStore,
        index: &NodeIndex,
        query: &PathQuery,
    ) -> GraphResult<Option<PathResult>> {
        let mut txn = EdgeTransaction::begin(store);
        let outcome = self.search(&mut txn, index, query);
        // Rollback errors win: they mean the store can no longer be trusted.
        txn.rollback()?;
        outcome
    }
}

impl AStarPathFinder {
    fn search(
        &self,
        txn: &mut EdgeTransaction<'_>,
        index: &NodeIndex,
        query: &PathQuery,
    ) -> GraphResult<Option<PathResult>> {
        let eps = self.options.attach_epsilon;
        let Some(start) = attach(txn, index, query.start, eps)? else {
            debug!(point = %query.start, "start point could not be attached");
            return Ok(None);
        };
        let Some(goal) = attach(txn, index, query.end, eps)? else {
            debug!(point = %query.end, "end point could not be attached");
            return Ok(None);
        };

        let store = txn.store();
        let Some(nodes) = astar(store, start, goal) else {
            debug!(start = %start, goal = %goal, "open set exhausted");
            return Ok(None);
        };
        Ok(Some(self.summarise(store, &nodes, query.speed)))
    }

    fn summarise(&self, store: &GraphStore, nodes: &[NodeId], speed: f64) -> PathResult {
        let (mut distance, mut cost) = (0.0, 0.0);
        for pair in nodes.windows(2) {
            let key = EdgeKey { from: pair[0], to: pair[1] };
            if let Some(w) = store.weights(key) {
                distance += w.original;
                cost     += w.current;
            }
        }
        let distance = distance * self.options.unit_scale;
        let cost     = cost * self.options.unit_scale;

        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        let travel = if cost > self.options.blocked_cost_threshold {
            TravelEstimate::Blocked
        } else {
            TravelEstimate::Seconds(cost / speed)
        };

        let path: Vec<PathNode> = nodes
            .iter()
            .filter_map(|&id| {
                let p = store.position(id)?;
                Some(PathNode { node_id: id, x: p.x, y: p.y })
            })
            .collect();
        PathResult { node_count: path.len(), path, distance, cost, travel }
    }
}

// ── Attachment ────────────────────────────────────────────────────────────────

/// Attach `point` to the graph, splitting the nearest edge when the
/// perpendicular foot lies inside it.
///
/// The nearest vertex wins only when it is strictly closer than the best
/// in-segment projection, or when no such projection exists.
fn attach(
    txn: &mut EdgeTransaction<'_>,
    index: &NodeIndex,
    point: Point,
    eps: f64,
) -> GraphResult<Option<NodeId>> {
    let store = txn.store();
    let best_edge = nearest_edge_projection(point, store.segments(), 1).into_iter().next();
    let best_vertex = index.nearest(point).filter(|&(id, _)| store.contains_node(id));

    let use_edge = best_edge.filter(|hit| best_vertex.map_or(true, |(_, d)| hit.projection.distance <= d));

    match (use_edge, best_vertex) {
        (Some(hit), _) => {
            let t = hit.projection.t;
            if t <= eps {
                return Ok(Some(hit.edge.from));
            }
            if t >= 1.0 - eps {
                return Ok(Some(hit.edge.to));
            }
            let record = txn.split_edge(hit.edge, hit.projection.point)?;
            debug!(point = %point, edge = %hit.edge, node = %record.node, "attached by split");
            Ok(Some(record.node))
        }
        (None, Some((id, _))) => {
            debug!(point = %point, node = %id, "attached to nearest vertex");
            Ok(Some(id))
        }
        (None, None) => Ok(None),
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Open-set entry.  Equal `f` scores pop in insertion order.
#[derive(Copy, Clone, Debug)]
struct OpenEntry {
    f:    f64,
    seq:  u64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f.total_cmp(&other.f).then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Node sequence from `start` to `goal`, or `None` if unreachable.
fn astar(store: &GraphStore, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    if start == goal {
        return Some(vec![start]);
    }
    let goal_pos = store.position(goal)?;
    let scale = store.heuristic_scale();
    let h = |n: NodeId| store.position(n).map_or(0.0, |p| p.distance(goal_pos) * scale);

    let mut g: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut prev: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut closed: FxHashSet<NodeId> = FxHashSet::default();
    // Min-heap via Reverse.
    let mut open: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
    let mut seq = 0u64;

    g.insert(start, 0.0);
    open.push(Reverse(OpenEntry { f: h(start), seq, node: start }));

    while let Some(Reverse(entry)) = open.pop() {
        let node = entry.node;
        if !closed.insert(node) {
            continue;
        }
        if node == goal {
            return Some(reconstruct(&prev, start, goal));
        }
        let g_node = g.get(&node).copied().unwrap_or(f64::INFINITY);

        for &next in store.neighbors(node) {
            if closed.contains(&next) {
                continue;
            }
            let Some(w) = store.current_weight(EdgeKey { from: node, to: next }) else {
                continue;
            };
            let tentative = g_node + w;
            if tentative < g.get(&next).copied().unwrap_or(f64::INFINITY) {
                g.insert(next, tentative);
                prev.insert(next, node);
                seq += 1;
                open.push(Reverse(OpenEntry { f: tentative + h(next), seq, node: next }));
            }
        }
    }
    None
}

fn reconstruct(prev: &FxHashMap<NodeId, NodeId>, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![goal];
    let mut cur = goal;
    while cur != start {
        match prev.get(&cur) {
            Some(&p) => {
                nodes.push(p);
                cur = p;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}
