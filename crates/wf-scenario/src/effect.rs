//! Affected-edge selection and penalty application for one vehicle graph.
//!
//! Selection runs inside an [`EdgeTransaction`]: circle boundaries split the
//! edges they cross, and the committed log is kept so the topology can be
//! restored when the scenario is removed.  Penalties are applied after the
//! commit and are never logged; removal resets every current weight instead
//! of dividing penalties back out.

use rustc_hash::FxHashSet;
use tracing::debug;

use wf_core::{EdgeKey, NodeId, Point};
use wf_graph::geometry::{classify_circle_segment, segments_intersect, CircleCoverage};
use wf_graph::{EdgeTransaction, GraphError, GraphStore, TransactionLog};

use crate::request::Disturbance;
use crate::ScenarioResult;

/// What one scenario did to one vehicle graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioEffect {
    /// Penalised edges, sorted.  Includes sub-edges created by clipping.
    pub affected: Vec<EdgeKey>,
    /// Structural changes (splits) made while selecting.
    pub log: TransactionLog,
}

impl ScenarioEffect {
    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    pub fn split_count(&self) -> usize {
        self.log.splits().count()
    }
}

/// Select the edges `disturbance` affects, then multiply their current
/// weights by `penalty`.
pub fn apply_disturbance(
    store: &mut GraphStore,
    disturbance: &Disturbance,
    penalty: f64,
) -> ScenarioResult<ScenarioEffect> {
    let mut txn = EdgeTransaction::begin(store);
    let selected = match *disturbance {
        Disturbance::Line { start, end } => Ok(select_line(txn.store(), start, end)),
        Disturbance::Circle { center, radius } => select_circle(&mut txn, center, radius),
    };
    let mut affected = match selected {
        Ok(edges) => edges,
        Err(e) => {
            txn.rollback()?;
            return Err(e.into());
        }
    };
    let log = txn.commit();

    affected.sort_unstable();
    affected.dedup();
    for &edge in &affected {
        store.multiply_current_weight(edge, penalty);
    }
    debug!(affected = affected.len(), splits = log.splits().count(), penalty, "disturbance applied");
    Ok(ScenarioEffect { affected, log })
}

// ── Line ──────────────────────────────────────────────────────────────────────

/// Every edge whose segment intersects the line, whole.
fn select_line(store: &GraphStore, start: Point, end: Point) -> Vec<EdgeKey> {
    store
        .segments()
        .filter(|&(_, a, b)| segments_intersect(a, b, start, end))
        .map(|(key, _, _)| key)
        .collect()
}

// ── Circle ────────────────────────────────────────────────────────────────────

/// Edges inside the circle, clipping the ones that cross its boundary.
///
/// Iterates over a sorted key snapshot taken before any split.  When an edge
/// is clipped its reverse twin is clipped through the same nodes, so the
/// twin's key is marked visited and its pieces are classified here too.
fn select_circle(
    txn: &mut EdgeTransaction<'_>,
    center: Point,
    radius: f64,
) -> Result<Vec<EdgeKey>, GraphError> {
    let r_sq = radius * radius;
    let keys = txn.store().edge_keys();
    let mut visited: FxHashSet<EdgeKey> = FxHashSet::default();
    let mut affected = Vec::new();

    for key in keys {
        if !visited.insert(key) {
            continue;
        }
        let Some((a, b)) = txn.store().segment(key) else { continue };

        match classify_circle_segment(center, radius, a, b) {
            CircleCoverage::Inside => affected.push(key),
            CircleCoverage::Outside => {}
            CircleCoverage::Partial(roots) => {
                let twin = key.reversed();
                let two_way = txn.store().contains_edge(twin);
                if two_way {
                    visited.insert(twin);
                }

                // from → n₁ → … → nₖ → to
                let mut chain: Vec<NodeId> = vec![key.from];
                let mut rest = key;
                for t in roots {
                    let record = txn.split_edge(rest, a.lerp(b, t))?;
                    chain.push(record.node);
                    rest = record.forward_parts()[1];
                }
                chain.push(key.to);

                for pair in chain.windows(2) {
                    let (u, v) = (pair[0], pair[1]);
                    let (Some(pu), Some(pv)) = (txn.store().position(u), txn.store().position(v)) else {
                        continue;
                    };
                    if pu.midpoint(pv).distance_sq(center) <= r_sq {
                        affected.push(EdgeKey { from: u, to: v });
                        if two_way {
                            affected.push(EdgeKey { from: v, to: u });
                        }
                    }
                }
                debug!(edge = %key, pieces = chain.len() - 1, "clipped edge at circle boundary");
            }
        }
    }
    Ok(affected)
}
