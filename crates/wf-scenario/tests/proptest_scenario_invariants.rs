//! Property-based invariant tests for scenario application and removal.
//!
//! 1. Clearing any sequence of scenarios restores the loaded graph exactly.
//! 2. Removing one scenario leaves the graph identical (up to ephemeral ids)
//!    to applying only the remaining scenarios to a fresh graph.
//! 3. Clipping conserves the original weight of every road.

use proptest::prelude::*;

use wf_core::{CoordinateFrame, Point, VehicleClass};
use wf_graph::{EdgeRow, GraphStore, NodeRow};
use wf_scenario::{apply_disturbance, ScenarioBook, ScenarioKind, ScenarioRequest};

// ── Helpers ─────────────────────────────────────────────────────────────

/// 4×4 two-way grid with 20-unit cells and slightly uneven weights.
fn grid() -> GraphStore {
    let id = |x: u64, y: u64| y * 4 + x + 1;
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for y in 0..4 {
        for x in 0..4 {
            nodes.push(NodeRow { id: id(x, y), x: x as f64 * 20.0, y: y as f64 * 20.0 });
            let w = 20.0 + (x + y) as f64;
            if x + 1 < 4 {
                edges.push(EdgeRow { node_from: id(x, y), node_to: id(x + 1, y), weight: w });
                edges.push(EdgeRow { node_from: id(x + 1, y), node_to: id(x, y), weight: w });
            }
            if y + 1 < 4 {
                edges.push(EdgeRow { node_from: id(x, y), node_to: id(x, y + 1), weight: w });
                edges.push(EdgeRow { node_from: id(x, y + 1), node_to: id(x, y), weight: w });
            }
        }
    }
    GraphStore::load(&nodes, &edges, &CoordinateFrame::IDENTITY).0
}

fn request_strategy() -> impl Strategy<Value = ScenarioRequest> {
    (
        prop::bool::ANY,
        (-10.0f64..70.0, -10.0f64..70.0),
        (-10.0f64..70.0, -10.0f64..70.0),
        1.5f64..5.0,
        5.0f64..30.0,
        prop::bool::weighted(0.3),
    )
        .prop_map(|(rain, (sx, sy), (ex, ey), penalty, threshold, point)| {
            let kind = if rain { ScenarioKind::Rain } else { ScenarioKind::Block };
            let start = Point::new(sx, sy);
            let end = if point { start } else { Point::new(ex, ey) };
            ScenarioRequest::new(kind, start, end, penalty, threshold)
        })
}

fn fingerprint(store: &GraphStore) -> Vec<[f64; 6]> {
    let mut rows: Vec<[f64; 6]> = store
        .edges()
        .filter_map(|(key, w)| {
            let (a, b) = store.segment(key)?;
            Some([a.x, a.y, b.x, b.y, w.original, w.current])
        })
        .collect();
    rows.sort_by(|x, y| {
        x.iter()
            .zip(y.iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Clear restores the loaded graph
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clear_restores_loaded_graph(requests in prop::collection::vec(request_strategy(), 1..5)) {
        let mut store = grid();
        let pristine = store.clone();
        let mut book = ScenarioBook::new();
        for r in &requests {
            book.apply(*r, &mut [(VehicleClass::Car, &mut store)]).unwrap();
        }
        book.clear(&mut [(VehicleClass::Car, &mut store)]).unwrap();
        prop_assert!(store == pristine);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Removal equals fresh replay
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn removal_matches_fresh_replay(
        requests in prop::collection::vec(request_strategy(), 2..5),
        victim in 0usize..4,
    ) {
        let victim = victim % requests.len();

        let mut store = grid();
        let mut book = ScenarioBook::new();
        let mut ids = Vec::new();
        for r in &requests {
            ids.push(book.apply(*r, &mut [(VehicleClass::Car, &mut store)]).unwrap().scenario_id);
        }
        prop_assert!(book.remove(ids[victim], &mut [(VehicleClass::Car, &mut store)]).unwrap());

        let mut fresh = grid();
        for (i, r) in requests.iter().enumerate() {
            if i != victim {
                apply_disturbance(&mut fresh, &r.disturbance(), r.penalty).unwrap();
            }
        }
        prop_assert_eq!(fingerprint(&store), fingerprint(&fresh));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Clipping conserves original weight
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clipping_conserves_original_weight(requests in prop::collection::vec(request_strategy(), 1..5)) {
        let mut store = grid();
        let before: f64 = store.edges().map(|(_, w)| w.original).sum();
        for r in &requests {
            apply_disturbance(&mut store, &r.disturbance(), r.penalty).unwrap();
        }
        let after: f64 = store.edges().map(|(_, w)| w.original).sum();
        prop_assert!((before - after).abs() < 1e-6, "before {} after {}", before, after);
        for (_, w) in store.edges() {
            prop_assert!(w.current >= w.original - 1e-9);
        }
    }
}
