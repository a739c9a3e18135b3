//! Unit tests for wf-scenario.

#[cfg(test)]
mod helpers {
    use wf_core::{CoordinateFrame, Point, VehicleClass};
    use wf_graph::{EdgeRow, GraphStore, NodeRow};

    use crate::GraphSlot;

    pub fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    pub fn build(nodes: &[(u64, f64, f64)], edges: &[(u64, u64, f64)]) -> GraphStore {
        let nodes: Vec<NodeRow> = nodes.iter().map(|&(id, x, y)| NodeRow { id, x, y }).collect();
        let edges: Vec<EdgeRow> = edges
            .iter()
            .map(|&(node_from, node_to, weight)| EdgeRow { node_from, node_to, weight })
            .collect();
        GraphStore::load(&nodes, &edges, &CoordinateFrame::IDENTITY).0
    }

    /// A(1):(0,0) → B(2):(10,0) → C(3):(20,0), weight 10 each.
    pub fn line() -> GraphStore {
        build(&[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 20.0, 0.0)], &[(1, 2, 10.0), (2, 3, 10.0)])
    }

    /// Two-way road A(1):(0,0) ↔ B(2):(10,0), weight 10.
    pub fn two_way() -> GraphStore {
        build(&[(1, 0.0, 0.0), (2, 10.0, 0.0)], &[(1, 2, 10.0), (2, 1, 10.0)])
    }

    /// Three parallel vertical one-way roads at x = 0, 10, 20 (edges 1→2,
    /// 3→4, 5→6), each of weight 10.
    pub fn ladder() -> GraphStore {
        build(
            &[(1, 0.0, 0.0), (2, 0.0, 10.0), (3, 10.0, 0.0), (4, 10.0, 10.0), (5, 20.0, 0.0), (6, 20.0, 10.0)],
            &[(1, 2, 10.0), (3, 4, 10.0), (5, 6, 10.0)],
        )
    }

    /// A long two-way road from (0,0) to (100,0), weight 100.
    pub fn long_road() -> GraphStore {
        build(&[(1, 0.0, 0.0), (2, 100.0, 0.0)], &[(1, 2, 100.0), (2, 1, 100.0)])
    }

    pub fn car(store: &mut GraphStore) -> Vec<GraphSlot<'_>> {
        vec![(VehicleClass::Car, store)]
    }

    /// Edge content keyed by endpoint positions, so graphs whose ephemeral
    /// ids differ can still be compared.
    pub fn fingerprint(store: &GraphStore) -> Vec<[f64; 6]> {
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

    pub fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod request {
    use super::helpers::p;
    use crate::{Disturbance, Preset, ScenarioError, ScenarioKind, ScenarioRequest};

    #[test]
    fn rain_point_is_threshold_circle() {
        let r = ScenarioRequest::new(ScenarioKind::Rain, p(5.0, 5.0), p(5.0, 5.0), 2.0, 30.0);
        assert_eq!(r.disturbance(), Disturbance::Circle { center: p(5.0, 5.0), radius: 30.0 });
    }

    #[test]
    fn rain_stroke_is_diameter() {
        let r = ScenarioRequest::new(ScenarioKind::Rain, p(0.0, 0.0), p(6.0, 8.0), 2.0, 30.0);
        assert_eq!(r.disturbance(), Disturbance::Circle { center: p(3.0, 4.0), radius: 5.0 });
    }

    #[test]
    fn block_stroke_is_line_and_point_degrades() {
        let r = ScenarioRequest::new(ScenarioKind::Block, p(0.0, 0.0), p(1.0, 1.0), 9.0, 50.0);
        assert_eq!(r.disturbance(), Disturbance::Line { start: p(0.0, 0.0), end: p(1.0, 1.0) });
        let r = ScenarioRequest::new(ScenarioKind::Block, p(2.0, 2.0), p(2.0, 2.0), 9.0, 12.0);
        assert_eq!(r.disturbance(), Disturbance::Circle { center: p(2.0, 2.0), radius: 12.0 });
    }

    #[test]
    fn invalid_penalties_rejected() {
        for penalty in [0.0, -1.0, 0.5, 0.999, f64::NAN, f64::INFINITY] {
            let r = ScenarioRequest::new(ScenarioKind::Rain, p(0.0, 0.0), p(1.0, 0.0), penalty, 1.0);
            assert!(matches!(r.validate(), Err(ScenarioError::InvalidPenalty(_))));
        }
        let neutral = ScenarioRequest::new(ScenarioKind::Rain, p(0.0, 0.0), p(1.0, 0.0), 1.0, 1.0);
        assert!(neutral.validate().is_ok());
    }

    #[test]
    fn non_finite_geometry_rejected() {
        let r = ScenarioRequest::new(ScenarioKind::Block, p(f64::NAN, 0.0), p(1.0, 0.0), 2.0, 1.0);
        assert!(matches!(r.validate(), Err(ScenarioError::InvalidGeometry(_))));
        let r = ScenarioRequest::new(ScenarioKind::Rain, p(0.0, 0.0), p(0.0, 0.0), 2.0, -1.0);
        assert!(matches!(r.validate(), Err(ScenarioError::InvalidGeometry(_))));
    }

    #[test]
    fn presets() {
        assert_eq!("heavy_rain".parse::<Preset>().unwrap(), Preset::HeavyRain);
        assert_eq!("Road-Block".parse::<Preset>().unwrap(), Preset::RoadBlock);
        assert!(matches!("drizzle".parse::<Preset>(), Err(ScenarioError::UnknownPreset(_))));

        let r = Preset::ExtremeRain.request(p(0.0, 0.0), p(0.0, 0.0));
        assert_eq!(r.kind, ScenarioKind::Rain);
        assert_eq!(r.penalty, 5.0);
        assert_eq!(r.threshold, 100.0);
        assert_eq!(Preset::RoadBlock.kind(), ScenarioKind::Block);

        assert_eq!("medium-rain".parse::<Preset>().unwrap(), Preset::MediumRain);
        assert!("light_rain".parse::<Preset>().is_err());
        let penalties: Vec<f64> = Preset::ALL.iter().map(|preset| preset.penalty()).collect();
        assert_eq!(penalties, vec![1.0, 2.0, 5.0, 9_999.0]);
        assert!(Preset::ALL.iter().all(|preset| preset.request(p(0.0, 0.0), p(1.0, 0.0)).validate().is_ok()));
    }

    #[test]
    fn kind_parses() {
        assert_eq!("RAIN".parse::<ScenarioKind>().unwrap(), ScenarioKind::Rain);
        assert!("hail".parse::<ScenarioKind>().is_err());
    }

    #[test]
    fn request_json_defaults_threshold() {
        let json = r#"{"kind":"block","start":{"x":1.0,"y":2.0},"end":{"x":3.0,"y":4.0},"penalty":9.0}"#;
        let r: ScenarioRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.kind, ScenarioKind::Block);
        assert_eq!(r.threshold, 50.0);
    }
}

// ── Affected-edge selection ───────────────────────────────────────────────────

#[cfg(test)]
mod effect {
    use wf_core::{EdgeKey, NodeId};

    use super::helpers::{approx, line, long_road, p, two_way};
    use crate::{apply_disturbance, Disturbance};

    #[test]
    fn line_block_marks_whole_edges_only() {
        let mut s = line();
        let block = Disturbance::Line { start: p(15.0, -5.0), end: p(15.0, 5.0) };
        let effect = apply_disturbance(&mut s, &block, 1000.0).unwrap();
        assert_eq!(effect.affected, vec![EdgeKey::new(2, 3)]);
        assert_eq!(effect.split_count(), 0);
        assert!(effect.log.is_empty());
        assert_eq!(s.current_weight(EdgeKey::new(2, 3)), Some(10_000.0));
        assert_eq!(s.current_weight(EdgeKey::new(1, 2)), Some(10.0));
        assert_eq!(s.node_count(), 3);
    }

    #[test]
    fn line_block_hits_both_directions() {
        let mut s = two_way();
        let block = Disturbance::Line { start: p(5.0, -1.0), end: p(5.0, 1.0) };
        let effect = apply_disturbance(&mut s, &block, 2.0).unwrap();
        assert_eq!(effect.affected, vec![EdgeKey::new(1, 2), EdgeKey::new(2, 1)]);
    }

    #[test]
    fn circle_containing_edge_marks_without_split() {
        let mut s = line();
        // B sits exactly on the boundary, so B → C only touches the circle.
        let rain = Disturbance::Circle { center: p(5.0, 0.0), radius: 5.0 };
        let effect = apply_disturbance(&mut s, &rain, 2.0).unwrap();
        assert_eq!(effect.affected, vec![EdgeKey::new(1, 2)]);
        assert_eq!(effect.split_count(), 0);
        assert_eq!(s.current_weight(EdgeKey::new(1, 2)), Some(20.0));
    }

    #[test]
    fn circle_over_one_endpoint_splits_once() {
        let mut s = line();
        // Covers A and the first 4 units of A → B; B → C stays outside.
        let rain = Disturbance::Circle { center: p(0.0, 0.0), radius: 4.0 };
        let effect = apply_disturbance(&mut s, &rain, 3.0).unwrap();
        assert_eq!(effect.split_count(), 1);
        assert_eq!(effect.affected.len(), 1);

        let inside = effect.affected[0];
        assert_eq!(inside.from, NodeId::Persistent(1));
        assert!(inside.to.is_ephemeral());
        let w = s.weights(inside).unwrap();
        assert!(approx(w.original, 4.0));
        assert!(approx(w.current, 12.0));

        let outside = EdgeKey { from: inside.to, to: NodeId::Persistent(2) };
        let w = s.weights(outside).unwrap();
        assert!(approx(w.original, 6.0));
        assert!(approx(w.current, 6.0));
    }

    #[test]
    fn circle_inside_long_road_clips_both_directions() {
        let mut s = long_road();
        let rain = Disturbance::Circle { center: p(50.0, 0.0), radius: 20.0 };
        let effect = apply_disturbance(&mut s, &rain, 2.0).unwrap();
        assert_eq!(effect.split_count(), 2);
        // Middle piece, both directions.
        assert_eq!(effect.affected.len(), 2);
        for key in &effect.affected {
            let w = s.weights(*key).unwrap();
            assert!(approx(w.original, 40.0));
            assert!(approx(w.current, 80.0));
            assert!(key.from.is_ephemeral() && key.to.is_ephemeral());
        }
        assert_eq!(s.node_count(), 4);
        assert_eq!(s.edge_count(), 6);
        // Original weight is conserved along each direction.
        let total: f64 = s.edges().map(|(_, w)| w.original).sum();
        assert!(approx(total, 200.0));
    }

    #[test]
    fn distant_circle_changes_nothing() {
        let mut s = line();
        let before = s.clone();
        let rain = Disturbance::Circle { center: p(500.0, 500.0), radius: 10.0 };
        let effect = apply_disturbance(&mut s, &rain, 2.0).unwrap();
        assert!(effect.affected.is_empty());
        assert_eq!(s, before);
    }

    #[test]
    fn reverting_effect_log_restores_topology() {
        let mut s = long_road();
        let before = s.clone();
        let rain = Disturbance::Circle { center: p(50.0, 0.0), radius: 20.0 };
        let effect = apply_disturbance(&mut s, &rain, 2.0).unwrap();
        effect.log.revert(&mut s).unwrap();
        s.reset_current_weights();
        assert_eq!(s, before);
    }
}

// ── ScenarioBook ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod book {
    use wf_core::{EdgeKey, ScenarioId, VehicleClass};

    use super::helpers::{approx, car, fingerprint, ladder, line, long_road, p};
    use crate::{apply_disturbance, ScenarioBook, ScenarioError, ScenarioKind, ScenarioRequest};

    fn block(x0: f64, x1: f64, penalty: f64) -> ScenarioRequest {
        ScenarioRequest::new(ScenarioKind::Block, p(x0, 5.0), p(x1, 5.0), penalty, 50.0)
    }

    #[test]
    fn penalties_compound_and_removal_replays() {
        let mut s = ladder();
        let mut book = ScenarioBook::new();
        let (e1, e2, e3) = (EdgeKey::new(1, 2), EdgeKey::new(3, 4), EdgeKey::new(5, 6));

        let a = book.apply(block(-5.0, 15.0, 2.0), &mut car(&mut s)).unwrap();
        let b = book.apply(block(5.0, 25.0, 3.0), &mut car(&mut s)).unwrap();
        assert_eq!(a.affected_edge_count, 2);
        assert_eq!(b.affected_edge_count, 2);
        assert_eq!(s.current_weight(e1), Some(20.0));
        assert_eq!(s.current_weight(e2), Some(60.0));
        assert_eq!(s.current_weight(e3), Some(30.0));

        assert!(book.remove(a.scenario_id, &mut car(&mut s)).unwrap());
        assert_eq!(s.current_weight(e1), Some(10.0));
        assert_eq!(s.current_weight(e2), Some(30.0));
        assert_eq!(s.current_weight(e3), Some(30.0));
        assert_eq!(book.len(), 1);
        assert_eq!(book.records()[0].id, b.scenario_id);
    }

    #[test]
    fn removing_overlapping_rain_matches_fresh_apply() {
        let rain_a = ScenarioRequest::new(ScenarioKind::Rain, p(30.0, 0.0), p(30.0, 0.0), 2.0, 15.0);
        let rain_b = ScenarioRequest::new(ScenarioKind::Rain, p(40.0, 0.0), p(40.0, 0.0), 3.0, 15.0);

        let mut s = long_road();
        let mut book = ScenarioBook::new();
        let a = book.apply(rain_a, &mut car(&mut s)).unwrap();
        book.apply(rain_b, &mut car(&mut s)).unwrap();
        assert!(book.remove(a.scenario_id, &mut car(&mut s)).unwrap());

        let mut fresh = long_road();
        apply_disturbance(&mut fresh, &rain_b.disturbance(), rain_b.penalty).unwrap();
        assert_eq!(fingerprint(&s), fingerprint(&fresh));
    }

    #[test]
    fn overlap_of_two_rains_is_multiplied() {
        let mut s = long_road();
        let mut book = ScenarioBook::new();
        book.apply(
            ScenarioRequest::new(ScenarioKind::Rain, p(30.0, 0.0), p(30.0, 0.0), 2.0, 15.0),
            &mut car(&mut s),
        )
        .unwrap();
        book.apply(
            ScenarioRequest::new(ScenarioKind::Rain, p(40.0, 0.0), p(40.0, 0.0), 3.0, 15.0),
            &mut car(&mut s),
        )
        .unwrap();
        // The stretch 25..45 lies in both circles.
        let overlap = s
            .edges()
            .filter(|(key, _)| {
                let (a, b) = s.segment(*key).unwrap();
                a.x.min(b.x) >= 25.0 - 1e-9 && a.x.max(b.x) <= 45.0 + 1e-9
            })
            .collect::<Vec<_>>();
        assert!(!overlap.is_empty());
        for (_, w) in overlap {
            assert!(approx(w.current, w.original * 6.0));
        }
    }

    #[test]
    fn unknown_id_is_false_and_untouched() {
        let mut s = line();
        let mut book = ScenarioBook::new();
        book.apply(block(15.0, 15.0, 2.0), &mut car(&mut s)).unwrap();
        let before = s.clone();
        assert!(!book.remove(ScenarioId(99), &mut car(&mut s)).unwrap());
        assert_eq!(s, before);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn clear_restores_pristine_graph() {
        let mut s = long_road();
        let pristine = s.clone();
        let mut book = ScenarioBook::new();
        book.apply(ScenarioRequest::new(ScenarioKind::Rain, p(30.0, 0.0), p(50.0, 0.0), 2.0, 0.0), &mut car(&mut s))
            .unwrap();
        book.apply(block(60.0, 60.0, 3.0), &mut car(&mut s)).unwrap();
        assert_ne!(s, pristine);

        book.clear(&mut car(&mut s)).unwrap();
        assert!(book.is_empty());
        assert_eq!(s, pristine);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut s = ladder();
        let mut book = ScenarioBook::new();
        let a = book.apply(block(-5.0, 5.0, 2.0), &mut car(&mut s)).unwrap();
        assert_eq!(a.scenario_id, ScenarioId::FIRST);
        book.remove(a.scenario_id, &mut car(&mut s)).unwrap();
        let b = book.apply(block(-5.0, 5.0, 2.0), &mut car(&mut s)).unwrap();
        assert_eq!(b.scenario_id, ScenarioId(2));
    }

    #[test]
    fn invalid_request_consumes_no_id() {
        let mut s = ladder();
        let before = s.clone();
        let mut book = ScenarioBook::new();
        let err = book.apply(block(-5.0, 5.0, 0.0), &mut car(&mut s)).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidPenalty(_)));
        assert!(book.is_empty());
        assert_eq!(s, before);
        let ok = book.apply(block(-5.0, 5.0, 2.0), &mut car(&mut s)).unwrap();
        assert_eq!(ok.scenario_id, ScenarioId::FIRST);
    }

    #[test]
    fn applies_to_every_class_given() {
        let mut car_graph = ladder();
        let mut foot_graph = line();
        let mut book = ScenarioBook::new();
        let applied = book
            .apply(
                block(-5.0, 25.0, 2.0),
                &mut [(VehicleClass::Car, &mut car_graph), (VehicleClass::Foot, &mut foot_graph)],
            )
            .unwrap();
        // Three ladder rungs; the foot line at y = 0 is not crossed.
        assert_eq!(applied.affected_edge_count, 3);
        let record = &book.records()[0];
        assert_eq!(record.affected_edges(VehicleClass::Car).len(), 3);
        assert!(record.affected_edges(VehicleClass::Foot).is_empty());

        let summary = record.summary();
        assert_eq!(summary.per_class[&VehicleClass::Car], 3);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "block");
        assert_eq!(json["per_class"]["car"], 3);
    }

    #[test]
    fn replay_onto_reloaded_graph() {
        let mut s = ladder();
        let mut book = ScenarioBook::new();
        book.apply(block(-5.0, 15.0, 2.0), &mut car(&mut s)).unwrap();

        let mut reloaded = ladder();
        book.replay_onto(VehicleClass::Car, &mut reloaded).unwrap();
        assert_eq!(reloaded, s);
        assert_eq!(book.records()[0].affected_edges(VehicleClass::Car).len(), 2);
    }
}
