//! Active-scenario bookkeeping.
//!
//! # Removal
//!
//! Penalties compound multiplicatively and later scenarios may clip edges
//! that earlier ones created, so a scenario cannot be subtracted on its own.
//! Removing one rebuilds every touched graph instead:
//!
//! 1. revert every scenario's split log, latest scenario first;
//! 2. reset current weights to original weights;
//! 3. drop the target record;
//! 4. re-apply the remaining scenarios in their original order, recomputing
//!    their affected edges against the pristine topology.
//!
//! [`ScenarioBook::clear`] runs steps 1–2 and empties the book.
//!
//! The book never locks anything itself.  Callers hand it mutable access to
//! every vehicle graph a scenario applies to.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use wf_core::{EdgeKey, Point, ScenarioId, VehicleClass};
use wf_graph::GraphStore;

use crate::effect::{apply_disturbance, ScenarioEffect};
use crate::request::{Disturbance, ScenarioKind, ScenarioRequest};
use crate::ScenarioResult;

/// Mutable access to one vehicle graph for the duration of a book operation.
pub type GraphSlot<'a> = (VehicleClass, &'a mut GraphStore);

// ── Records ───────────────────────────────────────────────────────────────────

/// One active scenario.
#[derive(Clone, Debug)]
pub struct ScenarioRecord {
    pub id:          ScenarioId,
    pub request:     ScenarioRequest,
    pub disturbance: Disturbance,
    /// Per vehicle class: affected edges and the split log.
    pub effects:     BTreeMap<VehicleClass, ScenarioEffect>,
}

impl ScenarioRecord {
    pub fn affected_edge_count(&self) -> usize {
        self.effects.values().map(ScenarioEffect::affected_count).sum()
    }

    pub fn affected_edges(&self, class: VehicleClass) -> &[EdgeKey] {
        self.effects.get(&class).map_or(&[], |e| e.affected.as_slice())
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            id:             self.id,
            kind:           self.request.kind,
            start:          self.request.start,
            end:            self.request.end,
            penalty:        self.request.penalty,
            threshold:      self.request.threshold,
            affected_edges: self.affected_edge_count(),
            per_class:      self.effects.iter().map(|(&c, e)| (c, e.affected_count())).collect(),
        }
    }
}

/// Serialisable view of a record for listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub id:             ScenarioId,
    pub kind:           ScenarioKind,
    pub start:          Point,
    pub end:            Point,
    pub penalty:        f64,
    pub threshold:      f64,
    pub affected_edges: usize,
    pub per_class:      BTreeMap<VehicleClass, usize>,
}

/// Result of [`ScenarioBook::apply`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedScenario {
    pub scenario_id:         ScenarioId,
    pub affected_edge_count: usize,
}

// ── ScenarioBook ──────────────────────────────────────────────────────────────

/// Active scenarios in application order.
#[derive(Debug)]
pub struct ScenarioBook {
    records: Vec<ScenarioRecord>,
    next_id: ScenarioId,
}

impl Default for ScenarioBook {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBook {
    pub fn new() -> Self {
        Self { records: Vec::new(), next_id: ScenarioId::FIRST }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    pub fn get(&self, id: ScenarioId) -> Option<&ScenarioRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: ScenarioId) -> bool {
        self.get(id).is_some()
    }

    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.records.iter().map(ScenarioRecord::summary).collect()
    }

    /// Apply a new scenario to every graph in `graphs` and record it.
    pub fn apply(
        &mut self,
        request: ScenarioRequest,
        graphs: &mut [GraphSlot<'_>],
    ) -> ScenarioResult<AppliedScenario> {
        request.validate()?;
        let disturbance = request.disturbance();

        let mut effects = BTreeMap::new();
        for (class, store) in graphs.iter_mut() {
            let effect = apply_disturbance(store, &disturbance, request.penalty)?;
            effects.insert(*class, effect);
        }

        let id = self.next_id;
        self.next_id = id.next();
        let record = ScenarioRecord { id, request, disturbance, effects };
        let applied = AppliedScenario { scenario_id: id, affected_edge_count: record.affected_edge_count() };
        info!(
            scenario = %id,
            kind     = %request.kind,
            penalty  = request.penalty,
            affected = applied.affected_edge_count,
            "scenario applied"
        );
        self.records.push(record);
        Ok(applied)
    }

    /// Remove scenario `id`, rebuilding every graph from pristine topology.
    ///
    /// Returns `Ok(false)` for an unknown id without touching any graph.
    pub fn remove(&mut self, id: ScenarioId, graphs: &mut [GraphSlot<'_>]) -> ScenarioResult<bool> {
        let Some(pos) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        for (class, store) in graphs.iter_mut() {
            unwind(&mut self.records, *class, store)?;
        }
        self.records.remove(pos);
        for (class, store) in graphs.iter_mut() {
            replay(&mut self.records, *class, store)?;
        }
        info!(scenario = %id, remaining = self.records.len(), "scenario removed");
        Ok(true)
    }

    /// Remove every scenario and restore every graph to its loaded state.
    pub fn clear(&mut self, graphs: &mut [GraphSlot<'_>]) -> ScenarioResult<()> {
        for (class, store) in graphs.iter_mut() {
            unwind(&mut self.records, *class, store)?;
        }
        let cleared = self.records.len();
        self.records.clear();
        info!(cleared, "all scenarios cleared");
        Ok(())
    }

    /// Apply every active scenario, in order, to a freshly loaded graph.
    ///
    /// Any previous effect of the records on `class` is discarded; the caller
    /// guarantees `store` carries none of it.
    pub fn replay_onto(&mut self, class: VehicleClass, store: &mut GraphStore) -> ScenarioResult<()> {
        for record in &mut self.records {
            record.effects.remove(&class);
        }
        replay(&mut self.records, class, store)
    }
}

// ── Restore / replay ──────────────────────────────────────────────────────────

/// Revert every record's split log for `class`, latest first, then reset
/// weights.  The records keep no effect for `class` afterwards.
fn unwind(records: &mut [ScenarioRecord], class: VehicleClass, store: &mut GraphStore) -> ScenarioResult<()> {
    for record in records.iter_mut().rev() {
        if let Some(effect) = record.effects.remove(&class) {
            effect.log.revert(store)?;
        }
    }
    store.reset_current_weights();
    Ok(())
}

fn replay(records: &mut [ScenarioRecord], class: VehicleClass, store: &mut GraphStore) -> ScenarioResult<()> {
    for record in records.iter_mut() {
        let effect = apply_disturbance(store, &record.disturbance, record.request.penalty)?;
        record.effects.insert(class, effect);
    }
    Ok(())
}
