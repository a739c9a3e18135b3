//! The [`RoutingEngine`] facade the request layer talks to.
//!
//! # Locking
//!
//! ```text
//! scenarios : Mutex<ScenarioBook>
//! graphs    : RwLock<BTreeMap<VehicleClass, Arc<Mutex<VehicleGraph>>>>
//! ```
//!
//! Path queries split edges while they run, so even they need exclusive
//! access to their vehicle graph; they take only that graph's mutex.  The
//! map lock is held just long enough to clone the `Arc`.  Scenario
//! operations take the book first, then every graph mutex in
//! `VehicleClass` order.  No lock is ever acquired out of that order, and no
//! I/O happens while one is held.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{error, info, instrument, warn};

use wf_core::{EngineConfig, Point, ScenarioId, VehicleClass};
use wf_graph::{EdgeRow, GraphStore, LoadSummary, NodeRow, PathFinder, PathQuery, PathResult};
use wf_scenario::{
    AppliedScenario, GraphSlot, Preset, ScenarioBook, ScenarioRequest, ScenarioResult, ScenarioSummary,
};

use crate::graph::{GraphStats, NodeSummary, VehicleGraph};
use crate::{EngineError, EngineResult};

type GraphHandle = Arc<Mutex<VehicleGraph>>;

/// Owned routing engine.  Share it behind an `Arc`; every method takes
/// `&self`.
pub struct RoutingEngine {
    config:    EngineConfig,
    finder:    Box<dyn PathFinder>,
    graphs:    RwLock<BTreeMap<VehicleClass, GraphHandle>>,
    scenarios: Mutex<ScenarioBook>,
}

impl RoutingEngine {
    pub(crate) fn from_parts(
        config: EngineConfig,
        finder: Box<dyn PathFinder>,
        graphs: Vec<VehicleGraph>,
    ) -> Self {
        let graphs = graphs
            .into_iter()
            .map(|g| (g.class, Arc::new(Mutex::new(g))))
            .collect();
        Self {
            config,
            finder,
            graphs:    RwLock::new(graphs),
            scenarios: Mutex::new(ScenarioBook::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Graph lifecycle ───────────────────────────────────────────────────

    /// Load (or replace) the graph for `class` from storage rows.
    ///
    /// The store is built before any lock is taken.  Active scenarios are
    /// then re-applied to it so a reloaded class sees the same disturbances
    /// as every other class.
    #[instrument(skip(self, nodes, edges), fields(nodes = nodes.len(), edges = edges.len()))]
    pub fn load_graph(
        &self,
        class: VehicleClass,
        nodes: &[NodeRow],
        edges: &[EdgeRow],
    ) -> EngineResult<LoadSummary> {
        let (mut store, summary) = GraphStore::load(nodes, edges, &self.config.frame);

        let mut book = self.lock_book()?;
        book.replay_onto(class, &mut store)?;
        let graph = VehicleGraph::new(class, store);

        let mut graphs = self.graphs.write().map_err(|_| EngineError::LockPoisoned("graph map"))?;
        if graphs.insert(class, Arc::new(Mutex::new(graph))).is_some() {
            info!(%class, "replaced vehicle graph");
        }
        Ok(summary)
    }

    /// Loaded vehicle classes, in order.
    pub fn vehicle_classes(&self) -> EngineResult<Vec<VehicleClass>> {
        let graphs = self.graphs.read().map_err(|_| EngineError::LockPoisoned("graph map"))?;
        Ok(graphs.keys().copied().collect())
    }

    pub fn graph_stats(&self, class: VehicleClass) -> EngineResult<GraphStats> {
        let handle = self.handle(class)?;
        let graph = lock_graph(&handle)?;
        Ok(graph.stats())
    }

    pub fn node_summaries(&self, class: VehicleClass) -> EngineResult<Vec<NodeSummary>> {
        let handle = self.handle(class)?;
        let graph = lock_graph(&handle)?;
        Ok(graph.node_summaries())
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Lowest-cost route between two points on `class`'s network.
    ///
    /// `speed` defaults to the configured speed for the class.  `Ok(None)`
    /// means no route.  The graph is back in its pre-query state when this
    /// returns, whatever the outcome.
    #[instrument(skip(self))]
    pub fn find_path(
        &self,
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
        class: VehicleClass,
        speed: Option<f64>,
    ) -> EngineResult<Option<PathResult>> {
        let query = PathQuery {
            start: Point::new(start_x, start_y),
            end:   Point::new(end_x, end_y),
            speed: speed.unwrap_or_else(|| self.config.speeds.speed_for(class)),
        };

        let handle = self.handle(class)?;
        let mut guard = lock_graph(&handle)?;
        let graph = &mut *guard;
        if graph.corrupted {
            return Err(EngineError::Corrupted(class));
        }

        match self.finder.find_path(&mut graph.store, &graph.index, &query) {
            Ok(result) => Ok(result),
            Err(e) => {
                if e.is_invariant_violation() {
                    graph.corrupted = true;
                    error!(%class, "path query rollback failed, graph marked corrupted: {e}");
                }
                Err(e.into())
            }
        }
    }

    // ── Scenarios ─────────────────────────────────────────────────────────

    /// Apply a disturbance to every loaded vehicle graph.
    #[instrument(skip(self))]
    pub fn apply_scenario(&self, request: ScenarioRequest) -> EngineResult<AppliedScenario> {
        let mut book = self.lock_book()?;
        self.with_all_graphs(|slots| book.apply(request, slots))
    }

    /// Apply a named preset drawn from `start` to `end`.
    pub fn apply_preset(&self, preset: Preset, start: Point, end: Point) -> EngineResult<AppliedScenario> {
        self.apply_scenario(preset.request(start, end))
    }

    /// Remove a scenario.  `Ok(false)` for an unknown id.
    #[instrument(skip(self))]
    pub fn remove_scenario(&self, id: ScenarioId) -> EngineResult<bool> {
        let mut book = self.lock_book()?;
        if !book.contains(id) {
            warn!(scenario = %id, "remove requested for unknown scenario");
            return Ok(false);
        }
        self.with_all_graphs(|slots| book.remove(id, slots))
    }

    /// Remove every scenario and restore every graph to its loaded state.
    #[instrument(skip(self))]
    pub fn reset_all_scenarios(&self) -> EngineResult<()> {
        let mut book = self.lock_book()?;
        self.with_all_graphs(|slots| book.clear(slots))
    }

    /// Active scenarios in application order.
    pub fn scenarios(&self) -> EngineResult<Vec<ScenarioSummary>> {
        Ok(self.lock_book()?.summaries())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn lock_book(&self) -> EngineResult<MutexGuard<'_, ScenarioBook>> {
        self.scenarios.lock().map_err(|_| EngineError::LockPoisoned("scenario book"))
    }

    fn handle(&self, class: VehicleClass) -> EngineResult<GraphHandle> {
        let graphs = self.graphs.read().map_err(|_| EngineError::LockPoisoned("graph map"))?;
        graphs.get(&class).cloned().ok_or(EngineError::NotLoaded(class))
    }

    /// Run a scenario-book operation with every vehicle graph locked.
    ///
    /// On success every index is rebuilt, since clipping may have added or
    /// removed nodes.  An invariant violation marks every graph corrupted.
    fn with_all_graphs<T>(
        &self,
        op: impl FnOnce(&mut [GraphSlot<'_>]) -> ScenarioResult<T>,
    ) -> EngineResult<T> {
        let handles: Vec<GraphHandle> = {
            let graphs = self.graphs.read().map_err(|_| EngineError::LockPoisoned("graph map"))?;
            graphs.values().cloned().collect()
        };
        let mut guards = handles.iter().map(lock_graph).collect::<EngineResult<Vec<_>>>()?;
        if let Some(bad) = guards.iter().find(|g| g.corrupted) {
            return Err(EngineError::Corrupted(bad.class));
        }

        let mut slots: Vec<GraphSlot<'_>> = guards
            .iter_mut()
            .map(|g| {
                let g = &mut **g;
                (g.class, &mut g.store)
            })
            .collect();
        let outcome = op(&mut slots);
        drop(slots);

        match outcome {
            Ok(value) => {
                for g in guards.iter_mut() {
                    g.rebuild_index();
                }
                Ok(value)
            }
            Err(e) => {
                let e = EngineError::from(e);
                if e.is_invariant_violation() {
                    for g in guards.iter_mut() {
                        g.corrupted = true;
                    }
                    error!("scenario operation failed mid-flight, graphs marked corrupted: {e}");
                }
                Err(e)
            }
        }
    }
}

fn lock_graph(handle: &GraphHandle) -> EngineResult<MutexGuard<'_, VehicleGraph>> {
    handle.lock().map_err(|_| EngineError::LockPoisoned("vehicle graph"))
}
