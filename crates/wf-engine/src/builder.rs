//! Fluent builder for constructing a [`RoutingEngine`].

use std::collections::BTreeMap;

use tracing::info;

use wf_core::{EngineConfig, VehicleClass};
use wf_graph::{AStarPathFinder, EdgeRow, GraphStore, NodeRow, PathFinder, SearchOptions};

use crate::graph::VehicleGraph;
use crate::{EngineResult, RoutingEngine};

/// Fluent builder for [`RoutingEngine`].
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                   |
/// |-----------------------|-------------------------------------------|
/// | `.config(c)`          | `EngineConfig::default()`                 |
/// | `.graph(class, n, e)` | no graph for `class` (`NotLoaded`)        |
/// | `.path_finder(f)`     | `AStarPathFinder` built from the config   |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new()
///     .config(config)
///     .graph(VehicleClass::Car, car_nodes, car_edges)
///     .graph(VehicleClass::Foot, foot_nodes, foot_edges)
///     .build()?;
/// let route = engine.find_path(0.0, 0.0, 20.0, 0.0, VehicleClass::Car, None)?;
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    config:  EngineConfig,
    sources: BTreeMap<VehicleClass, (Vec<NodeRow>, Vec<EdgeRow>)>,
    finder:  Option<Box<dyn PathFinder>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply the storage rows for one vehicle class.  A second call for the
    /// same class replaces the first.
    pub fn graph(mut self, class: VehicleClass, nodes: Vec<NodeRow>, edges: Vec<EdgeRow>) -> Self {
        self.sources.insert(class, (nodes, edges));
        self
    }

    /// Swap in a different search strategy.
    pub fn path_finder(mut self, finder: impl PathFinder + 'static) -> Self {
        self.finder = Some(Box::new(finder));
        self
    }

    /// Validate the config, load every supplied graph and return a ready
    /// engine.
    ///
    /// With the `parallel` Cargo feature the graphs load concurrently on a
    /// Rayon pool sized by `config.num_threads`.
    pub fn build(self) -> EngineResult<RoutingEngine> {
        self.config.validate()?;

        let finder = self
            .finder
            .unwrap_or_else(|| Box::new(AStarPathFinder::new(SearchOptions::from(&self.config))));

        let sources: Vec<_> = self.sources.into_iter().collect();
        let graphs = load_all(&self.config, sources)?;

        info!(classes = graphs.len(), "routing engine ready");
        Ok(RoutingEngine::from_parts(self.config, finder, graphs))
    }
}

type Source = (VehicleClass, (Vec<NodeRow>, Vec<EdgeRow>));

fn load_one(config: &EngineConfig, (class, (nodes, edges)): Source) -> VehicleGraph {
    let (store, summary) = GraphStore::load(&nodes, &edges, &config.frame);
    info!(
        %class,
        nodes = summary.nodes,
        edges = summary.edges,
        dropped = summary.dropped.len(),
        "vehicle graph loaded"
    );
    VehicleGraph::new(class, store)
}

#[cfg(not(feature = "parallel"))]
fn load_all(config: &EngineConfig, sources: Vec<Source>) -> EngineResult<Vec<VehicleGraph>> {
    Ok(sources.into_iter().map(|s| load_one(config, s)).collect())
}

#[cfg(feature = "parallel")]
fn load_all(config: &EngineConfig, sources: Vec<Source>) -> EngineResult<Vec<VehicleGraph>> {
    use rayon::prelude::*;

    // Collect preserves input order, so graphs stay in class order.
    let run = || -> Vec<VehicleGraph> { sources.into_par_iter().map(|s| load_one(config, s)).collect() };

    match config.num_threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| crate::EngineError::ThreadPool(e.to_string()))?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}
