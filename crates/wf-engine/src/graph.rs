//! One vehicle class's graph and its derived lookup structures.

use serde::Serialize;

use wf_core::{NodeId, VehicleClass};
use wf_graph::{GraphStore, NodeIndex};

/// Everything guarded by one vehicle-class lock.
pub(crate) struct VehicleGraph {
    pub(crate) class:     VehicleClass,
    pub(crate) store:     GraphStore,
    pub(crate) index:     NodeIndex,
    /// Set when a rollback failed; the store no longer matches its logs.
    pub(crate) corrupted: bool,
}

impl VehicleGraph {
    pub(crate) fn new(class: VehicleClass, store: GraphStore) -> Self {
        let index = NodeIndex::build(&store);
        Self { class, store, index, corrupted: false }
    }

    /// Re-index after a topology change.
    pub(crate) fn rebuild_index(&mut self) {
        self.index = NodeIndex::build(&self.store);
    }

    pub(crate) fn stats(&self) -> GraphStats {
        GraphStats {
            class:           self.class,
            nodes:           self.store.node_count(),
            edges:           self.store.edge_count(),
            scenario_nodes:  self.store.nodes().filter(|(id, _)| id.is_ephemeral()).count(),
            penalised_edges: self.store.edges().filter(|(_, w)| w.current != w.original).count(),
        }
    }

    /// Every node with its position and out-degree, sorted by id.
    pub(crate) fn node_summaries(&self) -> Vec<NodeSummary> {
        let mut nodes: Vec<NodeSummary> = self
            .store
            .nodes()
            .map(|(id, p)| NodeSummary {
                node_id:    id,
                x:          p.x,
                y:          p.y,
                out_degree: self.store.out_degree(id),
            })
            .collect();
        nodes.sort_unstable_by_key(|n| n.node_id);
        nodes
    }
}

/// Size and scenario footprint of one vehicle graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub class:           VehicleClass,
    pub nodes:           usize,
    pub edges:           usize,
    /// Nodes inserted by active scenarios' boundary clipping.
    pub scenario_nodes:  usize,
    pub penalised_edges: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node_id:    NodeId,
    pub x:          f64,
    pub y:          f64,
    pub out_degree: usize,
}
