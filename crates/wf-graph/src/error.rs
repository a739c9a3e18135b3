//! Graph-subsystem error type.

use thiserror::Error;

use wf_core::{EdgeKey, NodeId};

/// Errors produced by `wf-graph`.
///
/// Most variants describe a rejected mutation primitive.  [`Rollback`] and
/// [`LeakedNode`] are different in kind: they mean the undo log no longer
/// matches the graph, and the graph must not be used further.
///
/// [`Rollback`]: GraphError::Rollback
/// [`LeakedNode`]: GraphError::LeakedNode
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge {edge} references missing node {node}")]
    MissingEndpoint { edge: EdgeKey, node: NodeId },

    #[error("edge {edge} has invalid weight {weight}")]
    InvalidWeight { edge: EdgeKey, weight: f64 },

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeKey),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeKey),

    #[error("node {0} still has incident edges")]
    NodeInUse(NodeId),

    #[error("rollback failed: {0}")]
    Rollback(Box<GraphError>),

    #[error("ephemeral node {0} outlived its transaction")]
    LeakedNode(NodeId),

    #[error("row parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// `true` if the error indicates a broken mutation/rollback protocol
    /// rather than a rejected request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, GraphError::Rollback(_) | GraphError::LeakedNode(_))
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
