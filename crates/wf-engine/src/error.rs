use thiserror::Error;

use wf_core::{CoreError, VehicleClass};
use wf_graph::GraphError;
use wf_scenario::ScenarioError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("no graph loaded for vehicle class {0}")]
    NotLoaded(VehicleClass),

    /// A rollback failed earlier; the graph is kept as-is for diagnosis and
    /// refuses further work until it is reloaded.
    #[error("graph for vehicle class {0} is corrupted")]
    Corrupted(VehicleClass),

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("thread pool error: {0}")]
    ThreadPool(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),
}

impl EngineError {
    /// `true` if the error came from a broken rollback protocol.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            EngineError::Graph(e) => e.is_invariant_violation(),
            EngineError::Scenario(ScenarioError::Graph(_)) => true,
            EngineError::Corrupted(_) => true,
            _ => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
