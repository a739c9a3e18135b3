//! Scenario-subsystem error type.

use thiserror::Error;

use wf_graph::GraphError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("penalty must be finite and at least 1, got {0}")]
    InvalidPenalty(f64),

    #[error("invalid disturbance geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown scenario preset {0:?}")]
    UnknownPreset(String),

    /// Always an invariant violation: selection and restore only issue
    /// mutations that are valid for the current store.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
