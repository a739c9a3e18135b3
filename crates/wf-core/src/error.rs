//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a core
//! operation (config parsing, vehicle lookup) can fail inside them.

use thiserror::Error;

/// Errors produced by `wf-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown vehicle class {0:?}")]
    UnknownVehicle(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `wf-core`.
pub type CoreResult<T> = Result<T, CoreError>;
