//! `wf-scenario` — reversible cost disturbances for the `wayfare` engine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`request`] | `ScenarioKind`, `ScenarioRequest`, `Disturbance`, `Preset`     |
//! | [`effect`]  | affected-edge selection (line / circle with clipping), penalty |
//! | [`book`]    | `ScenarioBook`: active records, removal by reset and replay    |
//! | [`error`]   | `ScenarioError`, `ScenarioResult<T>`                          |
//!
//! # Flow
//!
//! ```text
//! ScenarioRequest ──validate──► Disturbance ──per vehicle graph──►
//!     EdgeTransaction (clip) ─commit─► TransactionLog
//!     multiply_current_weight(affected, penalty)
//!     ScenarioRecord { effects[class] = (affected, log) }
//! ```

pub mod book;
pub mod effect;
pub mod error;
pub mod request;

#[cfg(test)]
mod tests;

pub use book::{AppliedScenario, GraphSlot, ScenarioBook, ScenarioRecord, ScenarioSummary};
pub use effect::{apply_disturbance, ScenarioEffect};
pub use error::{ScenarioError, ScenarioResult};
pub use request::{Disturbance, Preset, ScenarioKind, ScenarioRequest};
