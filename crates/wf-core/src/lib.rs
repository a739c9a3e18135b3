//! `wf-core` — foundational types for the `wayfare` routing engine.
//!
//! This crate is a dependency of every other `wf-*` crate.  It has no `wf-*`
//! dependencies and minimal external ones (`thiserror`, `serde`, `toml`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `NodeId` (persistent / ephemeral), `EdgeKey`, `ScenarioId` |
//! | [`geo`]       | `Point` — planar map coordinates                        |
//! | [`vehicle`]   | `VehicleClass` enum                                     |
//! | [`config`]    | `EngineConfig`, `CoordinateFrame`                       |
//! | [`error`]     | `CoreError`, `CoreResult`                               |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{CoordinateFrame, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{EdgeKey, NodeId, ScenarioId};
pub use vehicle::VehicleClass;
