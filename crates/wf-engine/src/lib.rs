//! `wf-engine` — thread-safe routing facade for the `wayfare` engine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`builder`] | `EngineBuilder`: config, per-class rows, parallel load      |
//! | [`engine`]  | `RoutingEngine`: path queries and the scenario lifecycle    |
//! | [`graph`]   | `VehicleGraph` (store + node index), `GraphStats`           |
//! | [`error`]   | `EngineError`, `EngineResult<T>`                           |
//!
//! # Concurrency
//!
//! ```text
//! find_path(class)      ─► lock graph[class]          ─► split, search, rollback
//! apply / remove / reset ─► lock book ─► lock graph[*] ─► mutate, re-index
//! ```
//!
//! Queries on different vehicle classes run concurrently.  Scenario
//! operations serialise against everything.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Loads vehicle graphs on a Rayon pool at startup.       |

pub mod builder;
pub mod engine;
pub mod error;
pub mod graph;


pub use builder::EngineBuilder;
pub use engine::RoutingEngine;
pub use error::{EngineError, EngineResult};
pub use graph::{GraphStats, NodeSummary};

pub use wf_graph::{LoadSummary, PathNode, PathResult, TravelEstimate};
pub use wf_scenario::{AppliedScenario, Preset, ScenarioKind, ScenarioRequest, ScenarioSummary};
