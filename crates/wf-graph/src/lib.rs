//! `wf-graph` — road graph, geometry, edge transactions and routing.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`store`]       | `GraphStore` (nodes, adjacency, weight maps), `LoadSummary` |
//! | [`geometry`]    | projection, segment intersection, circle clipping          |
//! | [`transaction`] | `EdgeTransaction`, `SplitRecord`, `TransactionLog`         |
//! | [`index`]       | `NodeIndex` — R-tree for nearest-vertex fallback           |
//! | [`router`]      | `PathFinder` trait, `AStarPathFinder`, `PathResult`        |
//! | [`loader`]      | `NodeRow` / `EdgeRow` CSV sources                          |
//! | [`error`]       | `GraphError`, `GraphResult<T>`                             |
//!
//! # Mutation discipline
//!
//! Every structural change that must later be undone goes through an
//! [`EdgeTransaction`].  A transaction that is dropped without being
//! committed restores the store, so temporary query structure cannot leak
//! even when a search returns early or unwinds.

pub mod error;
pub mod geometry;
pub mod index;
pub mod loader;
pub mod router;
pub mod store;
pub mod transaction;


pub use error::{GraphError, GraphResult};
pub use index::NodeIndex;
pub use loader::{EdgeRow, NodeRow};
pub use router::{AStarPathFinder, PathFinder, PathNode, PathQuery, PathResult, SearchOptions, TravelEstimate};
pub use store::{EdgeWeights, GraphStore, LoadSummary};
pub use transaction::{EdgeTransaction, LogEntry, SplitHalf, SplitRecord, TransactionLog};
