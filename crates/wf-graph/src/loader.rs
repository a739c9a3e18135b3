//! CSV row sources for the one-shot startup load.
//!
//! # CSV format
//!
//! One file of nodes and one of edges per vehicle class, exported from the
//! persistent store:
//!
//! ```csv
//! id,x,y
//! 1,120.5,7400.0
//! 2,180.0,7390.2
//! ```
//!
//! ```csv
//! node_from,node_to,weight
//! 1,2,60.3
//! 2,1,60.3
//! ```
//!
//! Coordinates are storage (image) coordinates; the coordinate-frame
//! conversion happens in [`GraphStore::load`](crate::GraphStore::load), not
//! here.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{GraphError, GraphResult};

// ── Rows ──────────────────────────────────────────────────────────────────────

/// A node row `(id, x, y)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: u64,
    pub x:  f64,
    pub y:  f64,
}

/// An edge row `(node_from, node_to, weight)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub node_from: u64,
    pub node_to:   u64,
    pub weight:    f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read node rows from a CSV file.
pub fn load_node_rows(path: &Path) -> GraphResult<Vec<NodeRow>> {
    load_node_rows_reader(std::fs::File::open(path)?)
}

/// Like [`load_node_rows`] but accepts any `Read` source (tests pass a
/// `std::io::Cursor`).
pub fn load_node_rows_reader<R: Read>(reader: R) -> GraphResult<Vec<NodeRow>> {
    read_rows(reader)
}

/// Read edge rows from a CSV file.
pub fn load_edge_rows(path: &Path) -> GraphResult<Vec<EdgeRow>> {
    load_edge_rows_reader(std::fs::File::open(path)?)
}

/// Like [`load_edge_rows`] but accepts any `Read` source.
pub fn load_edge_rows_reader<R: Read>(reader: R) -> GraphResult<Vec<EdgeRow>> {
    read_rows(reader)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> GraphResult<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize::<T>()
        .map(|row| row.map_err(|e| GraphError::Parse(e.to_string())))
        .collect()
}
