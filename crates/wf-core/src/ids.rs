//! Strongly typed identifiers.
//!
//! Node identifiers are a tagged union: nodes read from storage keep their
//! persistent integer id, nodes created while a transaction is open (query
//! attachment points, scenario clipping points) get an ephemeral id drawn
//! from that transaction's generation.  The two spaces cannot collide, and
//! every ephemeral node of a transaction can be recognised by its generation
//! alone.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── NodeId ────────────────────────────────────────────────────────────────────

/// Identifier of a road-network node.
///
/// Ordering puts all persistent ids before all ephemeral ids; within each
/// variant the natural integer order applies.  Snapshot scans rely on this
/// order for determinism.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    /// Node loaded from persistent storage.
    Persistent(u64),
    /// Node inserted by a transaction; `generation` identifies the
    /// transaction, `index` the insertion within it.
    Ephemeral { generation: u32, index: u32 },
}

impl NodeId {
    #[inline]
    pub fn is_ephemeral(self) -> bool {
        matches!(self, NodeId::Ephemeral { .. })
    }

    /// Generation of an ephemeral node, `None` for persistent nodes.
    #[inline]
    pub fn generation(self) -> Option<u32> {
        match self {
            NodeId::Persistent(_) => None,
            NodeId::Ephemeral { generation, .. } => Some(generation),
        }
    }
}

impl From<u64> for NodeId {
    #[inline]
    fn from(id: u64) -> Self {
        NodeId::Persistent(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Persistent(id) => write!(f, "{id}"),
            NodeId::Ephemeral { generation, index } => write!(f, "~{generation}.{index}"),
        }
    }
}

// ── EdgeKey ───────────────────────────────────────────────────────────────────

/// A directed edge `(from, to)`.  Bidirectional roads are two keys.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to:   NodeId,
}

impl EdgeKey {
    #[inline]
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    /// The opposite directed edge `(to, from)`.
    #[inline]
    pub fn reversed(self) -> Self {
        Self { from: self.to, to: self.from }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

// ── ScenarioId ────────────────────────────────────────────────────────────────

/// Identifier of an applied scenario.  Allocated monotonically from 1 and
/// never reused within one engine instance.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub u32);

impl ScenarioId {
    pub const FIRST: ScenarioId = ScenarioId(1);

    #[inline]
    pub fn next(self) -> ScenarioId {
        ScenarioId(self.0 + 1)
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScenarioId({})", self.0)
    }
}
