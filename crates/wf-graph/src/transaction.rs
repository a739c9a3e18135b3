//! Reversible structural edits.
//!
//! An [`EdgeTransaction`] mutably borrows a [`GraphStore`] for one operation
//! and logs every structural change it makes.  It ends in one of three ways:
//!
//! | Exit                    | Effect                                             |
//! |-------------------------|----------------------------------------------------|
//! | [`rollback`]            | log replayed LIFO, errors returned to the caller   |
//! | [`commit`]              | edits kept, log handed back as a [`TransactionLog`] |
//! | dropped (early return, `?`, unwinding) | same as `rollback`, errors logged   |
//!
//! Path queries always roll back.  Scenarios commit and keep the log so the
//! topology can be restored later with [`TransactionLog::revert`].
//!
//! [`rollback`]: EdgeTransaction::rollback
//! [`commit`]: EdgeTransaction::commit

use tracing::{debug, error};

use wf_core::{EdgeKey, NodeId, Point};

use crate::store::{EdgeWeights, GraphStore};
use crate::{GraphError, GraphResult};

// ── Log records ───────────────────────────────────────────────────────────────

/// One directed edge replaced by a split, with its exact pre-split weights.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SplitHalf {
    pub edge:    EdgeKey,
    pub weights: EdgeWeights,
}

/// Everything needed to undo one edge split.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SplitRecord {
    /// The synthetic node inserted at the split point.
    pub node: NodeId,
    pub position: Point,
    /// Split parameter along `forward.edge`.
    pub t: f64,
    /// The edge that was split.
    pub forward: SplitHalf,
    /// The opposite edge, if it existed and was split too.
    pub reverse: Option<SplitHalf>,
}

impl SplitRecord {
    /// The two sub-edges that replaced `forward.edge`, in travel order.
    pub fn forward_parts(&self) -> [EdgeKey; 2] {
        let e = self.forward.edge;
        [EdgeKey { from: e.from, to: self.node }, EdgeKey { from: self.node, to: e.to }]
    }

    /// The two sub-edges that replaced the reverse edge, in travel order.
    pub fn reverse_parts(&self) -> Option<[EdgeKey; 2]> {
        self.reverse.map(|half| {
            let e = half.edge;
            [EdgeKey { from: e.from, to: self.node }, EdgeKey { from: self.node, to: e.to }]
        })
    }
}

/// A structural change recorded by a transaction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LogEntry {
    NodeInsert { node: NodeId },
    EdgeInsert { edge: EdgeKey },
    Split(SplitRecord),
}

/// The ordered change log of a committed transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionLog {
    generation: u32,
    entries:    Vec<LogEntry>,
}

impl TransactionLog {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split records in application order.
    pub fn splits(&self) -> impl Iterator<Item = &SplitRecord> + '_ {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Split(rec) => Some(rec),
            _ => None,
        })
    }

    /// Undo every entry, last first.
    ///
    /// Logs of several transactions must be reverted in the reverse of the
    /// order they were committed in, because a later split may have cut an
    /// edge that an earlier split created.
    pub fn revert(self, store: &mut GraphStore) -> GraphResult<()> {
        undo_all(store, &self.entries)?;
        ensure_released(store, &self.entries)
    }
}

// ── EdgeTransaction ───────────────────────────────────────────────────────────

/// Scoped, reversible access to a [`GraphStore`].
pub struct EdgeTransaction<'g> {
    store:      &'g mut GraphStore,
    log:        TransactionLog,
    next_index: u32,
    finished:   bool,
}

impl<'g> EdgeTransaction<'g> {
    /// Open a transaction with a fresh ephemeral-id generation.
    pub fn begin(store: &'g mut GraphStore) -> Self {
        let generation = store.begin_generation();
        Self {
            store,
            log: TransactionLog { generation, entries: Vec::new() },
            next_index: 0,
            finished: false,
        }
    }

    /// Read access to the store, including this transaction's edits.
    #[inline]
    pub fn store(&self) -> &GraphStore {
        &*self.store
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.log.generation
    }

    #[inline]
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId::Ephemeral { generation: self.log.generation, index: self.next_index };
        self.next_index += 1;
        id
    }

    /// Insert a temporary node.
    pub fn insert_node(&mut self, pos: Point) -> GraphResult<NodeId> {
        let node = self.allocate();
        self.store.insert_node(node, pos)?;
        self.log.entries.push(LogEntry::NodeInsert { node });
        Ok(node)
    }

    /// Insert a temporary edge.
    pub fn insert_edge(&mut self, edge: EdgeKey, weights: EdgeWeights) -> GraphResult<()> {
        self.store.insert_edge(edge, weights)?;
        self.log.entries.push(LogEntry::EdgeInsert { edge });
        Ok(())
    }

    /// Split `edge` at `point` (expected to lie on the segment).
    ///
    /// A synthetic node is inserted at `point` and `from → to` becomes
    /// `from → node → to`.  The original weight is shared in proportion to
    /// the distances from `point` to each endpoint, and the edge's current
    /// penalty ratio is carried over to both halves.  If `to → from` exists
    /// it is split through the same node.
    pub fn split_edge(&mut self, edge: EdgeKey, point: Point) -> GraphResult<SplitRecord> {
        let weights = self.store.weights(edge).ok_or(GraphError::EdgeNotFound(edge))?;
        let (a, b) = self.store.segment(edge).ok_or(GraphError::EdgeNotFound(edge))?;

        let d_from = a.distance(point);
        let d_to   = point.distance(b);
        let t = if d_from + d_to > 0.0 { d_from / (d_from + d_to) } else { 0.5 };

        let reverse_edge = edge.reversed();
        let reverse = if reverse_edge != edge {
            self.store
                .weights(reverse_edge)
                .map(|weights| SplitHalf { edge: reverse_edge, weights })
        } else {
            None
        };

        let node = self.allocate();
        self.store.insert_node(node, point)?;

        // from → node → to, then to → node → from.  A failure part-way is
        // unwound here since nothing is logged until the split is complete.
        let forward = SplitHalf { edge, weights };
        let halves = [Some((forward, t)), reverse.map(|half| (half, 1.0 - t))];
        let mut done = Vec::with_capacity(4);
        for (half, share) in halves.into_iter().flatten() {
            if let Err(e) = rewire(self.store, half, node, share, &mut done) {
                unwind(self.store, node, &done)?;
                return Err(e);
            }
        }

        let record = SplitRecord {
            node,
            position: point,
            t,
            forward,
            reverse,
        };
        debug!(edge = %edge, node = %node, t, bidirectional = reverse.is_some(), "split edge");
        self.log.entries.push(LogEntry::Split(record));
        Ok(record)
    }

    /// Undo every edit now and report any protocol violation.
    pub fn rollback(mut self) -> GraphResult<()> {
        self.finished = true;
        self.restore()
    }

    /// Keep the edits; return the log needed to undo them later.
    pub fn commit(mut self) -> TransactionLog {
        self.finished = true;
        std::mem::take(&mut self.log)
    }

    fn restore(&mut self) -> GraphResult<()> {
        let entries = std::mem::take(&mut self.log.entries);
        undo_all(self.store, &entries)?;
        ensure_released(self.store, &entries)
    }
}

impl Drop for EdgeTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.restore() {
            error!(generation = self.log.generation, "transaction rollback on drop failed: {e}");
        }
    }
}

// ── Split steps ───────────────────────────────────────────────────────────────

/// One completed step of a split in progress.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Rewire {
    /// `half.edge` now ends at the split node.
    Redirected(SplitHalf),
    /// The split node's outgoing sub-edge.
    Inserted(EdgeKey),
}

/// Route `half.edge` through `node`; the leading sub-edge gets `share` of
/// the weights.
fn rewire(
    store: &mut GraphStore,
    half: SplitHalf,
    node: NodeId,
    share: f64,
    done: &mut Vec<Rewire>,
) -> GraphResult<()> {
    let edge = half.edge;
    store.replace_edge(edge, node, half.weights.portion(share))?;
    done.push(Rewire::Redirected(half));
    let tail = EdgeKey { from: node, to: edge.to };
    store.insert_edge(tail, half.weights.portion(1.0 - share))?;
    done.push(Rewire::Inserted(tail));
    Ok(())
}

/// Undo the steps of an unfinished split, then remove its node.
pub(crate) fn unwind(store: &mut GraphStore, node: NodeId, done: &[Rewire]) -> GraphResult<()> {
    let undo_steps = |store: &mut GraphStore| -> GraphResult<()> {
        for step in done.iter().rev() {
            match *step {
                Rewire::Inserted(edge) => {
                    store.remove_edge(edge)?;
                }
                Rewire::Redirected(half) => {
                    let head = EdgeKey { from: half.edge.from, to: node };
                    store.replace_edge(head, half.edge.to, half.weights)?;
                }
            }
        }
        store.remove_node(node).map(drop)
    };
    undo_steps(store).map_err(|e| GraphError::Rollback(Box::new(e)))
}

// ── Undo ──────────────────────────────────────────────────────────────────────

fn undo_all(store: &mut GraphStore, entries: &[LogEntry]) -> GraphResult<()> {
    for entry in entries.iter().rev() {
        undo(store, entry).map_err(|e| GraphError::Rollback(Box::new(e)))?;
    }
    Ok(())
}

fn undo(store: &mut GraphStore, entry: &LogEntry) -> GraphResult<()> {
    match *entry {
        LogEntry::NodeInsert { node } => store.remove_node(node).map(drop),
        LogEntry::EdgeInsert { edge } => store.remove_edge(edge).map(drop),
        LogEntry::Split(record) => {
            if let Some(half) = record.reverse {
                unsplit(store, half, record.node)?;
            }
            unsplit(store, record.forward, record.node)?;
            store.remove_node(record.node).map(drop)
        }
    }
}

/// `from → node → to` back to `from → to` with the recorded weights.
fn unsplit(store: &mut GraphStore, half: SplitHalf, node: NodeId) -> GraphResult<()> {
    let edge = half.edge;
    store.remove_edge(EdgeKey { from: node, to: edge.to })?;
    store.replace_edge(EdgeKey { from: edge.from, to: node }, edge.to, half.weights)?;
    Ok(())
}

/// No node created by `entries` may survive an undo.
fn ensure_released(store: &GraphStore, entries: &[LogEntry]) -> GraphResult<()> {
    let leaked = entries.iter().find_map(|entry| {
        let node = match *entry {
            LogEntry::NodeInsert { node } => node,
            LogEntry::Split(record) => record.node,
            LogEntry::EdgeInsert { .. } => return None,
        };
        store.contains_node(node).then_some(node)
    });
    match leaked {
        Some(node) => Err(GraphError::LeakedNode(node)),
        None => Ok(()),
    }
}
