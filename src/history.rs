//! Undo and redo.

use std::collections::VecDeque;

use crate::core::Hash32;
use crate::element::Element;
use crate::error::HistoryError;
use crate::graph::FlowGraph;

/// Receives the state of the flow after every completed mutation.
pub trait UndoStack {
    fn record_snapshot(&mut self, graph: &FlowGraph);
}

/// Keeps no history.
impl UndoStack for () {
    fn record_snapshot(&mut self, _: &FlowGraph) {}
}

#[derive(Debug, Clone)]
struct Snapshot {
    hash: Hash32,
    bytes: Vec<u8>,
}

impl Snapshot {
    fn encode(graph: &FlowGraph) -> Result<Self, HistoryError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(&graph.to_elements(), &mut bytes)?;

        Ok(Self {
            hash: Hash32::hash(&bytes),
            bytes,
        })
    }

    fn decode(&self) -> Result<FlowGraph, HistoryError> {
        let elements: Vec<Element> = ciborium::from_reader(self.bytes.as_slice())?;
        Ok(FlowGraph::from_elements(elements)?)
    }
}

/// A bounded undo/redo stack of CBOR-encoded flow snapshots.
///
/// The newest entry of `past` is the current state of the flow, so one undo
/// needs at least two recorded snapshots. Recording a snapshot identical to
/// the current one is a no-op, which keeps layout-only passes and no-op
/// mutations out of the history. Recording anything new clears the redo side.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    limit: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

impl SnapshotHistory {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` snapshots, oldest dropped first. A limit of zero
    /// is treated as one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of recorded snapshots, including the current state.
    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Steps back one snapshot and returns the flow as it was. `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<FlowGraph>, HistoryError> {
        if !self.can_undo() {
            return Ok(None);
        }

        let previous = &self.past[self.past.len() - 2];
        let graph = previous.decode()?;

        if let Some(current) = self.past.pop_back() {
            self.future.push(current);
        }

        Ok(Some(graph))
    }

    /// Re-applies the most recently undone snapshot.
    pub fn redo(&mut self) -> Result<Option<FlowGraph>, HistoryError> {
        let Some(next) = self.future.last() else {
            return Ok(None);
        };

        let graph = next.decode()?;

        if let Some(next) = self.future.pop() {
            self.past.push_back(next);
        }

        Ok(Some(graph))
    }

    fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.past.back().map(|last| last.hash) == Some(snapshot.hash) {
            return false;
        }

        self.future.clear();
        self.past.push_back(snapshot);

        while self.past.len() > self.limit {
            self.past.pop_front();
        }

        true
    }
}

impl UndoStack for SnapshotHistory {
    fn record_snapshot(&mut self, graph: &FlowGraph) {
        match Snapshot::encode(graph) {
            Ok(snapshot) => {
                let hash = snapshot.hash;
                if self.push(snapshot) {
                    tracing::trace!(hash = %hash.to_hex(), depth = self.past.len(), "snapshot recorded");
                }
            }
            Err(err) => tracing::warn!("couldn't record flow snapshot: {err}"),
        }
    }
}
