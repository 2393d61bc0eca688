//! Undo/redo over compressed graph snapshots
//!
//! Each snapshot is the zstd-compressed JSON of a [`GraphDocument`]. Undo and
//! redo rebuild a graph from the stored document, so any mutation the graph
//! API allows can be undone without an inverse operation.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::document::{self, GraphDocument};
use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::registry::NodeRegistry;

const COMPRESSION_LEVEL: i32 = 3;

/// Bounded history of graph states
pub struct UndoStack {
    registry: Arc<NodeRegistry>,
    /// Compressed documents, oldest first
    snapshots: VecDeque<Vec<u8>>,
    current: usize,
    max_snapshots: usize,
}

impl UndoStack {
    /// Create a history keeping at most `max_snapshots` states
    pub fn new(registry: Arc<NodeRegistry>, max_snapshots: usize) -> Self {
        Self {
            registry,
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Record the graph's current state.
    ///
    /// Drops any redo history. A state identical to the current snapshot is
    /// not recorded twice.
    pub fn push(&mut self, graph: &Graph) -> Result<()> {
        let json = serde_json::to_vec(&document::save(graph))?;
        let compressed = zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map_err(|e| EngineError::Compression(e.to_string()))?;

        if self.snapshots.get(self.current) == Some(&compressed) {
            return Ok(());
        }

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }
        Ok(())
    }

    /// Step back one state. Returns `None` at the oldest state.
    pub fn undo(&mut self) -> Option<Result<Graph>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(self.restore(self.current))
    }

    /// Step forward one state. Returns `None` at the newest state.
    pub fn redo(&mut self) -> Option<Result<Graph>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(self.restore(self.current))
    }

    /// The document at the current position
    pub fn current(&self) -> Option<Result<GraphDocument>> {
        (!self.snapshots.is_empty()).then(|| self.decompress(self.current))
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    /// Total compressed size of all snapshots in bytes
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(Vec::len).sum()
    }

    fn restore(&self, index: usize) -> Result<Graph> {
        let doc = self.decompress(index)?;
        let outcome = document::load(&doc, self.registry.clone());
        if !outcome.warnings.is_empty() {
            log::warn!(
                "Undo snapshot restored with {} warning(s)",
                outcome.warnings.len()
            );
        }
        Ok(outcome.graph)
    }

    fn decompress(&self, index: usize) -> Result<GraphDocument> {
        let compressed = self
            .snapshots
            .get(index)
            .ok_or_else(|| EngineError::failed(format!("no undo snapshot at {}", index)))?;
        let json = zstd::decode_all(&compressed[..])
            .map_err(|e| EngineError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}
