//! Export/import snapshot: `{ nodes, edges, viewport }`.
//!
//! The snapshot is plain data. Derived node state (absolute position,
//! effective z, handle bounds) is not part of it; it is recomputed when the
//! snapshot is loaded back into an engine.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, SnapshotError};
use crate::geometry::Viewport;
use crate::graph::{Edge, GraphStore, Node, validate_edges, validate_nodes};

/// Serializable copy of one canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowExport {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl FlowExport {
    /// Copy the store's collections and the given transform.
    #[must_use]
    pub fn capture(store: &GraphStore, viewport: Viewport) -> Self {
        Self {
            nodes: store.nodes().cloned().collect(),
            edges: store.edges().cloned().collect(),
            viewport,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and structurally validate a JSON snapshot.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Parse`] for malformed JSON, [`SnapshotError::Graph`]
    /// for duplicate ids, dangling edges, or broken parent chains.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let export: Self = serde_json::from_str(raw)?;
        export.validate()?;
        Ok(export)
    }

    /// Run the store's structural checks without loading anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] found.
    pub fn validate(&self) -> Result<(), GraphError> {
        validate_nodes(&self.nodes)?;
        let ids = self.nodes.iter().map(|n| n.id.as_str()).collect();
        validate_edges(&self.edges, &ids)
    }
}
