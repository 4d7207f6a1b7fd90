//! Error types for structural failures.
//!
//! Only conditions the embedding application must react to are errors:
//! malformed edges, dangling references, duplicate ids, and broken parent
//! chains. Expected, user-driven conditions (an invalid connection attempt,
//! geometry that has not been measured yet) are not represented here.

/// Which endpoint of an edge an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Source,
    Target,
}

impl std::fmt::Display for EdgeEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Which collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Edge,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// Structural-integrity failure raised when nodes or edges enter the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("{kind} id must not be empty")]
    EmptyId { kind: ElementKind },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: ElementKind, id: String },
    #[error("edge {edge_id} has no {end}")]
    MissingEndpoint { edge_id: String, end: EdgeEnd },
    #[error("edge {edge_id} references unknown {end} node {node_id}")]
    DanglingReference { edge_id: String, end: EdgeEnd, node_id: String },
    #[error("node {node_id} references unknown parent {parent_id}")]
    MissingParent { node_id: String, parent_id: String },
    #[error("node {node_id} is part of a cyclic parent chain")]
    CyclicParent { node_id: String },
    #[error("unknown {kind}: {id}")]
    NotFound { kind: ElementKind, id: String },
}

/// Configuration could not be parsed or is inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// A snapshot could not be decoded or does not describe a valid graph.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("snapshot rejected: {0}")]
    Graph(#[from] GraphError),
}
