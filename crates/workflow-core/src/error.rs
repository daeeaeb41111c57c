//! Error types for graph construction and validation.
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── DanglingEdge     - an edge references a node id that doesn't exist
//! ├── DuplicateNode    - two nodes share the same id
//! ├── DuplicateEdge    - two edges share the same (source, target, condition)
//! ├── SelfLoop         - an edge's source and target are the same node
//! ├── BadCondition     - a condition is present/absent on the wrong edge kind
//! └── Cycle            - the graph is not a DAG
//! ```
//!
//! All variants are returned before any node runs (§7 "Graph-validation").

use thiserror::Error;

/// Errors produced while constructing or validating a [`crate::Graph`].
///
/// **Recovery**: all of these are caught before execution begins; fix the
/// graph definition and re-validate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes share the same id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge's source_id or target_id does not resolve to a node in the graph.
    #[error("edge references unknown node: {0}")]
    DanglingEdge(String),

    /// An edge's source_id equals its target_id.
    #[error("self-loop on node: {0}")]
    SelfLoop(String),

    /// Two edges share the same (source_id, target_id, condition) triple.
    #[error("duplicate edge {source_id} -> {target} (condition {condition:?})")]
    DuplicateEdge {
        source_id: String,
        target: String,
        condition: String,
    },

    /// A non-conditional node has an outbound edge carrying a condition, or a
    /// conditional node has an outbound edge with an empty condition.
    #[error("edge {source_id} -> {target} has invalid condition {condition:?} for a {node_kind} source node")]
    BadCondition {
        source_id: String,
        target: String,
        condition: String,
        node_kind: &'static str,
    },

    /// The induced directed graph contains a cycle; no valid execution order exists.
    #[error("graph contains a cycle reachable from node: {0}")]
    Cycle(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
