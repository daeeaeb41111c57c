//! Errors that can escape [`crate::execute`].
//!
//! Per §7 "Propagation policy", graph validation is the only failure mode
//! that surfaces as a Rust `Err` before any node runs. Everything else —
//! node failures, node panics caught at the boundary, cancellation — is
//! folded into the returned [`crate::record::ExecutionRecord`] instead.

use thiserror::Error;
use workflow_agents::ConfigError;
use workflow_core::GraphError;

/// Errors returned by [`crate::execute`] before a run's execution state exists.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The graph failed validation (§7 taxonomy item 1): cycle, dangling
    /// edge, duplicate id, or a condition misplaced on an edge.
    #[error("graph validation failed: {0}")]
    InvalidGraph(#[from] GraphError),

    /// A node's merged configuration failed to parse (§7 taxonomy item 1,
    /// §9 "parsed ... at graph-validation time, not during execution").
    /// Surfaced before any node runs, alongside `InvalidGraph`.
    #[error("invalid config for node {node_id}: {source}")]
    InvalidNodeConfig {
        node_id: String,
        #[source]
        source: ConfigError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
