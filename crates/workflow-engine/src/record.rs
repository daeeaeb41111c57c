//! The per-node and per-run records the driver produces (§3 "Execution
//! state", §6 "ExecutionRecord").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Status of a single node after a run (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Completed,
    Failed,
    Error,
    Skipped,
}

/// The recorded outcome of one node, whether it ran, failed, errored, or
/// was skipped behind an untaken conditional branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedNode {
    pub status: NodeStatus,
    pub output: Value,
    pub tokens_used: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub metadata: Map<String, Value>,
}

impl RecordedNode {
    pub fn skipped() -> Self {
        Self {
            status: NodeStatus::Skipped,
            output: Value::Null,
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms: 0,
            metadata: Map::new(),
        }
    }
}

/// Overall run status (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// The value `execute` returns for every run, successful or not (§6, §7
/// "never propagates exceptions out of execute").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: RunStatus,
    pub node_results: HashMap<String, RecordedNode>,
    pub output_data: Value,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub duration_ms: u64,
    pub failed_node: Option<String>,
}
