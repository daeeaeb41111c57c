//! The uniform agent contract shared by every agent kind (§4.1).
//!
//! Every agent — regardless of whether it calls an LLM, performs a web
//! search, issues an HTTP request, runs sandboxed code, reshapes data, or
//! evaluates a condition — implements [`Agent::run`] and returns a
//! [`NodeResult`]. The contract is deliberately narrow: agents never raise
//! past their own boundary; a failure becomes `success: false` with a
//! human-readable `output`, never a propagated error.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Instant;

/// The mapping of upstream outputs presented to a node about to run.
///
/// Keyed by source-node id, plus the reserved key `"input"` for the run's
/// input payload (§3 "Execution state", §6 "Input to the engine").
pub type Context = HashMap<String, Value>;

/// The standardized result of running any agent (§3 "NodeResult").
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub success: bool,
    pub output: Value,
    pub tokens_used: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub metadata: Map<String, Value>,
}

impl NodeResult {
    /// Build a successful result, stamping `duration_ms` from `start`.
    pub fn ok(output: Value, start: Instant) -> Self {
        Self {
            success: true,
            output,
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms: start.elapsed().as_millis() as u64,
            metadata: Map::new(),
        }
    }

    /// Build a failed result carrying a human-readable message as output.
    pub fn failed(message: impl Into<String>, start: Instant) -> Self {
        Self {
            success: false,
            output: Value::String(message.into()),
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms: start.elapsed().as_millis() as u64,
            metadata: Map::new(),
        }
    }

    pub fn with_tokens(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The capability every agent kind implements.
///
/// `run` must never panic or return an `Err` that crosses this boundary —
/// internal failures are caught and reported as `NodeResult { success: false, .. }`.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, objective: &str, context: &Context) -> NodeResult;
}
