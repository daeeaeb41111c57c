//! Execution driver (§4.8): the main loop that turns a validated graph and
//! an input payload into an [`ExecutionRecord`].

use crate::cancellation::CancellationToken;
use crate::context::assemble_context;
use crate::definitions::{merge_config, AgentDefinitionStore, NoopAgentDefinitionStore};
use crate::error::{EngineError, Result};
use crate::pruner::skip_set_for_branch;
use crate::record::{ExecutionRecord, NodeStatus, RecordedNode, RunStatus};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use workflow_agents::{build_from_config, AgentConfig, CredentialProvider, EnvCredentialProvider};
use workflow_core::{topological_order, Branch, Graph};

/// The external collaborators `execute` needs (§6): a definition store and
/// a credential provider. Both default to a no-op/env-backed implementation
/// so a caller with no definitions and only environment credentials can
/// call [`execute`] with `ExecutionOptions::default()`.
pub struct ExecutionOptions {
    pub definitions: Arc<dyn AgentDefinitionStore>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub cancellation: CancellationToken,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            definitions: Arc::new(NoopAgentDefinitionStore),
            credentials: Arc::new(EnvCredentialProvider),
            cancellation: CancellationToken::new(),
        }
    }
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definitions(mut self, definitions: Arc<dyn AgentDefinitionStore>) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn as_node_context(output: &Value) -> Value {
    match output {
        Value::Object(_) => output.clone(),
        other => serde_json::json!({ "output": other }),
    }
}

fn taken_branch(output: &Value) -> Branch {
    match output.get("branch").and_then(|v| v.as_str()) {
        Some("false") => Branch::False,
        _ => Branch::True,
    }
}

/// Run a validated graph to completion, never returning an `Err` once
/// validation and scheduling succeed (§7 "never propagates exceptions out
/// of execute").
pub async fn execute(graph: &Graph, input: Value, options: ExecutionOptions) -> Result<ExecutionRecord> {
    let run_start = Instant::now();

    graph.validate().map_err(EngineError::InvalidGraph)?;
    let order = topological_order(graph).map_err(EngineError::InvalidGraph)?;

    let mut node_configs: HashMap<String, AgentConfig> = HashMap::with_capacity(graph.nodes().len());
    for node in graph.nodes() {
        let definition = node.agent_def_id.as_deref().and_then(|id| options.definitions.lookup(id));
        let merged_config = merge_config(definition.as_ref(), &node.config);
        let config = AgentConfig::parse(node.agent_kind, merged_config).map_err(|source| EngineError::InvalidNodeConfig {
            node_id: node.id.clone(),
            source,
        })?;
        node_configs.insert(node.id.clone(), config);
    }

    info!(node_count = order.len(), "starting workflow run");

    let mut node_results: HashMap<String, RecordedNode> = HashMap::new();
    let mut emitted: Vec<String> = Vec::new();
    let mut node_context_store: HashMap<String, Value> = HashMap::new();
    let mut skipped: HashSet<String> = HashSet::new();
    let mut total_tokens: u64 = 0;
    let mut total_cost: f64 = 0.0;
    let mut outcome = RunStatus::Completed;
    let mut failed_node: Option<String> = None;

    for node_id in order {
        if skipped.contains(&node_id) {
            debug!(node = %node_id, "skipping node behind untaken branch");
            node_results.insert(node_id.clone(), RecordedNode::skipped());
            emitted.push(node_id);
            continue;
        }

        if options.cancellation.is_cancelled() {
            warn!(node = %node_id, "run cancelled before node started");
            node_results.insert(
                node_id.clone(),
                RecordedNode {
                    status: NodeStatus::Failed,
                    output: Value::String("run cancelled".to_string()),
                    tokens_used: 0,
                    cost_usd: 0.0,
                    duration_ms: 0,
                    metadata: Default::default(),
                },
            );
            emitted.push(node_id.clone());
            outcome = RunStatus::Failed;
            failed_node = Some(node_id);
            break;
        }

        let node = graph
            .get_node(&node_id)
            .expect("topological_order only yields ids present in the graph");

        let context = assemble_context(graph, &node_id, &node_context_store, &input);

        debug!(node = %node_id, kind = %node.agent_kind, "dispatching node");

        let config = node_configs
            .remove(&node_id)
            .expect("every node was validated into node_configs before the loop started");
        let agent = build_from_config(config, options.credentials.clone());
        let result = agent.run(&node.objective, &context).await;
        let status = if result.success {
            NodeStatus::Completed
        } else {
            NodeStatus::Failed
        };
        total_tokens += result.tokens_used;
        total_cost += result.cost_usd;
        if status == NodeStatus::Completed {
            node_context_store.insert(node_id.clone(), as_node_context(&result.output));
        }

        if status == NodeStatus::Completed && node.agent_kind.is_conditional() {
            if let Value::Object(_) = &result.output {
                let branch = taken_branch(&result.output);
                let to_skip = skip_set_for_branch(graph, &node_id, branch);
                debug!(node = %node_id, branch = %branch, skip_count = to_skip.len(), "conditional branch resolved");
                skipped.extend(to_skip);
            }
        }

        let record = RecordedNode {
            status,
            output: result.output,
            tokens_used: result.tokens_used,
            cost_usd: result.cost_usd,
            duration_ms: result.duration_ms,
            metadata: result.metadata,
        };

        let should_stop = record.status != NodeStatus::Completed && node.stop_on_failure;
        node_results.insert(node_id.clone(), record);
        emitted.push(node_id.clone());

        if should_stop {
            warn!(node = %node_id, "stopping run after node failure");
            outcome = RunStatus::Failed;
            failed_node = Some(node_id);
            break;
        }
    }

    let output_data = emitted
        .iter()
        .rev()
        .find_map(|id| {
            node_results
                .get(id)
                .filter(|r| r.status == NodeStatus::Completed)
                .map(|r| r.output.clone())
        })
        .unwrap_or(Value::Null);

    info!(
        status = ?outcome,
        total_tokens,
        total_cost_usd = total_cost,
        "workflow run finished"
    );

    Ok(ExecutionRecord {
        status: outcome,
        node_results,
        output_data,
        total_tokens,
        total_cost_usd: round6(total_cost),
        duration_ms: run_start.elapsed().as_millis() as u64,
        failed_node,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use workflow_core::{AgentKind, Edge, Node};

    fn transform_node(id: &str, config: Value) -> Node {
        Node::new(id, AgentKind::Transform).with_config(config.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn empty_graph_completes_with_null_output() {
        let graph = Graph::new();
        let record = execute(&graph, Value::Null, ExecutionOptions::default()).await.unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert!(record.node_results.is_empty());
        assert_eq!(record.output_data, Value::Null);
    }

    #[tokio::test]
    async fn linear_pipeline_extracts_field() {
        let mut graph = Graph::new();
        graph.add_node(transform_node("a", json!({"operation": "passthrough"}))).unwrap();
        graph
            .add_node(transform_node(
                "b",
                json!({"operation": "extract_field", "field": "x"}),
            ))
            .unwrap();
        graph.add_edge(Edge::direct("a", "b")).unwrap();

        let record = execute(&graph, json!({"x": 42, "y": 7}), ExecutionOptions::default())
            .await
            .unwrap();

        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.output_data, json!(42));
        assert_eq!(record.total_tokens, 0);
    }

    #[tokio::test]
    async fn cycle_is_rejected_before_any_node_runs() {
        let mut graph = Graph::new();
        graph.add_node(Node::new("a", AgentKind::Transform)).unwrap();
        graph.add_node(Node::new("b", AgentKind::Transform)).unwrap();
        graph.add_edge(Edge::direct("a", "b")).unwrap();
        graph.add_edge(Edge::direct("b", "a")).unwrap();

        let err = execute(&graph, Value::Null, ExecutionOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidGraph(_)));
    }

    #[tokio::test]
    async fn conditional_pruning_skips_the_untaken_branch() {
        let mut graph = Graph::new();
        graph
            .add_node(
                Node::new("c", AgentKind::Conditional).with_config(
                    json!({"field": "v", "operator": "gt", "value": "10"}).as_object().cloned().unwrap(),
                ),
            )
            .unwrap();
        graph.add_node(transform_node("t", json!({"operation": "passthrough"}))).unwrap();
        graph.add_node(transform_node("f", json!({"operation": "passthrough"}))).unwrap();
        graph.add_edge(Edge::branch("c", "t", Branch::True)).unwrap();
        graph.add_edge(Edge::branch("c", "f", Branch::False)).unwrap();

        let record = execute(&graph, json!({"v": 100}), ExecutionOptions::default()).await.unwrap();

        assert_eq!(record.node_results["t"].status, NodeStatus::Completed);
        assert_eq!(record.node_results["f"].status, NodeStatus::Skipped);
    }

    #[tokio::test]
    async fn transitive_skip_covers_the_whole_untaken_branch() {
        let mut graph = Graph::new();
        graph
            .add_node(
                Node::new("c", AgentKind::Conditional).with_config(
                    json!({"field": "v", "operator": "gt", "value": "10"}).as_object().cloned().unwrap(),
                ),
            )
            .unwrap();
        graph.add_node(transform_node("t", json!({"operation": "passthrough"}))).unwrap();
        graph.add_node(transform_node("t2", json!({"operation": "passthrough"}))).unwrap();
        graph.add_node(transform_node("f", json!({"operation": "passthrough"}))).unwrap();
        graph.add_edge(Edge::branch("c", "t", Branch::True)).unwrap();
        graph.add_edge(Edge::direct("t", "t2")).unwrap();
        graph.add_edge(Edge::branch("c", "f", Branch::False)).unwrap();

        let record = execute(&graph, json!({"v": 1}), ExecutionOptions::default()).await.unwrap();

        assert_eq!(record.node_results["t"].status, NodeStatus::Skipped);
        assert_eq!(record.node_results["t2"].status, NodeStatus::Skipped);
        assert_eq!(record.node_results["f"].status, NodeStatus::Completed);
    }

    #[tokio::test]
    async fn fail_fast_stops_the_run_and_skips_downstream() {
        let mut graph = Graph::new();
        graph
            .add_node(Node::new("a", AgentKind::Http).with_config(
                json!({"url": "http://127.0.0.1:0/unreachable", "timeout": 1}).as_object().cloned().unwrap(),
            ))
            .unwrap();
        graph.add_node(transform_node("b", json!({"operation": "passthrough"}))).unwrap();
        graph.add_edge(Edge::direct("a", "b")).unwrap();

        let record = execute(&graph, Value::Null, ExecutionOptions::default()).await.unwrap();

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.failed_node.as_deref(), Some("a"));
        assert!(!record.node_results.contains_key("b"));
    }

    #[tokio::test]
    async fn stop_on_failure_false_continues_the_run() {
        let mut graph = Graph::new();
        graph
            .add_node(
                Node::new("a", AgentKind::Http)
                    .with_config(
                        json!({"url": "http://127.0.0.1:0/unreachable", "timeout": 1}).as_object().cloned().unwrap(),
                    )
                    .with_stop_on_failure(false),
            )
            .unwrap();
        graph.add_node(transform_node("b", json!({"operation": "passthrough"}))).unwrap();
        graph.add_edge(Edge::direct("a", "b")).unwrap();

        let record = execute(&graph, json!({"y": 1}), ExecutionOptions::default()).await.unwrap();

        assert_eq!(record.status, RunStatus::Completed);
        assert!(record.node_results.contains_key("b"));
        assert!(record.node_results["b"].output.get("a").is_none());
    }

    #[tokio::test]
    async fn context_merge_includes_both_upstream_sources() {
        let mut graph = Graph::new();
        graph.add_node(transform_node("a", json!({"operation": "passthrough"}))).unwrap();
        graph.add_node(transform_node("b", json!({"operation": "passthrough"}))).unwrap();
        graph
            .add_node(transform_node("c", json!({"operation": "passthrough", "output_key": "merged"})))
            .unwrap();
        graph.add_edge(Edge::direct("a", "c")).unwrap();
        graph.add_edge(Edge::direct("b", "c")).unwrap();

        let record = execute(&graph, json!({"seed": 1}), ExecutionOptions::default()).await.unwrap();

        assert_eq!(record.status, RunStatus::Completed);
        let merged = &record.node_results["c"].output["merged"];
        assert!(merged.get("a").is_some());
        assert!(merged.get("b").is_some());
        assert!(merged.get("input").is_some());
    }
}
