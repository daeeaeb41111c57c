//! The immutable node/edge graph that a single run executes.
//!
//! # Graph Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Graph                             │
//! │                                                           │
//! │   A(llm) ──────────► C(conditional) ──true──► T(transform)│
//! │                            │                              │
//! │                            └──false─────────► F(transform)│
//! │   B(http) ─────────────────┘ (feeds C's context)          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`Graph`] is built once via [`Graph::new`]/[`Graph::add_node`]/
//! [`Graph::add_edge`] and validated with [`Graph::validate`] before it is
//! handed to a scheduler or execution driver. Nothing about a `Graph` is
//! mutated once a run starts — a run only ever reads it.
//!
//! # Example
//!
//! ```rust
//! use workflow_core::{AgentKind, Branch, Edge, Graph, Node};
//!
//! let mut graph = Graph::new();
//! graph.add_node(Node::new("a", AgentKind::Transform)).unwrap();
//! graph.add_node(Node::new("b", AgentKind::Transform)).unwrap();
//! graph.add_edge(Edge::direct("a", "b")).unwrap();
//! graph.validate().unwrap();
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// The six agent kinds a node may be dispatched to.
///
/// The registry (`workflow-agents::registry`) maps each of these to a
/// constructor; `workflow-core` only needs the tag to validate edge
/// conditions (§3 invariant: "Edges from a conditional node must carry a
/// condition; edges from any other node must have empty condition").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Llm,
    WebSearch,
    Http,
    CodeExec,
    Transform,
    Conditional,
}

impl AgentKind {
    /// Whether outbound edges from a node of this kind are allowed (and
    /// required) to carry a branch condition.
    pub fn is_conditional(self) -> bool {
        matches!(self, AgentKind::Conditional)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentKind::Llm => "llm",
            AgentKind::WebSearch => "web_search",
            AgentKind::Http => "http",
            AgentKind::CodeExec => "code_exec",
            AgentKind::Transform => "transform",
            AgentKind::Conditional => "conditional",
        };
        f.write_str(s)
    }
}

/// The branch label carried by an edge leaving a conditional node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    True,
    False,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Branch::True => "true",
            Branch::False => "false",
        })
    }
}

/// A node in the graph.
///
/// `config` is an untyped JSON object at this layer — `workflow-core` has no
/// notion of per-agent option sets. The engine (`workflow-engine`) is
/// responsible for merging `agent_def_id`'s stored config underneath it and
/// handing the merged mapping to `workflow-agents` for typed parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub agent_kind: AgentKind,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub agent_def_id: Option<String>,
    #[serde(default = "default_stop_on_failure")]
    pub stop_on_failure: bool,
}

fn default_stop_on_failure() -> bool {
    true
}

impl Node {
    pub fn new(id: impl Into<String>, agent_kind: AgentKind) -> Self {
        Self {
            id: id.into(),
            agent_kind,
            objective: String::new(),
            config: Map::new(),
            agent_def_id: None,
            stop_on_failure: true,
        }
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_stop_on_failure(mut self, stop_on_failure: bool) -> Self {
        self.stop_on_failure = stop_on_failure;
        self
    }
}

/// An edge between two nodes, optionally labeled with a branch.
///
/// `condition` is `None` for edges leaving any non-conditional node and
/// `Some(branch)` for edges leaving a conditional node — both are enforced
/// by [`Graph::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub condition: Option<Branch>,
}

impl Edge {
    pub fn direct(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            condition: None,
        }
    }

    pub fn branch(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        condition: Branch,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            condition: Some(condition),
        }
    }

    fn condition_key(&self) -> String {
        self.condition.map(|c| c.to_string()).unwrap_or_default()
    }
}

/// The immutable (N, E) pair a run executes (§3).
///
/// Nodes are stored in declaration order (a `Vec` plus an id index) so the
/// scheduler's tie-break rule — "emitted in the order they appear in the
/// graph's node list" — has a concrete, observable order to fall back on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, rejecting duplicate ids.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Append an edge. Duplicate (source, target, condition) triples are
    /// rejected; referential integrity and condition placement are checked
    /// by [`Graph::validate`], not here, so edges may be added before their
    /// endpoints exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if edge.source_id == edge.target_id {
            return Err(GraphError::SelfLoop(edge.source_id));
        }
        let dup = self.edges.iter().any(|e| {
            e.source_id == edge.source_id
                && e.target_id == edge.target_id
                && e.condition_key() == edge.condition_key()
        });
        if dup {
            let condition = edge.condition_key();
            return Err(GraphError::DuplicateEdge {
                source_id: edge.source_id,
                target: edge.target_id,
                condition,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Edges whose `target_id` equals `id`, in declaration order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target_id == id)
    }

    /// Edges whose `source_id` equals `id`, in declaration order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source_id == id)
    }

    /// Rebuild the id index after deserializing (`index` is `#[serde(skip)]`).
    pub fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }

    /// Check referential integrity, self-loops, and condition placement.
    /// Acyclicity is checked by the scheduler (§4.8 step 2) rather than
    /// here, since Kahn's algorithm already needs a full pass to detect it
    /// and this avoids doing that pass twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = HashSet::new();
        for node in &self.nodes {
            if !seen_ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &self.edges {
            if !self.index.contains_key(&edge.source_id) {
                return Err(GraphError::DanglingEdge(edge.source_id.clone()));
            }
            if !self.index.contains_key(&edge.target_id) {
                return Err(GraphError::DanglingEdge(edge.target_id.clone()));
            }
            if edge.source_id == edge.target_id {
                return Err(GraphError::SelfLoop(edge.source_id.clone()));
            }

            let source_is_conditional = self.get_node(&edge.source_id).unwrap().agent_kind.is_conditional();
            match (source_is_conditional, edge.condition) {
                (true, None) => {
                    return Err(GraphError::BadCondition {
                        source_id: edge.source_id.clone(),
                        target: edge.target_id.clone(),
                        condition: String::new(),
                        node_kind: "conditional",
                    });
                }
                (false, Some(branch)) => {
                    return Err(GraphError::BadCondition {
                        source_id: edge.source_id.clone(),
                        target: edge.target_id.clone(),
                        condition: branch.to_string(),
                        node_kind: "non-conditional",
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_node_ids() {
        let mut g = Graph::new();
        g.add_node(Node::new("a", AgentKind::Transform)).unwrap();
        let err = g.add_node(Node::new("a", AgentKind::Transform)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("a".to_string()));
    }

    #[test]
    fn rejects_self_loop() {
        let mut g = Graph::new();
        g.add_node(Node::new("a", AgentKind::Transform)).unwrap();
        let err = g.add_edge(Edge::direct("a", "a")).unwrap_err();
        assert_eq!(err, GraphError::SelfLoop("a".to_string()));
    }

    #[test]
    fn rejects_dangling_edge() {
        let mut g = Graph::new();
        g.add_node(Node::new("a", AgentKind::Transform)).unwrap();
        g.add_edge(Edge::direct("a", "ghost")).unwrap();
        assert!(matches!(g.validate(), Err(GraphError::DanglingEdge(_))));
    }

    #[test]
    fn conditional_node_requires_condition_on_outbound_edges() {
        let mut g = Graph::new();
        g.add_node(Node::new("c", AgentKind::Conditional)).unwrap();
        g.add_node(Node::new("t", AgentKind::Transform)).unwrap();
        g.add_edge(Edge::direct("c", "t")).unwrap();
        assert!(matches!(
            g.validate(),
            Err(GraphError::BadCondition { node_kind: "conditional", .. })
        ));
    }

    #[test]
    fn non_conditional_node_rejects_condition_on_outbound_edge() {
        let mut g = Graph::new();
        g.add_node(Node::new("a", AgentKind::Transform)).unwrap();
        g.add_node(Node::new("b", AgentKind::Transform)).unwrap();
        g.add_edge(Edge::branch("a", "b", Branch::True)).unwrap();
        assert!(matches!(
            g.validate(),
            Err(GraphError::BadCondition { node_kind: "non-conditional", .. })
        ));
    }

    #[test]
    fn valid_conditional_graph_passes() {
        let mut g = Graph::new();
        g.add_node(Node::new("c", AgentKind::Conditional)).unwrap();
        g.add_node(Node::new("t", AgentKind::Transform)).unwrap();
        g.add_node(Node::new("f", AgentKind::Transform)).unwrap();
        g.add_edge(Edge::branch("c", "t", Branch::True)).unwrap();
        g.add_edge(Edge::branch("c", "f", Branch::False)).unwrap();
        g.validate().unwrap();
    }
}
