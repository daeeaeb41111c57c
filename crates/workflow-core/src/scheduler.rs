//! Kahn-style topological scheduler (§4.8 steps 1-2).
//!
//! Produces a deterministic execution order: nodes become eligible in
//! graph-declaration order, and ties are always broken by declaration
//! order, never by id or hash order. Rejects any graph containing a cycle.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Compute a topological order over `graph`'s nodes.
///
/// Maintains in-degree counts and seeds the queue with every zero-in-degree
/// node in the order they appear in `graph.nodes()`. At each step the head
/// of the queue is emitted and its successors' in-degrees decremented *in
/// the order of `graph.outgoing(node)`*; a successor that reaches zero is
/// appended to the back of the queue. If the final order's length is less
/// than the node count, at least one node never reached zero in-degree —
/// the graph has a cycle.
pub fn topological_order(graph: &Graph) -> Result<Vec<String>> {
    debug!(node_count = graph.nodes().len(), edge_count = graph.edges().len(), "computing topological order");

    let mut in_degree: HashMap<&str, usize> = graph.nodes().iter().map(|n| (n.id.as_str(), 0)).collect();
    for edge in graph.edges() {
        *in_degree.get_mut(edge.target_id.as_str()).expect("validated graph") += 1;
    }

    let mut queue: VecDeque<&str> = graph
        .nodes()
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.nodes().len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for edge in graph.outgoing(id) {
            let degree = in_degree.get_mut(edge.target_id.as_str()).expect("validated graph");
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(edge.target_id.as_str());
            }
        }
    }

    if order.len() != graph.nodes().len() {
        let stuck = graph
            .nodes()
            .iter()
            .map(|n| n.id.as_str())
            .find(|id| !order.iter().any(|o| o == id))
            .unwrap_or("<unknown>");
        warn!(node = %stuck, "cycle detected, rejecting graph");
        return Err(GraphError::Cycle(stuck.to_string()));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AgentKind, Branch, Edge, Node};

    fn node(id: &str) -> Node {
        Node::new(id, AgentKind::Transform)
    }

    #[test]
    fn empty_graph_yields_empty_order() {
        let g = Graph::new();
        assert_eq!(topological_order(&g).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn linear_chain_respects_order() {
        let mut g = Graph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        g.add_node(node("c")).unwrap();
        g.add_edge(Edge::direct("a", "b")).unwrap();
        g.add_edge(Edge::direct("b", "c")).unwrap();
        assert_eq!(topological_order(&g).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_broken_by_declaration_order() {
        let mut g = Graph::new();
        g.add_node(node("z")).unwrap();
        g.add_node(node("a")).unwrap();
        g.add_node(node("m")).unwrap();
        // No edges: all three are zero in-degree, should emit in declared order.
        assert_eq!(topological_order(&g).unwrap(), vec!["z", "a", "m"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let mut g = Graph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        g.add_edge(Edge::direct("a", "b")).unwrap();
        g.add_edge(Edge::direct("b", "a")).unwrap();
        assert!(matches!(topological_order(&g), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn conditional_fanout_does_not_confuse_ordering() {
        let mut g = Graph::new();
        g.add_node(Node::new("c", AgentKind::Conditional)).unwrap();
        g.add_node(node("t")).unwrap();
        g.add_node(node("f")).unwrap();
        g.add_edge(Edge::branch("c", "t", Branch::True)).unwrap();
        g.add_edge(Edge::branch("c", "f", Branch::False)).unwrap();
        let order = topological_order(&g).unwrap();
        assert_eq!(order[0], "c");
        assert_eq!(order.len(), 3);
    }
}
