use proptest::prelude::*;
use std::collections::HashMap;
use workflow_core::{AgentKind, Edge, Graph, Node};

/// Build a graph of `node_count` nodes where node `i` may have an edge to
/// any node `j > i` — guarantees acyclicity by construction so the strategy
/// only needs to vary which forward edges are present.
fn acyclic_graph_strategy(max_nodes: usize) -> impl Strategy<Value = Graph> {
    (2..=max_nodes).prop_flat_map(|node_count| {
        let edge_choices: Vec<(usize, usize)> = (0..node_count)
            .flat_map(|i| (i + 1..node_count).map(move |j| (i, j)))
            .collect();
        let edge_count = edge_choices.len();

        prop::collection::vec(any::<bool>(), edge_count).prop_map(move |include| {
            let mut graph = Graph::new();
            for i in 0..node_count {
                graph.add_node(Node::new(format!("n{i}"), AgentKind::Transform)).unwrap();
            }
            for (flag, (i, j)) in include.iter().zip(edge_choices.iter()) {
                if *flag {
                    graph.add_edge(Edge::direct(format!("n{i}"), format!("n{j}"))).unwrap();
                }
            }
            graph
        })
    })
}

proptest! {
    #[test]
    fn topological_order_covers_every_node_exactly_once(graph in acyclic_graph_strategy(8)) {
        let order = workflow_core::topological_order(&graph).unwrap();
        prop_assert_eq!(order.len(), graph.nodes().len());

        let mut seen = std::collections::HashSet::new();
        for id in &order {
            prop_assert!(seen.insert(id.clone()), "duplicate id in order: {id}");
        }
    }

    #[test]
    fn topological_order_respects_every_edge(graph in acyclic_graph_strategy(8)) {
        let order = workflow_core::topological_order(&graph).unwrap();
        let position: HashMap<&str, usize> = order.iter().map(|s| s.as_str()).zip(0..).collect();

        for edge in graph.edges() {
            let source_pos = position[edge.source_id.as_str()];
            let target_pos = position[edge.target_id.as_str()];
            prop_assert!(source_pos < target_pos);
        }
    }
}
