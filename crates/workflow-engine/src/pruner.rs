//! Branch pruner (§4.8 "Branch pruner").
//!
//! Given a conditional node and the branch it took, every outbound edge
//! whose condition doesn't match the taken branch is dead; the pruner walks
//! outward from each dead edge's target, breadth-first over *all* outbound
//! edges regardless of their own condition, and marks everything it finds.
//! This is deliberately conservative (§9 Open Question ii): a node reachable
//! from both a pruned and a non-pruned path is still marked skipped.

use std::collections::{HashSet, VecDeque};
use workflow_core::{Branch, Graph};

/// Compute the set of node ids to skip because `conditional_node` took
/// `taken_branch`.
pub fn skip_set_for_branch(graph: &Graph, conditional_node: &str, taken_branch: Branch) -> HashSet<String> {
    let mut skipped = HashSet::new();
    let mut queue = VecDeque::new();

    for edge in graph.outgoing(conditional_node) {
        if edge.condition != Some(taken_branch) {
            queue.push_back(edge.target_id.clone());
        }
    }

    while let Some(node_id) = queue.pop_front() {
        if !skipped.insert(node_id.clone()) {
            continue;
        }
        for edge in graph.outgoing(&node_id) {
            if !skipped.contains(&edge.target_id) {
                queue.push_back(edge.target_id.clone());
            }
        }
    }

    skipped
}
