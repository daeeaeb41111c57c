//! Context assembler (§4.8 bullet "Assemble the node's context").

use serde_json::Value;
use std::collections::HashMap;
use workflow_agents::Context;
use workflow_core::Graph;

/// `input_payload` is considered empty (and therefore omitted from every
/// node's context) when it is null or an object/array with no entries.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Build the context presented to `node_id`: the run's input payload under
/// the reserved key `input` (omitted if empty), plus the recorded output of
/// every node with an edge into `node_id` that has already produced one.
pub fn assemble_context(
    graph: &Graph,
    node_id: &str,
    context_store: &HashMap<String, Value>,
    input_payload: &Value,
) -> Context {
    let mut context = Context::new();

    if !is_empty_payload(input_payload) {
        context.insert("input".to_string(), input_payload.clone());
    }

    for edge in graph.incoming(node_id) {
        if let Some(output) = context_store.get(&edge.source_id) {
            context.insert(edge.source_id.clone(), output.clone());
        }
    }

    context
}
