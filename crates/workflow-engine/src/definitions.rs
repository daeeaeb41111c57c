//! Agent-definition store (§6 "External collaborators").
//!
//! `lookup(agent_def_id) -> {agent_kind, config}` is an external collaborator
//! in the source system (a database-backed catalog of reusable agent
//! configurations); this crate only needs its read interface. Missing ids
//! are absent, not an error — callers fall back to the node's own config.
//!
//! **Open question resolved** (see DESIGN.md): `workflow_core::Node::agent_kind`
//! is a required, typed field rather than an optional tag with a fallback
//! chain, so the driver never needs a definition's `agent_kind` to decide
//! what to run — the node always says so directly. The definition's `config`
//! is still consulted as the base layer node overrides are merged on top of.

use serde_json::{Map, Value};
use std::collections::HashMap;
use workflow_core::AgentKind;

/// A stored agent configuration, keyed by `agent_def_id` on a [`workflow_core::Node`].
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub agent_kind: AgentKind,
    pub config: Map<String, Value>,
}

/// Read-only lookup of agent definitions by id.
pub trait AgentDefinitionStore: Send + Sync {
    fn lookup(&self, agent_def_id: &str) -> Option<AgentDefinition>;
}

/// An in-process definition store backed by a `HashMap`, useful for tests
/// and for callers who load definitions once at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentDefinitionStore {
    definitions: HashMap<String, AgentDefinition>,
}

impl InMemoryAgentDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, id: impl Into<String>, definition: AgentDefinition) -> Self {
        self.definitions.insert(id.into(), definition);
        self
    }
}

impl AgentDefinitionStore for InMemoryAgentDefinitionStore {
    fn lookup(&self, agent_def_id: &str) -> Option<AgentDefinition> {
        self.definitions.get(agent_def_id).cloned()
    }
}

/// A store with nothing registered; every lookup is absent. The default
/// for runs that don't use the definition layer at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAgentDefinitionStore;

impl AgentDefinitionStore for NoopAgentDefinitionStore {
    fn lookup(&self, _agent_def_id: &str) -> Option<AgentDefinition> {
        None
    }
}

/// Merge an agent definition's config underneath a node's own config
/// overrides (§4.8 "Merge configuration": "definition's config first, then
/// node's overrides on top").
pub fn merge_config(definition: Option<&AgentDefinition>, node_config: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = definition.map(|d| d.config.clone()).unwrap_or_default();
    for (k, v) in node_config {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
