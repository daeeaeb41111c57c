//! Agent registry — maps an agent kind to a constructor (§2 "Agent
//! registry"), grounded on `original_source/app/agents/registry.py`.
//!
//! Unlike the source's `AGENT_REGISTRY` dict of classes, this registry has
//! no state to hold: [`build`] is a direct match on [`AgentKind`] because
//! the tagged sum in `workflow-core` already enumerates every kind at
//! compile time — there is no way to register a new kind without adding a
//! new `AgentKind` variant and a new [`AgentConfig`] variant, so a runtime
//! map would only add an unreachable "unknown kind" branch.

use crate::agents::{code_exec, conditional, http, llm, transform, web_search};
use crate::config::{AgentConfig, ConfigError};
use crate::contract::Agent;
use crate::providers::CredentialProvider;
use serde_json::{Map, Value};
use std::sync::Arc;
use workflow_core::AgentKind;

/// Construct the agent for `kind` from a merged configuration mapping
/// (agent definition defaults with node overrides layered on top, per
/// §4.8 "Merge configuration").
pub fn build(
    kind: AgentKind,
    merged_config: Map<String, Value>,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<Box<dyn Agent>, ConfigError> {
    let config = AgentConfig::parse(kind, merged_config)?;
    Ok(build_from_config(config, credentials))
}

/// Construct the agent from an already-parsed [`AgentConfig`].
///
/// Infallible: parsing (the only fallible step) has already happened, so
/// this exists separately for callers that validate every node's config
/// up front (§9 "Generic mapping input is parsed into these records at
/// graph-validation time, not during execution") and only need to build
/// the agent once execution reaches that node.
pub fn build_from_config(config: AgentConfig, credentials: Arc<dyn CredentialProvider>) -> Box<dyn Agent> {
    match config {
        AgentConfig::Llm(c) => Box::new(llm::LlmAgent::new(c, credentials)),
        AgentConfig::WebSearch(c) => Box::new(web_search::WebSearchAgent::new(c)),
        AgentConfig::Http(c) => Box::new(http::HttpAgent::new(c)),
        AgentConfig::CodeExec(c) => Box::new(code_exec::CodeExecAgent::new(c)),
        AgentConfig::Transform(c) => Box::new(transform::TransformAgent::new(c)),
        AgentConfig::Conditional(c) => Box::new(conditional::ConditionalAgent::new(c)),
    }
}

/// Static `{kind, name, description}` listing for every registered agent
/// kind (§ Supplemented feature: `list_agent_types` in the source).
pub fn list_agent_kinds() -> Vec<AgentKindInfo> {
    vec![
        AgentKindInfo { kind: AgentKind::Llm, name: llm::NAME, description: llm::DESCRIPTION },
        AgentKindInfo { kind: AgentKind::WebSearch, name: web_search::NAME, description: web_search::DESCRIPTION },
        AgentKindInfo { kind: AgentKind::Http, name: http::NAME, description: http::DESCRIPTION },
        AgentKindInfo { kind: AgentKind::CodeExec, name: code_exec::NAME, description: code_exec::DESCRIPTION },
        AgentKindInfo { kind: AgentKind::Transform, name: transform::NAME, description: transform::DESCRIPTION },
        AgentKindInfo { kind: AgentKind::Conditional, name: conditional::NAME, description: conditional::DESCRIPTION },
    ]
}

#[derive(Debug, Clone)]
pub struct AgentKindInfo {
    pub kind: AgentKind,
    pub name: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EnvCredentialProvider;

    #[test]
    fn lists_all_six_kinds() {
        assert_eq!(list_agent_kinds().len(), 6);
    }

    #[test]
    fn builds_transform_agent_from_empty_config() {
        let agent = build(AgentKind::Transform, Map::new(), Arc::new(EnvCredentialProvider));
        assert!(agent.is_ok());
    }

    #[test]
    fn rejects_http_without_url() {
        let err = build(AgentKind::Http, Map::new(), Arc::new(EnvCredentialProvider));
        assert!(err.is_err());
    }
}
