//! Typed, per-agent configuration (Design Note: "Dynamic agent config →
//! structured variants").
//!
//! The source system collapses every agent's options into one untyped
//! mapping. Here each agent kind gets its own record, and [`AgentConfig`] is
//! the tagged sum dispatched on by [`crate::registry`]. [`AgentConfig::parse`]
//! converts a merged JSON object (node overrides layered on an agent
//! definition's stored config, per §4.8 "Merge configuration") into the
//! right variant at graph-validation time, not during execution — a
//! malformed option set is rejected before any node runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use workflow_core::AgentKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config for {kind} node: {source}")]
    Invalid {
        kind: AgentKind,
        #[source]
        source: serde_json::Error,
    },
}

/// `provider` is resolved from credential availability (§4.2), not a user
/// override, but is kept here so callers can inspect which provider was
/// selected after the fact via `NodeResult::metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant.".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_engine() -> String {
    "duckduckgo".to_string()
}
fn default_max_results() -> usize {
    5
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeExecConfig {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOperation {
    Passthrough,
    ExtractField,
    Filter,
    Map,
    Aggregate,
    Merge,
    JsonParse,
}

impl Default for TransformOperation {
    fn default() -> Self {
        TransformOperation::Passthrough
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggType {
    Count,
    First,
    Last,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub operation: TransformOperation,
    #[serde(default)]
    pub input_key: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub condition_field: Option<String>,
    #[serde(default)]
    pub condition_value: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub agg_type: Option<AggType>,
    #[serde(default)]
    pub output_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalConfig {
    #[serde(default)]
    pub field: String,
    #[serde(default = "default_operator")]
    pub operator: ConditionalOperator,
    #[serde(default)]
    pub value: String,
}

fn default_operator() -> ConditionalOperator {
    ConditionalOperator::Eq
}

/// The tagged sum of every agent kind's configuration.
#[derive(Debug, Clone)]
pub enum AgentConfig {
    Llm(LlmConfig),
    WebSearch(WebSearchConfig),
    Http(HttpConfig),
    CodeExec(CodeExecConfig),
    Transform(TransformConfig),
    Conditional(ConditionalConfig),
}

impl AgentConfig {
    /// Parse a merged JSON object into the config variant for `kind`.
    pub fn parse(kind: AgentKind, merged: Map<String, Value>) -> Result<Self, ConfigError> {
        let value = Value::Object(merged);
        let wrap = |e: serde_json::Error| ConfigError::Invalid { kind, source: e };
        Ok(match kind {
            AgentKind::Llm => AgentConfig::Llm(serde_json::from_value(value).map_err(wrap)?),
            AgentKind::WebSearch => {
                AgentConfig::WebSearch(serde_json::from_value(value).map_err(wrap)?)
            }
            AgentKind::Http => AgentConfig::Http(serde_json::from_value(value).map_err(wrap)?),
            AgentKind::CodeExec => {
                AgentConfig::CodeExec(serde_json::from_value(value).map_err(wrap)?)
            }
            AgentKind::Transform => {
                AgentConfig::Transform(serde_json::from_value(value).map_err(wrap)?)
            }
            AgentKind::Conditional => {
                AgentConfig::Conditional(serde_json::from_value(value).map_err(wrap)?)
            }
        })
    }
}
