//! LLM agent (§4.2) — grounded on `original_source/app/agents/llm_agent.py`
//! and the reqwest-based provider clients in the teacher's `llm::remote`
//! module.

use crate::config::LlmConfig;
use crate::contract::{Agent, Context, NodeResult};
use crate::providers::{openai_cost, CredentialProvider, Provider, ANTHROPIC_FLAT_RATE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const NAME: &str = "llm";
pub const DESCRIPTION: &str =
    "General-purpose language model agent for text generation, analysis, and reasoning";

pub struct LlmAgent {
    config: LlmConfig,
    credentials: Arc<dyn CredentialProvider>,
    client: reqwest::Client,
}

impl LlmAgent {
    pub fn new(config: LlmConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            config,
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn messages(&self, objective: &str, context: &Context) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: self.config.system_prompt.clone(),
        }];

        if !context.is_empty() {
            let rendered = serde_json::to_string_pretty(context).unwrap_or_default();
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: format!("Context from previous steps:\n{rendered}"),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: objective.to_string(),
        });
        messages
    }

    async fn call_openai(
        &self,
        messages: &[ChatMessage],
        model: &str,
        api_key: &str,
        start: Instant,
    ) -> NodeResult {
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let resp = match self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return NodeResult::failed(format!("LLM call failed: {status}: {text}"), start);
        }

        let parsed: OpenAiResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        let Some(choice) = parsed.choices.into_iter().next() else {
            return NodeResult::failed("LLM call failed: empty response", start);
        };

        let input_tokens = parsed.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0);
        let output_tokens = parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0);
        let total_tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);
        let cost = openai_cost(model, input_tokens, output_tokens);

        NodeResult::ok(Value::String(choice.message.content), start)
            .with_tokens(total_tokens)
            .with_cost(cost)
            .with_metadata(
                json!({"model": model, "finish_reason": choice.finish_reason})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            )
    }

    async fn call_anthropic(
        &self,
        messages: &[ChatMessage],
        model: &str,
        api_key: &str,
        start: Instant,
    ) -> NodeResult {
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let user_messages: Vec<&ChatMessage> =
            messages.iter().filter(|m| m.role != "system").collect();

        let body = json!({
            "model": model,
            "system": system,
            "messages": user_messages,
            "max_tokens": self.config.max_tokens,
        });

        let resp = match self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return NodeResult::failed(format!("LLM call failed: {status}: {text}"), start);
        }

        let parsed: AnthropicResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        let text = parsed
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        let total_tokens = parsed.usage.input_tokens + parsed.usage.output_tokens;

        NodeResult::ok(Value::String(text), start)
            .with_tokens(total_tokens)
            .with_cost(total_tokens as f64 * ANTHROPIC_FLAT_RATE)
            .with_metadata(json!({"model": model}).as_object().cloned().unwrap_or_default())
    }

    async fn call_local(&self, messages: &[ChatMessage], model: &str, start: Instant) -> NodeResult {
        let endpoint = self.credentials.local_endpoint();
        let body = json!({"model": model, "messages": messages, "stream": false});

        let resp = match self
            .client
            .post(format!("{endpoint}/api/chat"))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        let parsed: Value = match resp.json().await {
            Ok(p) => p,
            Err(e) => return NodeResult::failed(format!("LLM call failed: {e}"), start),
        };

        let content = parsed
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();
        let tokens = parsed.get("eval_count").and_then(|v| v.as_u64()).unwrap_or(0);

        NodeResult::ok(Value::String(content), start)
            .with_tokens(tokens)
            .with_metadata(
                json!({"model": model, "provider": "ollama"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            )
    }
}

#[async_trait]
impl Agent for LlmAgent {
    async fn run(&self, objective: &str, context: &Context) -> NodeResult {
        let start = Instant::now();
        let model = self
            .config
            .model
            .clone()
            .unwrap_or_else(|| self.credentials.default_model());
        let messages = self.messages(objective, context);

        match self.credentials.resolve() {
            Provider::OpenAi => {
                debug!(%model, "dispatching llm node to openai");
                let key = self.credentials.openai_api_key().unwrap_or_default();
                self.call_openai(&messages, &model, &key, start).await
            }
            Provider::Anthropic => {
                debug!(%model, "dispatching llm node to anthropic");
                let key = self.credentials.anthropic_api_key().unwrap_or_default();
                self.call_anthropic(&messages, &model, &key, start).await
            }
            Provider::Local => {
                warn!(%model, "no remote credentials present, dispatching llm node to local endpoint");
                self.call_local(&messages, &model, start).await
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EnvCredentialProvider;

    #[test]
    fn builds_system_and_objective_messages_with_no_context() {
        let agent = LlmAgent::new(LlmConfig::default(), Arc::new(EnvCredentialProvider));
        let messages = agent.messages("summarize this", &Context::new());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "summarize this");
    }

    #[test]
    fn includes_context_message_when_context_nonempty() {
        let agent = LlmAgent::new(LlmConfig::default(), Arc::new(EnvCredentialProvider));
        let mut ctx = Context::new();
        ctx.insert("a".to_string(), json!({"x": 1}));
        let messages = agent.messages("go", &ctx);
        assert_eq!(messages.len(), 3);
        assert!(messages[1].content.contains("Context from previous steps"));
    }
}
