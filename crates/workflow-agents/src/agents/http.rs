//! HTTP-call agent (§4.4) — grounded on
//! `original_source/app/agents/api_call_agent.py`.

use crate::config::{HttpConfig, HttpMethod};
use crate::contract::{Agent, Context, NodeResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

pub const NAME: &str = "http";
pub const DESCRIPTION: &str =
    "Make HTTP requests to external APIs and return structured responses";

pub struct HttpAgent {
    config: HttpConfig,
    client: reqwest::Client,
}

impl HttpAgent {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Replace `{{key}}` with the string form of `context[key]`, literally —
    /// no escaping, no expression language (§4.4 "Template interpolation").
    fn interpolate(template: &str, context: &Context) -> String {
        let mut rendered = template.to_string();
        for (key, value) in context {
            let needle = format!("{{{{{key}}}}}");
            let replacement = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rendered = rendered.replace(&needle, &replacement);
        }
        rendered
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn run(&self, _objective: &str, context: &Context) -> NodeResult {
        let start = Instant::now();

        let url = Self::interpolate(&self.config.url, context);
        let body = self.config.body.as_ref().map(|b| Self::interpolate(b, context));
        let method = match self.config.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        debug!(%url, method = ?self.config.method, "dispatching http node");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(Duration::from_secs(self.config.timeout));

        for (key, value) in &self.config.headers {
            let header_value = match value {
                Value::String(s) => Self::interpolate(s, context),
                other => other.to_string(),
            };
            request = request.header(key, header_value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return NodeResult::failed(format!("API call failed: {e}"), start),
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let text = response.text().await.unwrap_or_default();
        let output = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        NodeResult {
            success: status.as_u16() < 400,
            output,
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms: start.elapsed().as_millis() as u64,
            metadata: json!({
                "status_code": status.as_u16(),
                "url": final_url,
                "method": method.as_str(),
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interpolates_single_key() {
        let mut ctx = Context::new();
        ctx.insert("id".to_string(), json!(42));
        let rendered = HttpAgent::interpolate("https://api.example.com/items/{{id}}", &ctx);
        assert_eq!(rendered, "https://api.example.com/items/42");
    }

    #[test]
    fn leaves_unknown_placeholders_untouched() {
        let ctx = Context::new();
        let rendered = HttpAgent::interpolate("https://api.example.com/{{missing}}", &ctx);
        assert_eq!(rendered, "https://api.example.com/{{missing}}");
    }
}
