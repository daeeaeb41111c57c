//! Web search agent (§4.3) — grounded on
//! `original_source/app/agents/web_search_agent.py`.

use crate::config::WebSearchConfig;
use crate::contract::{Agent, Context, NodeResult};
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;
use tracing::warn;

pub const NAME: &str = "web_search";
pub const DESCRIPTION: &str =
    "Search the web for information, scrape pages, and extract structured data";

pub struct WebSearchAgent {
    config: WebSearchConfig,
}

impl WebSearchAgent {
    pub fn new(config: WebSearchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Agent for WebSearchAgent {
    async fn run(&self, objective: &str, _context: &Context) -> NodeResult {
        let start = Instant::now();

        // This back end always reports itself unavailable rather than reach
        // out to a real search provider; per §4.3 that is advisory, not
        // fatal, so downstream nodes still get a usable (if empty) context.
        warn!(engine = %self.config.engine, "web search back end unavailable, returning advisory result");
        let results = json!([{
            "title": "Web search not available",
            "url": "",
            "snippet": format!("No web search backend is configured for engine '{}'", self.config.engine),
        }]);

        NodeResult::ok(results, start).with_metadata(
            json!({"engine": self.config.engine, "result_count": 1, "query": objective})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        )
    }
}
