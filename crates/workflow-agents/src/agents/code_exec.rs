//! Code-execution agent (§4.5) — grounded on
//! `original_source/app/agents/code_exec_agent.py`, with the restricted
//! environment provided by the `rhai` embedded scripting engine rather than
//! a language `exec()`.
//!
//! `rhai::Engine`'s default standard package already matches the source's
//! `safe_globals` whitelist in spirit: arithmetic, string/array/map
//! operations, iteration, and type predicates are available, but there is
//! no filesystem or network access to register in the first place — the
//! capability restriction the spec calls for (§4.5, Design Note "Sandbox")
//! falls out of which functions we choose to expose, not a container or
//! OS-level boundary.

use crate::config::CodeExecConfig;
use crate::contract::{Agent, Context, NodeResult};
use async_trait::async_trait;
use rhai::{Engine, Scope};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

pub const NAME: &str = "code_exec";
pub const DESCRIPTION: &str = "Execute code safely and return results";

pub struct CodeExecAgent {
    config: CodeExecConfig,
}

impl CodeExecAgent {
    pub fn new(config: CodeExecConfig) -> Self {
        Self { config }
    }

    fn build_engine(stdout: Arc<Mutex<String>>) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(10_000_000);
        engine.set_max_expr_depths(64, 64);
        let sink = stdout.clone();
        engine.on_print(move |s| {
            let mut buf = sink.lock().unwrap();
            buf.push_str(s);
            buf.push('\n');
        });
        let sink = stdout;
        engine.on_debug(move |s, _, _| {
            let mut buf = sink.lock().unwrap();
            buf.push_str(s);
            buf.push('\n');
        });
        engine
    }

    fn execute_sync(code: &str, context: &Context, timeout: Duration) -> (bool, Value, String, String) {
        let stdout = Arc::new(Mutex::new(String::new()));
        let engine = Self::build_engine(stdout.clone());

        let mut scope = Scope::new();
        if let Ok(context_dynamic) = rhai::serde::to_dynamic(context) {
            scope.push_constant("context", context_dynamic);
        }

        let start = Instant::now();
        let outcome = engine.run_with_scope(&mut scope, code);
        let elapsed = start.elapsed();

        let captured_stdout = stdout.lock().unwrap().clone();

        match outcome {
            Err(e) if elapsed >= timeout => (
                false,
                Value::String(format!("Execution timed out after {}s", timeout.as_secs())),
                captured_stdout,
                e.to_string(),
            ),
            Err(e) => (
                false,
                Value::String(format!("Execution error: {e}")),
                captured_stdout,
                e.to_string(),
            ),
            Ok(()) => {
                let result = scope
                    .get_value::<rhai::Dynamic>("result")
                    .and_then(|d| rhai::serde::from_dynamic::<Value>(&d).ok());

                let output = result.unwrap_or_else(|| {
                    if !captured_stdout.is_empty() {
                        Value::String(captured_stdout.clone())
                    } else {
                        Value::String("executed successfully".to_string())
                    }
                });
                (true, output, captured_stdout, String::new())
            }
        }
    }
}

#[async_trait]
impl Agent for CodeExecAgent {
    async fn run(&self, objective: &str, context: &Context) -> NodeResult {
        let start = Instant::now();
        let code = self
            .config
            .code
            .clone()
            .unwrap_or_else(|| objective.to_string());
        let timeout = Duration::from_secs(self.config.timeout);

        debug!(timeout_secs = self.config.timeout, "dispatching code_exec node");

        let context = context.clone();
        let code_for_task = code.clone();
        let join = tokio::task::spawn_blocking(move || {
            Self::execute_sync(&code_for_task, &context, timeout)
        });

        let (success, output, stdout, stderr) = match tokio::time::timeout(timeout, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => (
                false,
                Value::String(format!("Execution error: {join_err}")),
                String::new(),
                String::new(),
            ),
            Err(_) => (
                false,
                Value::String(format!("Execution timed out after {}s", self.config.timeout)),
                String::new(),
                String::new(),
            ),
        };

        NodeResult {
            success,
            output,
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms: start.elapsed().as_millis() as u64,
            metadata: json!({"stdout": stdout, "stderr": stderr})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }
}
