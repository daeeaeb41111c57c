//! Conditional agent (§4.7) — grounded on
//! `original_source/app/agents/conditional_agent.py`.

use crate::config::{ConditionalConfig, ConditionalOperator};
use crate::contract::{Agent, Context, NodeResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Instant;

pub const NAME: &str = "conditional";
pub const DESCRIPTION: &str = "Route workflow execution based on conditions - if/else branching";

pub struct ConditionalAgent {
    config: ConditionalConfig,
}

impl ConditionalAgent {
    pub fn new(config: ConditionalConfig) -> Self {
        Self { config }
    }

    /// Dotted-path lookup through mappings only — unlike the transform
    /// agent's `extract_field`, the source's conditional agent never
    /// indexes into a list.
    fn extract(data: &Value, field: &str) -> Value {
        if field.is_empty() {
            return data.clone();
        }
        let mut current = data.clone();
        for part in field.split('.') {
            current = match &current {
                Value::Object(map) => map.get(part).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        current
    }

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if !s.is_empty() => s.parse::<f64>().ok(),
            Value::Null => Some(0.0),
            _ => None,
        }
    }

    /// Evaluate the operator. Unrepresentable comparisons (e.g. a non-numeric
    /// value against an ordered operator) evaluate to `false` rather than
    /// failing — §4.7 "Never fails from a semantic mismatch".
    fn evaluate(op: ConditionalOperator, actual: &Value, configured: &str) -> bool {
        match op {
            ConditionalOperator::Eq => stringify(actual) == configured,
            ConditionalOperator::Ne => stringify(actual) != configured,
            ConditionalOperator::Gt | ConditionalOperator::Gte | ConditionalOperator::Lt | ConditionalOperator::Lte => {
                let lhs = Self::as_number(actual);
                let rhs = configured.parse::<f64>().ok();
                match (lhs, rhs) {
                    (Some(a), Some(b)) => match op {
                        ConditionalOperator::Gt => a > b,
                        ConditionalOperator::Gte => a >= b,
                        ConditionalOperator::Lt => a < b,
                        ConditionalOperator::Lte => a <= b,
                        _ => unreachable!(),
                    },
                    // Fall back to raw string comparison when coercion fails,
                    // matching the source's bare `except: pass` fallback.
                    _ => match op {
                        ConditionalOperator::Gt => stringify(actual).as_str() > configured,
                        ConditionalOperator::Gte => stringify(actual).as_str() >= configured,
                        ConditionalOperator::Lt => stringify(actual).as_str() < configured,
                        ConditionalOperator::Lte => stringify(actual).as_str() <= configured,
                        _ => unreachable!(),
                    },
                }
            }
            ConditionalOperator::Contains => stringify(actual).contains(configured),
            ConditionalOperator::NotContains => !stringify(actual).contains(configured),
            ConditionalOperator::IsEmpty => is_falsy(actual),
            ConditionalOperator::IsNotEmpty => !is_falsy(actual),
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

#[async_trait]
impl Agent for ConditionalAgent {
    async fn run(&self, _objective: &str, context: &Context) -> NodeResult {
        let start = Instant::now();
        let data: Value = json!(context);
        let actual = Self::extract(&data, &self.config.field);
        let condition_met = Self::evaluate(self.config.operator, &actual, &self.config.value);
        let branch = if condition_met { "true" } else { "false" };

        NodeResult::ok(
            json!({
                "condition_met": condition_met,
                "branch": branch,
                "evaluated": format!("{} {:?} {} => {}", self.config.field, self.config.operator, self.config.value, condition_met),
            }),
            start,
        )
        .with_metadata(
            json!({
                "field": self.config.field,
                "operator": format!("{:?}", self.config.operator),
                "value": self.config.value,
                "actual": stringify(&actual),
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        )
    }
}
