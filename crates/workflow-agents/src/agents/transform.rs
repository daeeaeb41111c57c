//! Data-transform agent (§4.6) — grounded on
//! `original_source/app/agents/data_transform_agent.py`.

use crate::config::{AggType, TransformConfig, TransformOperation};
use crate::contract::{Agent, Context, NodeResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Instant;

pub const NAME: &str = "transform";
pub const DESCRIPTION: &str = "Transform, filter, map, and reshape data flowing between agents";

pub struct TransformAgent {
    config: TransformConfig,
}

impl TransformAgent {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Dotted-path lookup; all-digit segments index into arrays, any other
    /// missing segment yields null (§4.6 "extract_field").
    fn extract(data: &Value, field: &str) -> Value {
        if field.is_empty() {
            return data.clone();
        }
        let mut current = data.clone();
        for part in field.split('.') {
            current = match &current {
                Value::Object(map) => map.get(part).cloned().unwrap_or(Value::Null),
                Value::Array(items) if part.chars().all(|c| c.is_ascii_digit()) => part
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        current
    }

    fn filter(data: &Value, field: &str, value: &str) -> Value {
        let Value::Array(items) = data else {
            return data.clone();
        };
        let kept: Vec<Value> = items
            .iter()
            .filter(|item| stringify(&Self::extract(item, field)) == value)
            .cloned()
            .collect();
        Value::Array(kept)
    }

    fn map(data: &Value, template: &str) -> Value {
        let Value::Array(items) = data else {
            return data.clone();
        };
        let mapped: Vec<Value> = items
            .iter()
            .map(|item| {
                let rendered = template.replace("{item}", &serde_json::to_string(item).unwrap_or_default());
                Value::String(rendered)
            })
            .collect();
        Value::Array(mapped)
    }

    fn aggregate(data: &Value, agg_type: AggType) -> Value {
        let Value::Array(items) = data else {
            return data.clone();
        };
        match agg_type {
            AggType::Count => json!({"count": items.len()}),
            AggType::First => items.first().cloned().unwrap_or(Value::Null),
            AggType::Last => items.last().cloned().unwrap_or(Value::Null),
        }
    }

    fn merge(data: &Value) -> Value {
        let Value::Object(outer) = data else {
            return data.clone();
        };
        let mut merged = Map::new();
        for value in outer.values() {
            if let Value::Object(inner) = value {
                for (k, v) in inner {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        Value::Object(merged)
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Agent for TransformAgent {
    async fn run(&self, _objective: &str, context: &Context) -> NodeResult {
        let start = Instant::now();

        let context_value: Value = json!(context);
        let data = match &self.config.input_key {
            Some(key) => context_value.get(key).cloned().unwrap_or(Value::Null),
            None => context_value,
        };

        let result = match self.config.operation {
            TransformOperation::Passthrough => data,
            TransformOperation::ExtractField => {
                Self::extract(&data, self.config.field.as_deref().unwrap_or(""))
            }
            TransformOperation::Filter => Self::filter(
                &data,
                self.config.condition_field.as_deref().unwrap_or(""),
                self.config.condition_value.as_deref().unwrap_or(""),
            ),
            TransformOperation::Map => Self::map(&data, self.config.template.as_deref().unwrap_or("{item}")),
            TransformOperation::Aggregate => {
                Self::aggregate(&data, self.config.agg_type.unwrap_or(AggType::Count))
            }
            TransformOperation::Merge => Self::merge(&data),
            TransformOperation::JsonParse => match &data {
                Value::String(s) => match serde_json::from_str(s) {
                    Ok(parsed) => parsed,
                    Err(e) => return NodeResult::failed(format!("Transform failed: {e}"), start),
                },
                other => other.clone(),
            },
        };

        let output = match &self.config.output_key {
            Some(key) => json!({ key.clone(): result }),
            None => result,
        };

        NodeResult::ok(output, start).with_metadata(
            json!({"operation": format!("{:?}", self.config.operation)})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(key: &str, value: Value) -> Context {
        let mut ctx = Context::new();
        ctx.insert(key.to_string(), value);
        ctx
    }

    #[tokio::test]
    async fn passthrough_returns_input_unchanged() {
        let agent = TransformAgent::new(TransformConfig::default());
        let ctx = ctx_with("a", json!(42));
        let out = agent.run("", &ctx).await;
        assert_eq!(out.output, json!({"a": 42}));
    }

    #[tokio::test]
    async fn extract_field_reads_dotted_path_from_input_key() {
        let agent = TransformAgent::new(TransformConfig {
            operation: TransformOperation::ExtractField,
            input_key: Some("a".to_string()),
            field: Some("x".to_string()),
            ..Default::default()
        });
        let ctx = ctx_with("a", json!({"x": 42, "y": 7}));
        let out = agent.run("", &ctx).await;
        assert_eq!(out.output, json!(42));
    }

    #[tokio::test]
    async fn extract_field_indexes_arrays_by_digit_segment() {
        let data = json!({"items": [{"n": "first"}, {"n": "second"}]});
        let result = TransformAgent::extract(&data, "items.1.n");
        assert_eq!(result, json!("second"));
    }

    #[tokio::test]
    async fn extract_field_missing_segment_yields_null() {
        let data = json!({"a": 1});
        assert_eq!(TransformAgent::extract(&data, "a.b.c"), Value::Null);
    }

    #[tokio::test]
    async fn output_key_wraps_result() {
        let agent = TransformAgent::new(TransformConfig {
            operation: TransformOperation::Passthrough,
            output_key: Some("wrapped".to_string()),
            ..Default::default()
        });
        let ctx = Context::new();
        let out = agent.run("", &ctx).await;
        assert_eq!(out.output, json!({"wrapped": {}}));
    }

    #[tokio::test]
    async fn json_parse_round_trips_structured_values() {
        let agent = TransformAgent::new(TransformConfig {
            operation: TransformOperation::JsonParse,
            input_key: Some("raw".to_string()),
            ..Default::default()
        });
        let ctx = ctx_with("raw", json!("{\"a\":1,\"b\":[1,2,3]}"));
        let out = agent.run("", &ctx).await;
        assert_eq!(out.output, json!({"a": 1, "b": [1, 2, 3]}));
    }

    #[tokio::test]
    async fn json_parse_failure_reports_failed_result() {
        let agent = TransformAgent::new(TransformConfig {
            operation: TransformOperation::JsonParse,
            input_key: Some("raw".to_string()),
            ..Default::default()
        });
        let ctx = ctx_with("raw", json!("not json"));
        let out = agent.run("", &ctx).await;
        assert!(!out.success);
        assert!(out.output.as_str().unwrap_or_default().starts_with("Transform failed:"));
    }
}
