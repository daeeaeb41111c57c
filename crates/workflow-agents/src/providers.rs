//! Credential resolution and the three LLM provider clients (§4.2, §6
//! "Credential provider").
//!
//! The LLM agent never asks a node for credentials — it asks a
//! [`CredentialProvider`] for whichever keys are present and picks a
//! provider by preference order: an explicit OpenAI key, then Anthropic,
//! then a local HTTP endpoint (§4.2 "Behavior"). [`EnvCredentialProvider`]
//! resolves the same environment variables as the source's `app/config.py`
//! (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `OLLAMA_BASE_URL`,
//! `DEFAULT_MODEL`).

use serde::{Deserialize, Serialize};
use std::env;

/// Which provider an LLM call was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Local,
}

/// Supplies provider credentials to the LLM agent at construction time.
///
/// Implement this to source keys from somewhere other than the process
/// environment (a secrets manager, a per-tenant vault, ...).
pub trait CredentialProvider: Send + Sync {
    fn openai_api_key(&self) -> Option<String>;
    fn anthropic_api_key(&self) -> Option<String>;
    fn local_endpoint(&self) -> String;
    fn default_model(&self) -> String;

    /// Resolve the provider to use, in preference order: explicit OpenAI
    /// key, then Anthropic, then the local endpoint.
    fn resolve(&self) -> Provider {
        if self.openai_api_key().is_some() {
            Provider::OpenAi
        } else if self.anthropic_api_key().is_some() {
            Provider::Anthropic
        } else {
            Provider::Local
        }
    }
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn openai_api_key(&self) -> Option<String> {
        env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty())
    }

    fn anthropic_api_key(&self) -> Option<String> {
        env::var("ANTHROPIC_API_KEY").ok().filter(|s| !s.is_empty())
    }

    fn local_endpoint(&self) -> String {
        env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
    }

    fn default_model(&self) -> String {
        env::var("DEFAULT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
    }
}

/// Per-million-token (input, output) rates used to estimate `cost_usd` for
/// an OpenAI completion, keyed by model name. Unknown models fall back to
/// `DEFAULT_RATE`.
pub const OPENAI_RATES: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.00000015, 0.0000006),
    ("gpt-4o", 0.0000025, 0.00001),
    ("gpt-4-turbo", 0.00001, 0.00003),
];

pub const OPENAI_DEFAULT_RATE: (f64, f64) = (0.000001, 0.000002);

/// Flat per-token rate applied to the summed input+output token count of an
/// Anthropic call (the source uses a single rate rather than a table for
/// this provider — preserved as-is, see SPEC_FULL.md).
pub const ANTHROPIC_FLAT_RATE: f64 = 0.000003;

pub fn openai_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    let (input_rate, output_rate) = OPENAI_RATES
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, i, o)| (*i, *o))
        .unwrap_or(OPENAI_DEFAULT_RATE);
    (input_tokens as f64) * input_rate + (output_tokens as f64) * output_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        openai: Option<String>,
        anthropic: Option<String>,
    }

    impl CredentialProvider for Fake {
        fn openai_api_key(&self) -> Option<String> {
            self.openai.clone()
        }
        fn anthropic_api_key(&self) -> Option<String> {
            self.anthropic.clone()
        }
        fn local_endpoint(&self) -> String {
            "http://localhost:11434".to_string()
        }
        fn default_model(&self) -> String {
            "gpt-4o-mini".to_string()
        }
    }

    #[test]
    fn prefers_openai_over_anthropic() {
        let p = Fake {
            openai: Some("k".to_string()),
            anthropic: Some("k2".to_string()),
        };
        assert_eq!(p.resolve(), Provider::OpenAi);
    }

    #[test]
    fn falls_back_to_local_with_no_keys() {
        let p = Fake {
            openai: None,
            anthropic: None,
        };
        assert_eq!(p.resolve(), Provider::Local);
    }

    #[test]
    fn unknown_model_uses_default_rate() {
        let cost = openai_cost("some-future-model", 1_000_000, 1_000_000);
        assert_eq!(cost, OPENAI_DEFAULT_RATE.0 * 1_000_000.0 + OPENAI_DEFAULT_RATE.1 * 1_000_000.0);
    }
}
