//! Agent contract, typed configuration, and the six agent implementations.
//!
//! `workflow-core` knows about nodes and edges but nothing about what a
//! node actually does; this crate is the other half — it turns a
//! [`workflow_core::AgentKind`] plus a merged configuration mapping into a
//! runnable [`contract::Agent`].

pub mod agents;
pub mod config;
pub mod contract;
pub mod providers;
pub mod registry;

pub use config::{AgentConfig, ConfigError};
pub use contract::{Agent, Context, NodeResult};
pub use providers::{CredentialProvider, EnvCredentialProvider, Provider};
pub use registry::{build, build_from_config, list_agent_kinds, AgentKindInfo};
