//! # workflow-core
//!
//! The graph model and topological scheduler underneath the workflow
//! execution engine. This crate knows nothing about agents, LLM providers,
//! or HTTP calls — it is the load-bearing data structure the rest of the
//! system is built on: an immutable, validated DAG of [`Node`]s connected by
//! [`Edge`]s, plus a deterministic [`scheduler::topological_order`].
//!
//! See `workflow-agents` for the agent contract and implementations, and
//! `workflow-engine` for the driver that ties graph + agents + telemetry
//! together into `execute()`.

pub mod error;
pub mod graph;
pub mod scheduler;

pub use error::{GraphError, Result};
pub use graph::{AgentKind, Branch, Edge, Graph, Node};
pub use scheduler::topological_order;
