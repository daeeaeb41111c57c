//! Ties `workflow-core`'s graph/scheduler to `workflow-agents`'s agent
//! contract: context assembly, branch pruning, and the `execute` driver
//! that produces an [`ExecutionRecord`] for a single run.

pub mod cancellation;
pub mod context;
pub mod definitions;
pub mod driver;
pub mod error;
pub mod pruner;
pub mod record;

pub use cancellation::CancellationToken;
pub use context::assemble_context;
pub use definitions::{AgentDefinition, AgentDefinitionStore, InMemoryAgentDefinitionStore, NoopAgentDefinitionStore};
pub use driver::{execute, ExecutionOptions};
pub use error::{EngineError, Result};
pub use pruner::skip_set_for_branch;
pub use record::{ExecutionRecord, NodeStatus, RecordedNode, RunStatus};
