//! One module per agent kind (§4.2-§4.7).

pub mod code_exec;
pub mod conditional;
pub mod http;
pub mod llm;
pub mod transform;
pub mod web_search;
