//! vendra-llm — chat-completion backend abstraction.
//!
//! Both the guardrails input rail and the text-to-SQL generator talk to a
//! language model through the `LlmBackend` trait defined here.

pub mod backend;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
