//! vendra-guardrails — input policy gate for the retail insights agent.
//!
//! Every user question passes through a two-stage filter before any SQL is
//! generated or executed:
//!
//!   1. `PatternScreener` — fixed, pre-compiled deny regexes; any match is
//!      an immediate deterministic deny with no network call.
//!   2. `InputRail` — LLM self-check fallback, consulted only when no
//!      pattern matched. Unreachable or failing rails **fail open**: the
//!      query is allowed and the failure is recorded in the decision's
//!      reason for logging. The pattern screener is the durable safety net.
//!
//! `InputValidator` sequences the two stages and normalizes the result into
//! a `Decision { allowed, message, reason }`.

pub mod patterns;
pub mod policy;
pub mod rails;
pub mod validator;

pub use patterns::PatternScreener;
pub use policy::GuardrailsPolicy;
pub use rails::{interpret_verdict, InputRail};
pub use validator::{Decision, InputValidator};
