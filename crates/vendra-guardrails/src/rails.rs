//! LLM self-check input rail.
//!
//! The rail sends the query and the fixed policy prompt to a backend as a
//! single turn. The model answers Yes (violates policy) or No; a Yes is
//! surfaced as the fixed refusal text, anything else passes through empty.
//! The verdict channel is free-form text by upstream convention, so the
//! allow/deny interpretation is a narrow prefix match kept in one pure
//! function (`interpret_verdict`) where it can be hardened later.

use std::sync::Arc;

use vendra_llm::{LlmBackend, LlmError, LlmRequest};

/// Refusal phrasing emitted by the rail when the self-check answers Yes.
pub const REFUSAL_MESSAGE: &str = "I can only help with questions about retail sales data \
and analytics. Please ask something related to sales, inventory, or product insights.";

/// Prefix that marks a rail response as a refusal. If the phrasing above
/// ever drifts without this prefix, interpretation silently degrades to
/// "allowed" — the gate fails open, it does not error.
const REFUSAL_PREFIX: &str = "I can only help with";

/// True when the rail's raw response is a policy refusal.
pub fn interpret_verdict(raw: &str) -> bool {
    raw.starts_with(REFUSAL_PREFIX)
}

/// True when the self-check model answered in the affirmative.
fn self_check_says_block(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with("yes")
}

/// Semantic fallback check. Owns the only suspension point in the gate.
pub struct InputRail {
    backend: Arc<dyn LlmBackend>,
    self_check_prompt: String,
}

impl InputRail {
    pub fn new(backend: Arc<dyn LlmBackend>, self_check_prompt: impl Into<String>) -> Self {
        Self { backend, self_check_prompt: self_check_prompt.into() }
    }

    /// Run the input rail for one query. Returns the rail's bot response:
    /// `REFUSAL_MESSAGE` on a block verdict, empty string on pass-through.
    pub async fn generate(&self, query: &str) -> Result<String, LlmError> {
        let req = LlmRequest::single_turn(&self.self_check_prompt, query)
            .with_max_tokens(8)
            .with_temperature(0.0);
        let resp = self.backend.complete(req).await?;

        tracing::debug!(
            model = self.backend.model_id(),
            answer = %resp.content.trim(),
            "self-check verdict received"
        );

        if self_check_says_block(&resp.content) {
            Ok(REFUSAL_MESSAGE.to_string())
        } else {
            Ok(String::new())
        }
    }
}
