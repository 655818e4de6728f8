//! Gate controller: sequences screener → rail and normalizes the outcome.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use vendra_llm::{LlmBackend, LlmError};

use crate::patterns::PatternScreener;
use crate::policy::GuardrailsPolicy;
use crate::rails::{interpret_verdict, InputRail};

/// Hard bound on the rail's model call. A timeout is treated as a rail
/// failure and falls through to fail-open.
pub const RAIL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one validation call.
///
/// Invariants: `allowed == false` implies `message` is the policy's fixed
/// blocked message; `allowed == true` implies `message` is the original
/// query, unmodified. `reason` is diagnostic only and must never be shown
/// to the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub message: String,
    pub reason: Option<String>,
}

/// Two-stage input gate. Immutable once constructed; safe to share across
/// arbitrarily many concurrent checks.
pub struct InputValidator {
    screener: PatternScreener,
    rail: InputRail,
    blocked_message: String,
}

impl InputValidator {
    /// Compile the policy and bind the rail to a backend. Fails only on an
    /// invalid deny pattern, which should abort startup.
    pub fn new(
        policy: &GuardrailsPolicy,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            screener: PatternScreener::from_policy(policy)?,
            rail: InputRail::new(backend, policy.self_check_prompt.clone()),
            blocked_message: policy.blocked_message.clone(),
        })
    }

    /// Validate a query from an async context.
    ///
    /// Never returns an error: rail failures are absorbed into an
    /// allow decision with the failure noted in `reason`.
    pub async fn check_async(&self, query: &str) -> Decision {
        if let Some(decision) = self.local_checks(query) {
            return decision;
        }
        let outcome = self.rail_with_timeout(query).await;
        self.resolve(query, outcome)
    }

    /// Validate a query from a blocking context. Behaviorally identical to
    /// `check_async`; only the rail call is bridged, on a worker thread
    /// with its own runtime, so this is safe to call whether or not a
    /// tokio runtime is already running on the current thread.
    pub fn check(&self, query: &str) -> Decision {
        if let Some(decision) = self.local_checks(query) {
            return decision;
        }
        let outcome = std::thread::scope(|scope| {
            let worker = scope.spawn(|| {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        LlmError::Unavailable(format!("failed to start rail runtime: {e}"))
                    })?;
                rt.block_on(self.rail_with_timeout(query))
            });
            worker
                .join()
                .unwrap_or_else(|_| Err(LlmError::Unavailable("rail worker panicked".to_string())))
        });
        self.resolve(query, outcome)
    }

    /// Checks that never touch the network: empty input and the pattern
    /// screener. `Some` means the decision is final and the rail is never
    /// consulted.
    fn local_checks(&self, query: &str) -> Option<Decision> {
        if query.trim().is_empty() {
            return Some(Decision {
                allowed: false,
                message: self.blocked_message.clone(),
                reason: Some("empty query".to_string()),
            });
        }

        if let Some(rule_reason) = self.screener.screen(query) {
            tracing::info!(reason = rule_reason, query = %preview(query), "query blocked by pattern");
            return Some(Decision {
                allowed: false,
                message: self.blocked_message.clone(),
                reason: Some(format!("blocked by pattern: {rule_reason}")),
            });
        }

        None
    }

    async fn rail_with_timeout(&self, query: &str) -> Result<String, LlmError> {
        match timeout(RAIL_TIMEOUT, self.rail.generate(query)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Unavailable(format!(
                "input rail timed out after {}s",
                RAIL_TIMEOUT.as_secs()
            ))),
        }
    }

    /// Map an already-resolved rail outcome to a decision. This is the
    /// single place allow/deny is decided for the semantic path; both
    /// invocation surfaces share it.
    fn resolve(&self, query: &str, outcome: Result<String, LlmError>) -> Decision {
        match outcome {
            Ok(response) if interpret_verdict(&response) => {
                tracing::info!(query = %preview(query), "query blocked by input rail");
                Decision {
                    allowed: false,
                    message: self.blocked_message.clone(),
                    reason: Some("policy violation".to_string()),
                }
            }
            Ok(_) => Decision { allowed: true, message: query.to_string(), reason: None },
            Err(e) => {
                // Fail open: availability over strict enforcement when the
                // rail is unreachable. The pattern screener already ran.
                tracing::error!(error = %e, "guardrail check failed, allowing query");
                Decision {
                    allowed: true,
                    message: query.to_string(),
                    reason: Some(format!("guardrail error (fail-open): {e}")),
                }
            }
        }
    }
}

fn preview(query: &str) -> String {
    query.chars().take(50).collect()
}
