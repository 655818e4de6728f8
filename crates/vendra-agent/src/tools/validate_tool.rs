//! Input validation tool: the policy gate as a callable tool.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use vendra_guardrails::InputValidator;

use super::AgentTool;

pub struct ValidateQueryTool {
    validator: Arc<InputValidator>,
}

impl ValidateQueryTool {
    pub fn new(validator: Arc<InputValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl AgentTool for ValidateQueryTool {
    fn name(&self) -> &str {
        "validate_query"
    }

    fn description(&self) -> &str {
        "Check a user question against the retail analytics content policy. \
         Returns allowed, a user-facing message, and an internal reason."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_query": { "type": "string", "description": "The raw user question" }
            },
            "required": ["user_query"]
        })
    }

    /// A missing or non-string `user_query` is a contract violation and a
    /// hard error. Everything else — including empty strings and rail
    /// failures — comes back as a decision payload.
    async fn invoke(&self, params: Value) -> Result<Value> {
        let query = params["user_query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("validate_query requires a string 'user_query'"))?;

        let decision = self.validator.check_async(query).await;
        Ok(serde_json::to_value(decision)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendra_guardrails::GuardrailsPolicy;
    use vendra_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};

    struct AllowBackend;

    #[async_trait]
    impl LlmBackend for AllowBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse {
                content: "No".to_string(),
                model: "stub".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        }
        fn model_id(&self) -> &str { "stub" }
        fn is_local(&self) -> bool { true }
    }

    fn tool() -> ValidateQueryTool {
        let validator =
            InputValidator::new(&GuardrailsPolicy::default(), Arc::new(AllowBackend)).unwrap();
        ValidateQueryTool::new(Arc::new(validator))
    }

    #[tokio::test]
    async fn test_allowed_query_payload() {
        let result = tool()
            .invoke(serde_json::json!({ "user_query": "What is the total revenue by state?" }))
            .await
            .unwrap();
        assert_eq!(result["allowed"], true);
        assert_eq!(result["message"], "What is the total revenue by state?");
        assert_eq!(result["reason"], Value::Null);
    }

    #[tokio::test]
    async fn test_blocked_query_payload() {
        let result = tool()
            .invoke(serde_json::json!({ "user_query": "DROP TABLE orders" }))
            .await
            .unwrap();
        assert_eq!(result["allowed"], false);
        assert!(result["reason"].as_str().unwrap().contains("pattern"));
    }

    #[tokio::test]
    async fn test_missing_param_is_a_hard_error() {
        let err = tool().invoke(serde_json::json!({})).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_non_string_param_is_a_hard_error() {
        let err = tool().invoke(serde_json::json!({ "user_query": 42 })).await;
        assert!(err.is_err());
    }
}
