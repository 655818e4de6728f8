//! Agent tool surface.
//!
//! The orchestration loop reaches the gate, the SQL generator, and the SQL
//! executor only through `AgentTool` implementations registered here. Each
//! tool takes validated JSON params and returns a JSON payload, so the same
//! registry can back a REPL, a planner, or a function-calling LLM.

pub mod executor_tool;
pub mod sql_tool;
pub mod validate_tool;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A callable Vendra tool.
///
/// # Minimal contract
/// - `name()` must be unique across the registry (snake_case).
/// - `description()` is surfaced as the tool docstring.
/// - `parameters_schema()` returns a JSON Schema object for the params.
/// - `invoke()` receives JSON params and returns a JSON payload. A hard
///   `Err` means the caller violated the tool's contract (e.g. a missing
///   required parameter), not a domain-level failure — those are reported
///   inside the payload.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn invoke(&self, params: Value) -> Result<Value>;
}

/// Central registry mapping tool names → trait objects.
/// Build once at startup, then share via Arc.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Register a tool. Panics if the name is already registered.
    pub fn register<T: AgentTool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        assert!(!self.tools.contains_key(&name), "Duplicate tool name: {name}");
        self.tools.insert(name, Arc::new(tool));
    }

    /// Invoke a registered tool by name.
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {name}"))?;

        tracing::info!(tool = name, "Invoking tool");
        tool.invoke(params).await
    }

    /// All registered tools as a JSON function manifest.
    pub fn manifest(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the default Vendra tool registry: gate, generator, executor.
pub fn build_default_registry(
    validator: Arc<vendra_guardrails::InputValidator>,
    generator: sql_tool::SqlGenerator,
    db: vendra_db::Database,
) -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    reg.register(validate_tool::ValidateQueryTool::new(validator));
    reg.register(sql_tool::GenerateSqlTool::new(generator));
    reg.register(executor_tool::ExecuteSqlTool::new(db));
    tracing::info!("ToolRegistry ready with {} tools", reg.len());
    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl AgentTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes the input params back."
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            })
        }
        async fn invoke(&self, params: Value) -> Result<Value> {
            Ok(serde_json::json!({ "echo": params["message"] }))
        }
    }

    #[tokio::test]
    async fn test_registry_register_and_invoke() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        assert_eq!(reg.len(), 1);

        let result = reg.invoke("echo", serde_json::json!({ "message": "hello" })).await.unwrap();
        assert_eq!(result["echo"], "hello");
    }

    #[tokio::test]
    async fn test_registry_unknown_tool_errors() {
        let reg = ToolRegistry::new();
        let err = reg.invoke("nonexistent", serde_json::json!({})).await;
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_manifest_json() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        let manifest = reg.manifest();
        let tools = manifest["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
    }

    #[test]
    #[should_panic(expected = "Duplicate tool name")]
    fn test_duplicate_registration_panics() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        reg.register(EchoTool);
    }
}
