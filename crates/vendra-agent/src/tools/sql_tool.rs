//! Text-to-SQL generation.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use vendra_common::TableSchema;
use vendra_llm::{LlmBackend, LlmRequest};

use super::AgentTool;

/// Outcome of one generation attempt (the generator boundary contract).
#[derive(Debug, Clone, Serialize)]
pub struct SqlOutcome {
    pub success: bool,
    pub sql: Option<String>,
    pub error: Option<String>,
}

impl SqlOutcome {
    fn ok(sql: String) -> Self {
        Self { success: true, sql: Some(sql), error: None }
    }

    fn err(error: impl Into<String>) -> Self {
        Self { success: false, sql: None, error: Some(error.into()) }
    }
}

/// Translates a natural-language question into a single SELECT statement
/// via an LLM, constrained by the configured table schemas.
pub struct SqlGenerator {
    backend: Arc<dyn LlmBackend>,
    system_prompt: String,
}

impl SqlGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, tables: &[TableSchema]) -> Self {
        let schemas: Vec<String> = tables.iter().map(|t| t.prompt_schema()).collect();
        let system_prompt = format!(
            "You translate retail analytics questions into SQL for SQLite.\n\n\
             {}\n\
             Rules:\n\
             - Respond with exactly one SELECT (or WITH) statement and nothing else.\n\
             - Never produce INSERT, UPDATE, DELETE, DROP, or any other write statement.\n\
             - Use only the tables and columns listed above.",
            schemas.join("\n")
        );
        Self { backend, system_prompt }
    }

    pub async fn generate(&self, question: &str) -> SqlOutcome {
        if question.trim().is_empty() {
            return SqlOutcome::err("empty question provided");
        }

        let req = LlmRequest::single_turn(&self.system_prompt, question).with_temperature(0.0);
        let content = match self.backend.complete(req).await {
            Ok(resp) => resp.content,
            Err(e) => {
                tracing::error!(error = %e, "SQL generation failed");
                return SqlOutcome::err(e.to_string());
            }
        };

        let sql = strip_code_fences(&content);
        if !is_read_statement(&sql) {
            tracing::warn!(sql = %sql.chars().take(80).collect::<String>(),
                "generator returned a non-SELECT statement");
            return SqlOutcome::err("generator returned a non-SELECT statement");
        }
        SqlOutcome::ok(sql)
    }
}

/// Remove a surrounding markdown code fence, if present.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag on the opening fence line
    let rest = rest.strip_prefix("sql").or_else(|| rest.strip_prefix("sqlite")).unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}

fn is_read_statement(sql: &str) -> bool {
    let lower = sql.trim_start().to_lowercase();
    lower.starts_with("select") || lower.starts_with("with")
}

pub struct GenerateSqlTool {
    generator: SqlGenerator,
}

impl GenerateSqlTool {
    pub fn new(generator: SqlGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl AgentTool for GenerateSqlTool {
    fn name(&self) -> &str {
        "generate_sql"
    }

    fn description(&self) -> &str {
        "Generate a SELECT statement from a natural-language question about the retail dataset."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "Natural language question" }
            },
            "required": ["question"]
        })
    }

    async fn invoke(&self, params: Value) -> Result<Value> {
        let question = params["question"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("generate_sql requires a string 'question'"))?;

        let outcome = self.generator.generate(question).await;
        Ok(match outcome.sql {
            Some(sql) => serde_json::json!({
                "status": "success",
                "sql": sql,
                "message": format!("Generated SQL for: {question}"),
            }),
            None => serde_json::json!({
                "status": "error",
                "sql": Value::Null,
                "message": outcome.error.unwrap_or_else(|| "failed to generate SQL".to_string()),
            }),
        })
    }
}
