//! SQL execution tool.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use vendra_db::{execute_query, Database};

use super::AgentTool;

pub struct ExecuteSqlTool {
    db: Database,
}

impl ExecuteSqlTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AgentTool for ExecuteSqlTool {
    fn name(&self) -> &str {
        "execute_sql"
    }

    fn description(&self) -> &str {
        "Execute a SELECT statement against the retail database. \
         Write statements are rejected."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sql_query": { "type": "string", "description": "SELECT statement to execute" }
            },
            "required": ["sql_query"]
        })
    }

    async fn invoke(&self, params: Value) -> Result<Value> {
        let sql = params["sql_query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("execute_sql requires a string 'sql_query'"))?;

        let result = execute_query(&self.db, sql).await;
        Ok(if result.success {
            serde_json::json!({
                "status": "success",
                "data": result.data,
                "columns": result.columns,
                "row_count": result.row_count,
                "message": format!("Query returned {} rows", result.row_count),
            })
        } else {
            serde_json::json!({
                "status": "error",
                "data": Value::Null,
                "columns": Value::Null,
                "row_count": 0,
                "message": result.error.unwrap_or_else(|| "query failed".to_string()),
            })
        })
    }
}
