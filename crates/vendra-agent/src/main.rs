//! Vendra — natural-language retail insights agent.
//! Entry point for the agent binary.

mod config;
mod tools;

use std::io::{BufRead, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vendra_common::schema::schema_summary;
use vendra_common::TableSchema;
use vendra_guardrails::InputValidator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vendra=debug,info")),
        )
        .init();

    info!("🛒 Vendra starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    let tables = vec![TableSchema::amazon_sales()];
    info!("Dataset:\n{}", schema_summary(&tables));

    let db = vendra_db::Database::open(&config.database.path).await?;
    info!("✅ Database open: {}", db.path());

    let csv = std::path::Path::new(&config.dataset.csv_path);
    if csv.exists() {
        for table in &tables {
            vendra_db::load_csv(&db, table, csv).await?;
        }
    } else {
        tracing::warn!(
            path = %config.dataset.csv_path,
            "dataset CSV not found; queries run against existing tables"
        );
    }

    let backend = config.build_backend()?;
    info!("✅ LLM backend ready: {}", backend.model_id());

    let validator = InputValidator::new(&config.guardrails_policy(), backend.clone())
        .map_err(|e| anyhow::anyhow!("invalid deny pattern in guardrails config: {e}"))?;
    let generator = tools::sql_tool::SqlGenerator::new(backend, &tables);
    let registry = tools::build_default_registry(Arc::new(validator), generator, db.clone());

    run_repl(&registry).await?;

    db.close().await;
    info!("Vendra shut down.");
    Ok(())
}

/// Question → gate → SQL → rows. Blocked questions print the gate's
/// user-facing message verbatim; internal reasons stay in the logs.
async fn run_repl(registry: &tools::ToolRegistry) -> anyhow::Result<()> {
    println!("Ask a question about the retail sales data ('exit' to quit).");
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        let decision = registry
            .invoke("validate_query", json!({ "user_query": question }))
            .await?;
        if decision["allowed"] != true {
            println!("{}", decision["message"].as_str().unwrap_or_default());
            continue;
        }

        let generated = registry
            .invoke("generate_sql", json!({ "question": decision["message"] }))
            .await?;
        if generated["status"] != "success" {
            info!(message = %generated["message"], "SQL generation failed");
            println!("Sorry, I couldn't turn that question into a query.");
            continue;
        }

        let executed = registry
            .invoke("execute_sql", json!({ "sql_query": generated["sql"] }))
            .await?;
        if executed["status"] != "success" {
            info!(message = %executed["message"], "SQL execution failed");
            println!("Sorry, that query failed to run.");
            continue;
        }

        println!("{}", render_rows(&executed));
    }
    Ok(())
}

const MAX_DISPLAY_ROWS: usize = 20;

fn render_rows(payload: &Value) -> String {
    let columns: Vec<&str> = payload["columns"]
        .as_array()
        .map(|cols| cols.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let rows = payload["data"].as_array().cloned().unwrap_or_default();

    let mut out = String::new();
    out.push_str(&columns.join(" | "));
    out.push('\n');
    for row in rows.iter().take(MAX_DISPLAY_ROWS) {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| match &row[*col] {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }

    let total = payload["row_count"].as_u64().unwrap_or(rows.len() as u64);
    if total as usize > MAX_DISPLAY_ROWS {
        out.push_str(&format!("… ({total} rows total)\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows_table() {
        let payload = json!({
            "columns": ["state", "revenue"],
            "data": [
                { "state": "Karnataka", "revenue": 499.0 },
                { "state": "Maharashtra", "revenue": null },
            ],
            "row_count": 2,
        });
        let rendered = render_rows(&payload);
        assert!(rendered.starts_with("state | revenue\n"));
        assert!(rendered.contains("Karnataka | 499.0"));
        assert!(rendered.contains("Maharashtra | \n"));
        assert!(!rendered.contains("rows total"));
    }

    #[test]
    fn test_render_rows_truncates() {
        let data: Vec<Value> = (0..30).map(|i| json!({ "n": i })).collect();
        let payload = json!({ "columns": ["n"], "data": data, "row_count": 30 });
        let rendered = render_rows(&payload);
        assert!(rendered.contains("(30 rows total)"));
        assert_eq!(rendered.lines().count(), 22); // header + 20 rows + footer
    }
}
