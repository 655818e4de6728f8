//! Read-only SQL execution.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::database::Database;

/// Statements rejected by the read-only guard, by leading keyword.
const WRITE_KEYWORDS: &[&str] =
    &["insert", "update", "delete", "drop", "truncate", "alter", "create"];

/// True when the statement's leading keyword is a write operation.
/// Pure; checked before any SQL reaches the store.
pub fn is_write_statement(sql: &str) -> bool {
    let first = sql
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    WRITE_KEYWORDS.contains(&first.as_str())
}

/// Result of one executed query, shaped for the `execute_sql` tool contract.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub data: Vec<serde_json::Value>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub error: Option<String>,
}

impl QueryResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
            error: Some(error.into()),
        }
    }
}

/// Execute a read statement and collect rows as JSON records.
///
/// Failures (bad SQL, rejected statement) come back inside `QueryResult`,
/// not as an `Err`; callers forward them to the user-facing layer.
pub async fn execute_query(db: &Database, sql: &str) -> QueryResult {
    if sql.trim().is_empty() {
        return QueryResult::failure("empty SQL statement");
    }
    if is_write_statement(sql) {
        tracing::warn!(sql = %sql.chars().take(80).collect::<String>(), "write statement rejected");
        return QueryResult::failure("write statements are not permitted");
    }

    match sqlx::query(sql).fetch_all(db.pool()).await {
        Ok(rows) => rows_to_result(&rows),
        Err(e) => QueryResult::failure(e.to_string()),
    }
}

fn rows_to_result(rows: &[SqliteRow]) -> QueryResult {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let data: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut record = serde_json::Map::new();
            for (idx, col) in row.columns().iter().enumerate() {
                record.insert(col.name().to_string(), value_at(row, idx));
            }
            serde_json::Value::Object(record)
        })
        .collect();

    QueryResult {
        success: true,
        row_count: data.len(),
        data,
        columns,
        error: None,
    }
}

/// Convert one cell to JSON, dispatching on the stored value's type.
fn value_at(row: &SqliteRow, idx: usize) -> serde_json::Value {
    let raw = match row.try_get_raw(idx) {
        Ok(raw) => raw,
        Err(_) => return serde_json::Value::Null,
    };
    if raw.is_null() {
        return serde_json::Value::Null;
    }

    match raw.type_info().name() {
        "INTEGER" | "INT4" | "INT8" => row
            .try_get::<i64, _>(idx)
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
        "REAL" | "NUMERIC" | "FLOAT" | "DOUBLE" => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(|v| serde_json::Number::from_f64(v).map(serde_json::Value::Number))
            .unwrap_or(serde_json::Value::Null),
        "BOOLEAN" | "BOOL" => row
            .try_get::<bool, _>(idx)
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
        _ => row
            .try_get::<String, _>(idx)
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        sqlx::query(
            "CREATE TABLE amazon_sales (
                order_id TEXT, state TEXT, quantity INTEGER, amount REAL
            )",
        )
        .execute(db.pool())
        .await
        .unwrap();
        for (id, state, qty, amount) in [
            ("A1", "Maharashtra", 2i64, Some(1200.5f64)),
            ("A2", "Karnataka", 1, Some(499.0)),
            ("A3", "Maharashtra", 3, None),
        ] {
            sqlx::query("INSERT INTO amazon_sales VALUES (?, ?, ?, ?)")
                .bind(id)
                .bind(state)
                .bind(qty)
                .bind(amount)
                .execute(db.pool())
                .await
                .unwrap();
        }
        db
    }

    #[test]
    fn test_write_statement_detection() {
        assert!(is_write_statement("DROP TABLE amazon_sales"));
        assert!(is_write_statement("  delete from amazon_sales"));
        assert!(is_write_statement("Insert into t values (1)"));
        assert!(is_write_statement("TRUNCATE amazon_sales"));
        assert!(is_write_statement("create table t (x)"));
        assert!(!is_write_statement("SELECT * FROM amazon_sales"));
        assert!(!is_write_statement("WITH cte AS (SELECT 1) SELECT * FROM cte"));
        assert!(!is_write_statement(""));
    }

    #[tokio::test]
    async fn test_select_returns_rows_and_columns() {
        let db = seeded_db().await;
        let result = execute_query(
            &db,
            "SELECT state, SUM(amount) AS revenue FROM amazon_sales GROUP BY state ORDER BY state",
        )
        .await;
        assert!(result.success);
        assert_eq!(result.columns, vec!["state", "revenue"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.data[1]["state"], "Maharashtra");
        assert_eq!(result.data[1]["revenue"], 1200.5);
    }

    #[tokio::test]
    async fn test_null_amounts_survive_as_null() {
        let db = seeded_db().await;
        let result =
            execute_query(&db, "SELECT amount FROM amazon_sales WHERE order_id = 'A3'").await;
        assert!(result.success);
        assert!(result.data[0]["amount"].is_null());
    }

    #[tokio::test]
    async fn test_write_statement_rejected_before_execution() {
        let db = seeded_db().await;
        let result = execute_query(&db, "DELETE FROM amazon_sales").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not permitted"));

        // Table untouched
        let check = execute_query(&db, "SELECT COUNT(*) AS n FROM amazon_sales").await;
        assert_eq!(check.data[0]["n"], 3);
    }

    #[tokio::test]
    async fn test_empty_sql_is_an_error_outcome() {
        let db = Database::open_in_memory().await.unwrap();
        let result = execute_query(&db, "   ").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("empty SQL statement"));
    }

    #[tokio::test]
    async fn test_bad_sql_is_an_error_outcome_not_a_panic() {
        let db = Database::open_in_memory().await.unwrap();
        let result = execute_query(&db, "SELECT FROM nowhere").await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
