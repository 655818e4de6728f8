//! CSV dataset ingestion.
//!
//! Loads a sales report CSV into its analytical table using the column
//! mapping from the table schema. Loading is idempotent: a table that
//! already holds rows is left alone.

use std::path::Path;

use sqlx::Row;
use vendra_common::{ColumnSpec, TableSchema};

use crate::database::Database;
use crate::error::{DbError, Result};

/// Load `csv_path` into `schema`'s table. Returns the number of rows
/// inserted (0 when the table was already populated).
pub async fn load_csv(db: &Database, schema: &TableSchema, csv_path: impl AsRef<Path>) -> Result<u64> {
    create_table(db, schema).await?;

    let existing: i64 = sqlx::query(&format!("SELECT COUNT(*) FROM {}", schema.name))
        .fetch_one(db.pool())
        .await?
        .get(0);
    if existing > 0 {
        tracing::info!(table = %schema.name, rows = existing, "table already populated, skipping load");
        return Ok(0);
    }

    let mut reader = csv::Reader::from_path(csv_path.as_ref())?;
    let headers = reader.headers()?.clone();
    let indices = column_indices(schema, &headers)?;

    let placeholders = vec!["?"; schema.columns.len()].join(", ");
    let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        names.join(", "),
        placeholders
    );

    let mut tx = db.pool().begin().await?;
    let mut inserted: u64 = 0;
    for record in reader.records() {
        let record = record?;
        let mut query = sqlx::query(&insert_sql);
        for (col, &idx) in schema.columns.iter().zip(&indices) {
            query = bind_field(query, col, record.get(idx).unwrap_or(""));
        }
        query.execute(&mut *tx).await?;
        inserted += 1;
    }
    tx.commit().await?;

    tracing::info!(table = %schema.name, rows = inserted, "dataset loaded");
    Ok(inserted)
}

async fn create_table(db: &Database, schema: &TableSchema) -> Result<()> {
    let cols: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect();
    let ddl = format!("CREATE TABLE IF NOT EXISTS {} ({})", schema.name, cols.join(", "));
    sqlx::query(&ddl).execute(db.pool()).await?;
    Ok(())
}

/// Resolve each schema column's position in the CSV header row.
fn column_indices(schema: &TableSchema, headers: &csv::StringRecord) -> Result<Vec<usize>> {
    schema
        .columns
        .iter()
        .map(|col| {
            headers
                .iter()
                .position(|h| h.trim() == col.source)
                .ok_or_else(|| {
                    DbError::Dataset(format!(
                        "column '{}' not found in CSV headers",
                        col.source
                    ))
                })
        })
        .collect()
}

type SqliteQuery<'q> =
    sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Bind one raw CSV field according to the column's storage type.
/// Unparseable or empty numerics become NULL (cancelled orders carry an
/// empty Amount).
fn bind_field<'q>(query: SqliteQuery<'q>, col: &ColumnSpec, raw: &str) -> SqliteQuery<'q> {
    let raw = raw.trim();
    match col.sql_type.as_str() {
        "INTEGER" => query.bind(raw.parse::<i64>().ok()),
        "REAL" => query.bind(raw.parse::<f64>().ok()),
        "BOOLEAN" => {
            if raw.is_empty() {
                query.bind(None::<bool>)
            } else {
                query.bind(Some(raw.eq_ignore_ascii_case("true") || raw == "1"))
            }
        }
        _ => {
            if raw.is_empty() {
                query.bind(None::<String>)
            } else {
                query.bind(Some(raw.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute_query;
    use std::io::Write;

    const SAMPLE_CSV: &str = "\
Order ID,Date,Status,Fulfilment,Style,SKU,Category,Size,Qty,Amount,ship-city,ship-state,B2B
405-1,04-30-22,Shipped,Amazon,ST1,SKU1,kurta,M,1,649.00,Mumbai,Maharashtra,False
405-2,04-30-22,Cancelled,Merchant,ST2,SKU2,Set,L,2,,Bengaluru,Karnataka,True
405-3,05-01-22,Shipped,Amazon,ST3,SKU3,Top,S,1,399.00,Pune,Maharashtra,False
";

    fn sample_csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_maps_columns_and_types() {
        let db = Database::open_in_memory().await.unwrap();
        let schema = TableSchema::amazon_sales();
        let file = sample_csv_file();

        let inserted = load_csv(&db, &schema, file.path()).await.unwrap();
        assert_eq!(inserted, 3);

        let result = execute_query(
            &db,
            "SELECT order_id, state, quantity, amount FROM amazon_sales ORDER BY order_id",
        )
        .await;
        assert!(result.success);
        assert_eq!(result.data[0]["state"], "Maharashtra");
        assert_eq!(result.data[0]["quantity"], 1);
        assert_eq!(result.data[0]["amount"], 649.0);
        // Cancelled order: empty Amount loads as NULL
        assert!(result.data[1]["amount"].is_null());

        let b2b = execute_query(
            &db,
            "SELECT COUNT(*) AS n FROM amazon_sales WHERE is_b2b = 1",
        )
        .await;
        assert_eq!(b2b.data[0]["n"], 1);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let schema = TableSchema::amazon_sales();
        let file = sample_csv_file();

        assert_eq!(load_csv(&db, &schema, file.path()).await.unwrap(), 3);
        assert_eq!(load_csv(&db, &schema, file.path()).await.unwrap(), 0);

        let result = execute_query(&db, "SELECT COUNT(*) AS n FROM amazon_sales").await;
        assert_eq!(result.data[0]["n"], 3);
    }

    #[tokio::test]
    async fn test_missing_csv_column_is_a_dataset_error() {
        let db = Database::open_in_memory().await.unwrap();
        let schema = TableSchema::amazon_sales();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Order ID,Qty\n405-1,1\n").unwrap();

        let err = load_csv(&db, &schema, file.path()).await.unwrap_err();
        assert!(matches!(err, DbError::Dataset(_)));
    }
}
