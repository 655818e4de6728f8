//! Retail table schema descriptions.
//!
//! The schema is static configuration: it names the analytical tables, maps
//! raw CSV headers to column names, and carries the field descriptions that
//! get rendered into LLM prompts for SQL generation.

use serde::{Deserialize, Serialize};

/// One column of an analytical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Header name in the source CSV (e.g. `"ship-state"`).
    pub source: String,
    /// Column name in the analytical store (e.g. `"state"`).
    pub name: String,
    /// Storage type: `TEXT`, `INTEGER`, `REAL`, or `BOOLEAN`.
    pub sql_type: String,
    /// Human-readable description, surfaced to the SQL generator prompt.
    pub description: String,
}

impl ColumnSpec {
    fn new(source: &str, name: &str, sql_type: &str, description: &str) -> Self {
        Self {
            source: source.to_string(),
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            description: description.to_string(),
        }
    }
}

/// Description of one analytical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub source_file: String,
    pub description: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// The Amazon India sales report table (the fixed retail dataset).
    pub fn amazon_sales() -> Self {
        Self {
            name: "amazon_sales".to_string(),
            source_file: "Amazon Sale Report.csv".to_string(),
            description: "Amazon India order transactions (128K rows, Apr-Jun 2022)"
                .to_string(),
            columns: vec![
                ColumnSpec::new("Order ID", "order_id", "TEXT", "Unique Amazon order identifier"),
                ColumnSpec::new("Date", "order_date", "TEXT", "Order date (MM-DD-YY format)"),
                ColumnSpec::new(
                    "Status",
                    "status",
                    "TEXT",
                    "Order status: Shipped, Cancelled, Pending, Delivered, etc.",
                ),
                ColumnSpec::new(
                    "Fulfilment",
                    "fulfilment",
                    "TEXT",
                    "Fulfilment type: Amazon or Merchant",
                ),
                ColumnSpec::new("Style", "style", "TEXT", "Product style code"),
                ColumnSpec::new("SKU", "sku", "TEXT", "Stock keeping unit"),
                ColumnSpec::new(
                    "Category",
                    "category",
                    "TEXT",
                    "Product category: kurta, Set, Top, Western Dress, Blouse, etc.",
                ),
                ColumnSpec::new(
                    "Size",
                    "size",
                    "TEXT",
                    "Product size: XS, S, M, L, XL, XXL, 3XL, etc.",
                ),
                ColumnSpec::new("Qty", "quantity", "INTEGER", "Quantity ordered"),
                ColumnSpec::new(
                    "Amount",
                    "amount",
                    "REAL",
                    "Order amount in INR (null for cancelled orders)",
                ),
                ColumnSpec::new("ship-city", "city", "TEXT", "Shipping city"),
                ColumnSpec::new("ship-state", "state", "TEXT", "Shipping state (Indian states)"),
                ColumnSpec::new(
                    "B2B",
                    "is_b2b",
                    "BOOLEAN",
                    "Business-to-business order flag (True/False)",
                ),
            ],
        }
    }

    /// Short one-table summary for agent instructions.
    pub fn summary(&self) -> String {
        let cols: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let shown = cols.len().min(8);
        format!(
            "- {}: {}\n  Columns: {}...",
            self.name,
            self.description,
            cols[..shown].join(", ")
        )
    }

    /// Full column listing with descriptions, rendered into the
    /// text-to-SQL prompt.
    pub fn prompt_schema(&self) -> String {
        let mut out = format!("Table `{}` — {}\nColumns:\n", self.name, self.description);
        for col in &self.columns {
            out.push_str(&format!("  {} — {}\n", col.name, col.description));
        }
        out
    }
}

/// Render the summaries of all configured tables.
pub fn schema_summary(tables: &[TableSchema]) -> String {
    tables.iter().map(|t| t.summary()).collect::<Vec<_>>().join("\n")
}
