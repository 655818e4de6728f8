//! vendra-common — Shared types and errors used across all Vendra crates.

pub mod error;
pub mod schema;

// Re-export commonly used types
pub use error::{Result, VendraError};
pub use schema::{ColumnSpec, TableSchema};
