//! vendra-db — embedded analytical store for the retail dataset.
//!
//! A `Database` handle wraps a SQLite pool with an explicit open/close
//! lifecycle: constructed once at startup, passed to whoever needs it,
//! closed at shutdown. There is no lazily-initialized global connection.
//!
//! The executor only runs read statements; anything whose leading keyword
//! writes (INSERT/UPDATE/DELETE/DROP/…) is rejected before execution. That
//! guard is independent of the guardrails gate upstream.

pub mod database;
pub mod error;
pub mod executor;
pub mod ingest;

pub use database::Database;
pub use error::{DbError, Result};
pub use executor::{execute_query, is_write_statement, QueryResult};
pub use ingest::load_csv;
