//! Database module
//!
//! Handles SQLite connection, migrations and the catalog adapter.

pub mod catalog;
pub mod connection;
pub mod migrations;

pub use catalog::SqliteCatalog;
pub use connection::{Database, DbError, DbResult};
