//! # vtquery
//!
//! Non-blocking access to a shared SQLite connection, and result column
//! types for any query, including columns that are expressions rather
//! than table columns.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vtquery::{describe_columns, execute, ColumnType, ConnectionManager, ManagerConfig, SchemaRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SchemaRegistry::new()
//!         .with_table("processes", "pid INTEGER, name TEXT, resident_size BIGINT");
//!     let manager = ConnectionManager::new(ManagerConfig::from_env(), Arc::new(registry))?;
//!
//!     // The first caller gets the primary connection, anyone else a private one
//!     let instance = manager.get()?;
//!     execute("INSERT INTO processes VALUES (1, 'launchd', 4096)", &instance)?;
//!
//!     let rows = execute("SELECT name, resident_size / 1024 AS kb FROM processes", &instance)?;
//!     assert_eq!(rows[0]["kb"], "4");
//!
//!     let columns = describe_columns("SELECT name, resident_size / 1024 AS kb FROM processes", &instance)?;
//!     assert_eq!(columns[0].column_type, ColumnType::Text);
//!     assert_eq!(columns[1].column_type, ColumnType::BigInt);
//!     Ok(())
//! }
//! ```
//!
//! ## Leases
//!
//! [`ConnectionManager::get`] never waits. When the primary connection is
//! already leased it opens a transient connection with the same tables
//! attached, which is closed when its [`Instance`] drops.

#![warn(clippy::all)]

pub mod connection;
pub mod executor;
pub mod introspect;
pub mod logging;
pub mod manager;
pub mod plugin;
pub mod registry;
pub mod security;

// Re-export core types
pub use vtquery_core::{
    ColumnType, ColumnTypeInfo, DisabledTables, Error, ManagerConfig, QueryData, Result, Row,
    TableColumns, DISABLE_TABLES_ENV, SOFT_HEAP_LIMIT,
};

// Planner
pub use vtquery_planner::{QueryPlanner, QueryProgram, TableScanOrder};

pub use connection::Connection;
pub use executor::execute;
pub use introspect::{describe, describe_columns};
pub use manager::{ConnectionManager, Instance, ManagerStats};
pub use plugin::{PluginRegistry, SqlPlugin, SqlitePlugin};
pub use registry::{SchemaRegistry, VirtualTableRegistry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
