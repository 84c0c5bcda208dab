//! # vtquery Core
//!
//! Core types, errors and configuration shared by the vtquery crates.
//!
//! **This crate is an internal implementation detail of vtquery.** Depend on
//! the main `vtquery` crate instead.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{DisabledTables, ManagerConfig, DISABLE_TABLES_ENV, SOFT_HEAP_LIMIT};
pub use error::{Error, Result};
pub use types::{ColumnType, ColumnTypeInfo, QueryData, Row, TableColumns};
