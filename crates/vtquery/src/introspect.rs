//! Result column introspection
//!
//! Columns read straight from a table carry the table's declared type.
//! Expressions, literals, aggregates and subqueries have none, so their
//! types are inferred from the compiled program by the planner.

use crate::manager::Instance;
use crate::security::validate_query;
use tracing::debug;
use vtquery_core::{ColumnType, ColumnTypeInfo, Error, Result, TableColumns};
use vtquery_planner::QueryPlanner;

/// Names and declared types of the result columns of `query`.
///
/// The statement is prepared but never stepped. Columns without a declared
/// type are returned as [`ColumnType::Unknown`].
pub fn describe(query: &str, instance: &Instance<'_>) -> Result<TableColumns> {
    validate_query(query)?;

    let stmt = instance.connection().handle().prepare(query)?;
    let columns = stmt
        .columns()
        .into_iter()
        .map(|column| match column.decl_type() {
            Some(declared) => ColumnTypeInfo::declared(column.name(), declared),
            None => ColumnTypeInfo::new(column.name(), ColumnType::Unknown),
        })
        .collect();
    Ok(columns)
}

/// Like [`describe`], with expression column types filled in by the planner.
///
/// Columns the planner cannot type stay `Unknown`; check
/// [`TableColumns::is_resolved`] when every type matters. Only engine
/// failures are errors.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use vtquery::{describe_columns, ColumnType, ConnectionManager, ManagerConfig, SchemaRegistry};
///
/// let registry = SchemaRegistry::new().with_table("t", "name TEXT, age INTEGER");
/// let manager = ConnectionManager::new(ManagerConfig::default(), Arc::new(registry))?;
/// let instance = manager.get()?;
///
/// let columns = describe_columns("SELECT name, age + 1 AS next FROM t", &instance)?;
/// assert_eq!(columns[0].column_type, ColumnType::Text);
/// assert_eq!(columns[1].column_type, ColumnType::Integer);
/// # Ok::<(), vtquery::Error>(())
/// ```
pub fn describe_columns(query: &str, instance: &Instance<'_>) -> Result<TableColumns> {
    let mut columns = describe(query, instance)?;
    if columns.is_resolved() {
        return Ok(columns);
    }

    let planner = QueryPlanner::new(query, instance.connection().handle())?;
    match planner.apply_types(&mut columns) {
        Ok(()) => debug!(columns = columns.len(), "planner resolved all columns"),
        Err(Error::UnresolvedTypes(names)) => {
            debug!(unresolved = ?names, "planner left columns unresolved")
        }
        Err(e) => return Err(e),
    }
    Ok(columns)
}
