//! Query execution over a leased connection.

use crate::manager::Instance;
use crate::security::validate_query;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Statement};
use tracing::debug;
use vtquery_core::{QueryData, Result, Row};

/// Runs every statement in `query` and collects their rows.
///
/// Statements run in order and their rows are appended to one result.
/// Each row maps column name to the value rendered as text. NULL becomes
/// the empty string and blobs are decoded as lossy UTF-8. A query that
/// yields no rows returns an empty vector. A failing statement stops the
/// run; statements before it have already taken effect.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use vtquery::{execute, ConnectionManager, ManagerConfig, SchemaRegistry};
///
/// let manager = ConnectionManager::new(ManagerConfig::default(), Arc::new(SchemaRegistry::new()))?;
/// let instance = manager.get()?;
///
/// let rows = execute("SELECT 1 AS one, NULL AS nothing", &instance)?;
/// assert_eq!(rows[0]["one"], "1");
/// assert_eq!(rows[0]["nothing"], "");
/// # Ok::<(), vtquery::Error>(())
/// ```
pub fn execute(query: &str, instance: &Instance<'_>) -> Result<QueryData> {
    validate_query(query)?;

    let mut data = QueryData::new();
    let mut statements = 0usize;
    let mut batch = Batch::new(instance.connection().handle(), query);
    while let Some(mut stmt) = batch.next()? {
        statements += 1;
        collect_rows(&mut stmt, &mut data)?;
    }

    debug!(
        statements,
        rows = data.len(),
        primary = instance.is_primary(),
        "executed query"
    );
    Ok(data)
}

fn collect_rows(stmt: &mut Statement<'_>, data: &mut QueryData) -> Result<()> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Row::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            values.insert(name.clone(), value_string(row.get_ref(i)?));
        }
        data.push(values);
    }
    Ok(())
}

fn value_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_string() {
        assert_eq!(value_string(ValueRef::Null), "");
        assert_eq!(value_string(ValueRef::Integer(-42)), "-42");
        assert_eq!(value_string(ValueRef::Real(2.5)), "2.5");
        assert_eq!(value_string(ValueRef::Text(b"abc")), "abc");
        assert_eq!(value_string(ValueRef::Blob(&[0x68, 0x69, 0xff])), "hi\u{fffd}");
    }
}
