//! Virtual table registries
//!
//! A registry knows which tables exist and how to attach them to, and
//! detach them from, an engine handle. Connections consult it once when
//! they are opened and again when they close.

use crate::security::validate_table_name;
use indexmap::IndexMap;
use vtquery_core::Result;

/// Source of the tables attached to every connection.
pub trait VirtualTableRegistry: Send + Sync {
    /// Names of every table the registry can attach, in attach order.
    fn table_names(&self) -> Vec<String>;

    /// Makes `name` queryable on `conn`.
    fn attach(&self, conn: &rusqlite::Connection, name: &str) -> Result<()>;

    /// Removes `name` from `conn`. Failures are not reported.
    fn detach(&self, conn: &rusqlite::Connection, name: &str);
}

/// Registry backed by plain DDL.
///
/// Each table is created with `CREATE TABLE IF NOT EXISTS` on attach and
/// dropped again on detach.
///
/// # Examples
///
/// ```rust
/// use vtquery::SchemaRegistry;
///
/// let registry = SchemaRegistry::new()
///     .with_table("processes", "pid INTEGER, name TEXT")
///     .with_table("users", "uid BIGINT, username TEXT");
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: IndexMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table with its column definitions (`"pid INTEGER, name TEXT"`).
    pub fn with_table(mut self, name: impl Into<String>, columns: impl Into<String>) -> Self {
        self.insert(name, columns);
        self
    }

    /// Adds or replaces a table definition.
    pub fn insert(&mut self, name: impl Into<String>, columns: impl Into<String>) {
        self.tables.insert(name.into(), columns.into());
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl VirtualTableRegistry for SchemaRegistry {
    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn attach(&self, conn: &rusqlite::Connection, name: &str) -> Result<()> {
        validate_table_name(name)?;
        let columns = self.tables.get(name).map(String::as_str).unwrap_or_default();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {}({})",
            quote_identifier(name),
            columns
        ))?;
        Ok(())
    }

    fn detach(&self, conn: &rusqlite::Connection, name: &str) {
        let _ = conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)));
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
