//! Schema-attached engine handles.

use crate::registry::VirtualTableRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use vtquery_core::{DisabledTables, Error, Result};

/// An in-memory engine handle with every enabled registry table attached.
///
/// Tables are detached in reverse attach order when the connection drops,
/// before the handle itself is closed.
pub struct Connection {
    handle: rusqlite::Connection,
    registry: Arc<dyn VirtualTableRegistry>,
    attached: Vec<String>,
    failures: Vec<Error>,
}

impl Connection {
    /// Opens a fresh handle and attaches every table not in `disabled`.
    ///
    /// Only a failure to open the handle is an error. A table that fails to
    /// attach is logged, recorded in [`attach_failures`](Self::attach_failures)
    /// and skipped.
    pub fn open(registry: Arc<dyn VirtualTableRegistry>, disabled: &DisabledTables) -> Result<Self> {
        let handle = rusqlite::Connection::open_in_memory()?;
        let mut conn = Self {
            handle,
            registry,
            attached: Vec::new(),
            failures: Vec::new(),
        };
        conn.attach_tables(disabled);
        Ok(conn)
    }

    fn attach_tables(&mut self, disabled: &DisabledTables) {
        for name in self.registry.table_names() {
            if disabled.contains(&name) {
                debug!(table = %name, "skipping disabled table");
                continue;
            }
            match self.registry.attach(&self.handle, &name) {
                Ok(()) => self.attached.push(name),
                Err(e) => {
                    warn!(table = %name, error = %e, "failed to attach table");
                    self.failures.push(Error::Attach {
                        table: name,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// The underlying engine handle.
    pub fn handle(&self) -> &rusqlite::Connection {
        &self.handle
    }

    /// Tables attached to this connection, in attach order.
    pub fn attached_tables(&self) -> &[String] {
        &self.attached
    }

    pub fn attach_failures(&self) -> &[Error] {
        &self.failures
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.attached.iter().any(|t| t == name)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("attached", &self.attached)
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for name in self.attached.iter().rev() {
            self.registry.detach(&self.handle, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;

    fn registry() -> Arc<dyn VirtualTableRegistry> {
        Arc::new(
            SchemaRegistry::new()
                .with_table("processes", "pid INTEGER, name TEXT")
                .with_table("users", "uid BIGINT, username TEXT")
                .with_table("broken", "x INTEGER,,"),
        )
    }

    #[test]
    fn test_open_attaches_enabled_tables() {
        let conn = Connection::open(registry(), &DisabledTables::parse("users")).unwrap();
        assert_eq!(conn.attached_tables(), &["processes"]);
        assert!(!conn.is_attached("users"));
        assert!(conn.handle().prepare("SELECT pid FROM processes").is_ok());
        assert!(conn.handle().prepare("SELECT uid FROM users").is_err());
    }

    #[test]
    fn test_attach_failure_is_recorded() {
        let conn = Connection::open(registry(), &DisabledTables::default()).unwrap();
        assert_eq!(conn.attached_tables(), &["processes", "users"]);
        assert_eq!(conn.attach_failures().len(), 1);
        assert!(matches!(
            &conn.attach_failures()[0],
            Error::Attach { table, .. } if table == "broken"
        ));
    }
}
