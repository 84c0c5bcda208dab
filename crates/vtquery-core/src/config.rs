//! Connection manager configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Soft heap ceiling applied to the engine once per process (5 MiB).
pub const SOFT_HEAP_LIMIT: i64 = 5 * 1024 * 1024;

/// Environment variable holding the comma-delimited disabled table list.
pub const DISABLE_TABLES_ENV: &str = "VTQUERY_DISABLE_TABLES";

/// Manager configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Comma-delimited names of tables never attached to a connection
    pub disabled_tables: String,
    /// Engine soft heap limit in bytes. Zero disables the limit; negative
    /// values are rejected.
    pub soft_heap_limit: i64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            disabled_tables: String::new(),
            soft_heap_limit: SOFT_HEAP_LIMIT,
        }
    }
}

impl ManagerConfig {
    /// Default config with the disabled table list taken from the environment.
    pub fn from_env() -> Self {
        Self {
            disabled_tables: std::env::var(DISABLE_TABLES_ENV).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Set the disabled table list
    pub fn with_disabled_tables<S: Into<String>>(mut self, tables: S) -> Self {
        self.disabled_tables = tables.into();
        self
    }

    /// Set the soft heap limit
    pub fn with_soft_heap_limit(mut self, limit: i64) -> Self {
        self.soft_heap_limit = limit;
        self
    }

    /// Checks the configuration before a manager is built from it.
    ///
    /// The engine reads a negative soft heap limit as a query and leaves the
    /// limit unchanged, so it is refused here.
    pub fn validate(&self) -> Result<()> {
        if self.soft_heap_limit < 0 {
            return Err(Error::InvalidInput(format!(
                "soft heap limit must not be negative, got {}",
                self.soft_heap_limit
            )));
        }
        Ok(())
    }
}

/// Set of table names excluded from attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledTables {
    names: HashSet<String>,
}

impl DisabledTables {
    /// Parses a comma-delimited list.
    ///
    /// Pieces are trimmed and empty pieces dropped; malformed input never
    /// fails, it just contributes nothing.
    pub fn parse(list: &str) -> Self {
        let names = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        Self { names }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_empty() {
        let disabled = DisabledTables::parse("a, b ,,c");
        let expected: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
        assert_eq!(disabled.iter().collect::<HashSet<_>>(), expected);
        assert_eq!(disabled.len(), 3);
    }

    #[test]
    fn test_membership_is_exact() {
        let disabled = DisabledTables::parse("processes,users");
        assert!(disabled.contains("users"));
        assert!(!disabled.contains("Users"));
        assert!(!disabled.contains("user"));
        assert!(!disabled.contains(" users"));
    }

    #[test]
    fn test_empty_and_blank_lists() {
        assert!(DisabledTables::parse("").is_empty());
        assert!(DisabledTables::parse(" , ,\t,").is_empty());
    }

    #[test]
    fn test_config_builders() {
        let config = ManagerConfig::default()
            .with_disabled_tables("a,b")
            .with_soft_heap_limit(1024);
        assert_eq!(config.disabled_tables, "a,b");
        assert_eq!(config.soft_heap_limit, 1024);
        assert_eq!(ManagerConfig::default().soft_heap_limit, SOFT_HEAP_LIMIT);
    }

    #[test]
    fn test_validate_soft_heap_limit() {
        assert!(ManagerConfig::default().validate().is_ok());
        assert!(ManagerConfig::default().with_soft_heap_limit(0).validate().is_ok());

        let err = ManagerConfig::default()
            .with_soft_heap_limit(-1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("-1")));
    }
}
