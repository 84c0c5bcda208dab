// Common test utilities for vtquery integration tests

use std::sync::Arc;
use vtquery::{ConnectionManager, ManagerConfig, SchemaRegistry};

/// Table definitions attached to every fixture connection
pub const TABLES: &[(&str, &str)] = &[
    ("t", "name TEXT, age INTEGER, score REAL, big BIGINT"),
    ("processes", "pid INTEGER, name TEXT, path TEXT, resident_size BIGINT"),
    ("users", "uid BIGINT, username TEXT, shell TEXT"),
];

/// Test fixture owning a manager over the fixture tables
pub struct ManagerFixture {
    pub manager: Arc<ConnectionManager>,
}

impl ManagerFixture {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    #[allow(dead_code)]
    pub fn with_disabled(disabled: &str) -> Self {
        Self::with_config(ManagerConfig::default().with_disabled_tables(disabled))
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let registry = TABLES
            .iter()
            .fold(SchemaRegistry::new(), |registry, (name, columns)| {
                registry.with_table(*name, *columns)
            });
        let manager =
            ConnectionManager::new(config, Arc::new(registry)).expect("Failed to create manager");
        Self {
            manager: Arc::new(manager),
        }
    }

    /// Inserts a few rows into `t` through the primary connection
    #[allow(dead_code)]
    pub fn seed(&self) {
        let instance = self.manager.get().expect("Failed to lease connection");
        assert!(instance.is_primary(), "seed needs the primary connection");
        instance
            .connection()
            .handle()
            .execute_batch(
                "INSERT INTO t VALUES ('alice', 30, 91.5, 9000000000);
                 INSERT INTO t VALUES ('bob', 25, NULL, 1);
                 INSERT INTO t VALUES ('carol', 41, 78.25, NULL);",
            )
            .expect("Failed to seed table");
    }
}

impl Default for ManagerFixture {
    fn default() -> Self {
        Self::new()
    }
}
