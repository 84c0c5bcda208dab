#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, OnceLock};
use vtquery::{describe_columns, ConnectionManager, ManagerConfig, SchemaRegistry};

static MANAGER: OnceLock<ConnectionManager> = OnceLock::new();

fn manager() -> &'static ConnectionManager {
    MANAGER.get_or_init(|| {
        let registry = SchemaRegistry::new()
            .with_table("t", "name TEXT, age INTEGER, score REAL, big BIGINT")
            .with_table("u", "id INTEGER, label TEXT, data BLOB");
        ConnectionManager::new(ManagerConfig::default(), Arc::new(registry))
            .expect("Failed to create manager")
    })
}

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        // Limit query length to prevent timeout
        if sql.len() > 4_096 {
            return;
        }

        // Engine errors are fine, panics are not
        if let Ok(instance) = manager().get_unique() {
            let _ = describe_columns(sql, &instance);
        }
    }
});
