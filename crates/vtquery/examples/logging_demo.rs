use std::sync::Arc;
use vtquery::logging::LogConfig;
use vtquery::{describe_columns, execute, ConnectionManager, ManagerConfig, SchemaRegistry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Debug level shows every lease decision and planner result
    let _guard = LogConfig::debug().init()?;

    println!("=== vtquery Logging Demo ===\n");

    let registry = SchemaRegistry::new()
        .with_table("processes", "pid INTEGER, name TEXT")
        .with_table("broken", "pid INTEGER,,");
    let config = ManagerConfig::default().with_disabled_tables("users");
    let manager = ConnectionManager::new(config, Arc::new(registry))?;

    println!("\n1. Leasing the primary connection (logs its creation and the attach failure)...");
    let primary = manager.get()?;

    println!("\n2. Leasing while the primary is held (logs a transient lease)...");
    let transient = manager.get()?;
    execute("SELECT count(*) FROM processes", &transient)?;
    drop(transient);

    println!("\n3. Describing an expression column (logs the planner result)...");
    describe_columns("SELECT pid * 2 AS doubled, NULL AS blank FROM processes", &primary)?;
    primary.unlock();

    println!("\n=== Demo Complete ===");
    println!("Stats: {:?}", manager.stats());

    Ok(())
}
