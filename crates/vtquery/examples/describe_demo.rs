use std::sync::Arc;
use vtquery::{describe, describe_columns, ConnectionManager, ManagerConfig, SchemaRegistry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== vtquery Column Types Demo ===\n");

    let registry = SchemaRegistry::new()
        .with_table("processes", "pid INTEGER, name TEXT, resident_size BIGINT")
        .with_table("users", "uid BIGINT, username TEXT");
    let manager = ConnectionManager::new(ManagerConfig::from_env(), Arc::new(registry))?;
    let instance = manager.get()?;

    let queries = [
        "SELECT pid, name FROM processes",
        "SELECT 1 + 1 AS two, 'x' || name AS tagged FROM processes",
        "SELECT name, resident_size / 1048576.0 AS mib FROM processes",
        "SELECT u.username, count(*) AS procs FROM processes p JOIN users u ON u.uid = p.pid \
         GROUP BY u.username ORDER BY procs DESC",
    ];

    for query in queries {
        println!("{}", query);
        let declared = describe(query, &instance)?;
        let resolved = describe_columns(query, &instance)?;
        for (before, after) in declared.iter().zip(resolved.iter()) {
            println!(
                "  {:<10} declared {:<8} resolved {}",
                after.name, before.column_type, after.column_type
            );
        }
        println!();
    }

    Ok(())
}
