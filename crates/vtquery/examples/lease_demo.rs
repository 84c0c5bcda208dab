use std::sync::Arc;
use std::thread;
use vtquery::{execute, ConnectionManager, ManagerConfig, SchemaRegistry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== vtquery Lease Demo ===\n");

    let registry = SchemaRegistry::new().with_table("events", "id INTEGER, kind TEXT");
    let manager = Arc::new(ConnectionManager::new(
        ManagerConfig::default(),
        Arc::new(registry),
    )?);

    // Writes through the primary are visible to later primary leases only
    {
        let primary = manager.get()?;
        execute("INSERT INTO events VALUES (1, 'boot')", &primary)?;
    }

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || -> vtquery::Result<()> {
                let instance = manager.get()?;
                let rows = execute("SELECT count(*) AS n FROM events", &instance)?;
                println!(
                    "worker {} got a {} lease and sees {} event(s)",
                    worker,
                    if instance.is_primary() { "primary" } else { "transient" },
                    rows[0]["n"]
                );
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        if let Ok(Err(e)) = handle.join() {
            eprintln!("worker failed: {}", e);
        }
    }

    println!("\nStats: {:?}", manager.stats());
    Ok(())
}
