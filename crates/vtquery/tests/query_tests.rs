mod common;

use common::ManagerFixture;
use std::sync::Arc;
use vtquery::{
    execute, ConnectionManager, Error, ManagerConfig, PluginRegistry, SchemaRegistry,
    SqlitePlugin,
};

#[test]
fn test_rows_in_result_order() {
    let fixture = ManagerFixture::new();
    fixture.seed();

    let instance = fixture.manager.get().unwrap();
    let rows = execute("SELECT name, age FROM t ORDER BY age DESC", &instance).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "carol");
    assert_eq!(rows[2]["name"], "bob");

    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age"]);
}

#[test]
fn test_value_rendering() {
    let fixture = ManagerFixture::new();
    fixture.seed();

    let instance = fixture.manager.get().unwrap();
    let rows = execute(
        "SELECT age, score, big, x'6869' AS raw FROM t WHERE name = 'bob'",
        &instance,
    )
    .unwrap();
    assert_eq!(rows[0]["age"], "25");
    assert_eq!(rows[0]["score"], "");
    assert_eq!(rows[0]["big"], "1");
    assert_eq!(rows[0]["raw"], "hi");

    let rows = execute("SELECT score, big FROM t WHERE name = 'alice'", &instance).unwrap();
    assert_eq!(rows[0]["score"], "91.5");
    assert_eq!(rows[0]["big"], "9000000000");
}

#[test]
fn test_empty_result_is_ok() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();
    let rows = execute("SELECT * FROM t WHERE age > 100", &instance).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_engine_error_carries_diagnostic() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let err = execute("SELEC name FROM t", &instance).unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
    assert!(err.to_string().contains("syntax error"));
    assert!(err.engine_code().is_some());
}

#[test]
fn test_invalid_input_never_reaches_engine() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    assert!(matches!(
        execute("   ", &instance),
        Err(Error::InvalidInput(_))
    ));
    let oversized = format!("SELECT '{}'", "x".repeat(vtquery::security::MAX_QUERY_LENGTH));
    assert!(matches!(
        execute(&oversized, &instance),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_writes_through_primary_persist() {
    let fixture = ManagerFixture::new();
    {
        let instance = fixture.manager.get().unwrap();
        let rows = execute("INSERT INTO users VALUES (501, 'dev', '/bin/zsh')", &instance).unwrap();
        assert!(rows.is_empty());
    }

    let instance = fixture.manager.get().unwrap();
    let rows = execute("SELECT username, shell FROM users", &instance).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], "dev");
    assert_eq!(rows[0]["shell"], "/bin/zsh");
}

#[test]
fn test_every_statement_runs() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let rows = execute(
        "SELECT 'first' AS a; INSERT INTO t VALUES ('second', 1, 1.0, 1)",
        &instance,
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["a"], "first");

    let rows = execute("SELECT count(*) AS n FROM t;", &instance).unwrap();
    assert_eq!(rows[0]["n"], "1");

    let rows = execute(
        "SELECT name FROM t; SELECT age + 1 AS next FROM t; -- done",
        &instance,
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "second");
    assert_eq!(rows[1]["next"], "2");
}

#[test]
fn test_failing_statement_stops_the_run() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let err = execute(
        "INSERT INTO users VALUES (0, 'root', '/bin/sh'); SELEC 1; \
         INSERT INTO users VALUES (1, 'daemon', '/usr/bin/false')",
        &instance,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Engine(_)));

    let rows = execute("SELECT username FROM users", &instance).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], "root");
}

#[test]
fn test_attach_failure_does_not_stop_attachment() {
    let registry = SchemaRegistry::new()
        .with_table("broken", "id INTEGER,,")
        .with_table("ok", "id INTEGER");
    let manager = ConnectionManager::new(ManagerConfig::default(), Arc::new(registry)).unwrap();

    let instance = manager.get().unwrap();
    assert_eq!(instance.connection().attached_tables(), &["ok"]);
    assert_eq!(instance.connection().attach_failures().len(), 1);
    assert!(execute("SELECT id FROM ok", &instance).unwrap().is_empty());
}

#[test]
fn test_plugin_routes_through_manager() {
    let fixture = ManagerFixture::new();
    fixture.seed();

    let plugins = PluginRegistry::new();
    plugins
        .register("sqlite", Arc::new(SqlitePlugin::new(Arc::clone(&fixture.manager))))
        .unwrap();

    let rows = plugins.query("SELECT count(*) AS n FROM t").unwrap();
    assert_eq!(rows[0]["n"], "3");

    let columns = plugins
        .get_query_columns("SELECT name, count(*) AS n FROM t GROUP BY name")
        .unwrap();
    assert!(columns.is_resolved());
    assert_eq!(fixture.manager.stats().primary_leases, 3);
}
