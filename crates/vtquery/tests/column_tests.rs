mod common;

use common::ManagerFixture;
use vtquery::{describe, describe_columns, ColumnType, Error, QueryPlanner};

fn types(columns: &vtquery::TableColumns) -> Vec<ColumnType> {
    columns.iter().map(|c| c.column_type).collect()
}

#[test]
fn test_table_columns_use_declared_types() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let columns = describe("SELECT name, age, score, big FROM t", &instance).unwrap();
    assert!(columns.is_resolved());
    assert_eq!(
        types(&columns),
        vec![
            ColumnType::Text,
            ColumnType::Integer,
            ColumnType::Double,
            ColumnType::BigInt
        ]
    );
    assert_eq!(columns[2].declared_type.as_deref(), Some("REAL"));
}

#[test]
fn test_expression_is_unknown_until_planned() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let described = describe("SELECT 1+1 AS x", &instance).unwrap();
    assert_eq!(described[0].name, "x");
    assert_eq!(described[0].column_type, ColumnType::Unknown);
    assert_eq!(described[0].declared_type, None);

    let mut planned = described.clone();
    let planner = QueryPlanner::new("SELECT 1+1 AS x", instance.connection().handle()).unwrap();
    planner.apply_types(&mut planned).unwrap();
    assert_eq!(planned[0].column_type, ColumnType::Integer);

    let columns = describe_columns("SELECT 1+1 AS x", &instance).unwrap();
    assert_eq!(columns, planned);
}

#[test]
fn test_mixed_columns() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let columns = describe_columns(
        "SELECT p.name, p.resident_size / 1024 AS kb, upper(p.path) AS up, u.username \
         FROM processes p JOIN users u ON u.uid = p.pid",
        &instance,
    )
    .unwrap();
    assert!(columns.is_resolved());
    assert_eq!(
        types(&columns),
        vec![
            ColumnType::Text,
            ColumnType::BigInt,
            ColumnType::Text,
            ColumnType::Text
        ]
    );
}

#[test]
fn test_aggregates_and_ordering() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let columns = describe_columns(
        "SELECT name, count(*) AS c, sum(score) AS s, avg(age) AS a \
         FROM t GROUP BY name ORDER BY c DESC",
        &instance,
    )
    .unwrap();
    assert_eq!(
        types(&columns),
        vec![
            ColumnType::Text,
            ColumnType::BigInt,
            ColumnType::Double,
            ColumnType::Double
        ]
    );
}

#[test]
fn test_index_driven_join() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();
    instance
        .connection()
        .handle()
        .execute_batch("CREATE INDEX processes_pid ON processes(pid)")
        .unwrap();

    for query in [
        "SELECT t.score + 1 AS v FROM processes JOIN t ON t.rowid = processes.pid \
         WHERE processes.pid > 0",
        "SELECT t.score + 1 AS v FROM processes INDEXED BY processes_pid \
         JOIN t ON t.rowid = processes.pid",
    ] {
        let columns = describe_columns(query, &instance).unwrap();
        assert_eq!(types(&columns), vec![ColumnType::Double], "{query}");
    }
}

#[test]
fn test_unresolvable_column_is_left_unknown() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let query = "SELECT 1 AS one, NULL AS blank";
    let columns = describe_columns(query, &instance).unwrap();
    assert!(!columns.is_resolved());
    assert_eq!(columns[0].column_type, ColumnType::Integer);
    assert_eq!(columns[1].column_type, ColumnType::Unknown);

    let mut partial = describe(query, &instance).unwrap();
    let planner = QueryPlanner::new(query, instance.connection().handle()).unwrap();
    let err = planner.apply_types(&mut partial).unwrap_err();
    assert!(matches!(err, Error::UnresolvedTypes(ref names) if names == &["blank"]));
    assert_eq!(partial, columns);
}

#[test]
fn test_planner_results_are_repeatable() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let query = "SELECT age * 2.0 AS d, big & 255 AS b, coalesce(name, 'n/a') AS n FROM t";
    let planner = QueryPlanner::new(query, instance.connection().handle()).unwrap();

    let mut first = describe(query, &instance).unwrap();
    let mut second = first.clone();
    planner.apply_types(&mut first).unwrap();
    planner.apply_types(&mut second).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        types(&first),
        vec![ColumnType::Double, ColumnType::BigInt, ColumnType::Text]
    );
}

#[test]
fn test_describe_works_on_transient_connections() {
    let fixture = ManagerFixture::new();
    let _primary = fixture.manager.get().unwrap();

    let transient = fixture.manager.get().unwrap();
    assert!(!transient.is_primary());
    let columns = describe_columns("SELECT count(*) AS n FROM users", &transient).unwrap();
    assert_eq!(columns[0].column_type, ColumnType::BigInt);
}

#[test]
fn test_describe_reports_engine_errors() {
    let fixture = ManagerFixture::new();
    let instance = fixture.manager.get().unwrap();

    let err = describe_columns("SELECT missing_column FROM t", &instance).unwrap_err();
    assert!(err.to_string().contains("no such column"));
}
