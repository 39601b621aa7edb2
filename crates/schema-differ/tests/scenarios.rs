//! End-to-end scenarios over SQLite-shaped schemas, built in-process (no
//! live database needed — SQLite is the hitless case since these
//! scenarios exercise model-level differences that are engine-agnostic).

use schema_describer::{Column, ConstraintKind, EngineKind, Schema, Table};
use schema_differ::{compare, synthesize, FixedClock};
use std::collections::BTreeMap;

fn fixed_clock() -> FixedClock {
    use chrono::TimeZone;
    FixedClock(chrono::Utc.ymd(2026, 1, 1).and_hms(0, 0, 0))
}

fn users_schema(name_len: i64) -> Schema {
    let mut schema = Schema::empty("app");
    schema.tables.push(Table {
        name: "users".into(),
        schema: None,
        columns: vec![
            Column::new("id", "INTEGER", false),
            Column { max_length: Some(name_len), ..Column::new("name", "VARCHAR", false) },
            Column::new("email", "TEXT", false),
            Column::new("created_at", "TEXT", false),
        ],
        constraints: vec![schema_describer::Constraint {
            name: "users_pk".into(),
            kind: ConstraintKind::PrimaryKey,
            table: "users".into(),
            schema: None,
            columns: vec!["id".into()],
            referenced_table: None,
            referenced_columns: None,
            properties: BTreeMap::new(),
        }],
        properties: BTreeMap::new(),
    });
    schema
}

fn products_schema() -> Schema {
    let mut schema = Schema::empty("app");
    schema.tables.push(Table {
        name: "products".into(),
        schema: None,
        columns: vec![
            Column::new("id", "INTEGER", false),
            Column { precision: Some(10), scale: Some(2), ..Column::new("price", "DECIMAL", false) },
        ],
        constraints: Vec::new(),
        properties: BTreeMap::new(),
    });
    schema
}

fn categories_table() -> Table {
    Table {
        name: "categories".into(),
        schema: None,
        columns: vec![
            Column::new("id", "INTEGER", false),
            Column::new("name", "TEXT", false),
            Column::new("description", "TEXT", true),
        ],
        constraints: Vec::new(),
        properties: BTreeMap::new(),
    }
}

/// Scenario A: `users.name` length widened.
#[test]
fn scenario_a_widened_column_length() {
    let source = users_schema(100);
    let target = users_schema(120);

    let diff = compare(&source, &target);
    assert_eq!(diff.modified_tables.len(), 1);
    let table_diff = &diff.modified_tables[0];
    assert_eq!(table_diff.table_name, "users");
    assert_eq!(table_diff.modified_columns.len(), 1);
    assert_eq!(table_diff.modified_columns[0].source.name, "name");

    let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m");
    assert!(sql.contains("SQLite does not support ALTER COLUMN"));
    assert!(sql.contains("users.name"));
}

/// Scenario B: new nullable column added on the target side.
#[test]
fn scenario_b_new_column_added() {
    let source = users_schema(100);
    let mut target = users_schema(100);
    target.tables[0].columns.push(Column { max_length: Some(20), ..Column::new("phone", "VARCHAR", true) });

    let diff = compare(&source, &target);
    assert_eq!(diff.modified_tables.len(), 1);
    assert_eq!(diff.modified_tables[0].missing_columns.len(), 1);
    assert_eq!(diff.modified_tables[0].missing_columns[0].name, "phone");

    let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m");
    assert!(sql.contains("ALTER TABLE users ADD COLUMN phone VARCHAR(20);"));
}

/// Scenario C: a table exists only in the target.
#[test]
fn scenario_c_new_table_in_target_is_not_synthesized() {
    let mut source = users_schema(100);
    source.tables.push(products_schema().tables.remove(0));

    let mut target = source.clone();
    target.tables.push(categories_table());

    let diff = compare(&source, &target);
    assert_eq!(diff.extra_tables.len(), 1);
    assert_eq!(diff.extra_tables[0].name, "categories");

    let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m");
    assert!(!sql.contains("CREATE TABLE categories"));
}

/// Scenario D: the same table exists only in the source.
#[test]
fn scenario_d_table_only_in_source_is_created() {
    let mut source = users_schema(100);
    source.tables.push(categories_table());
    let target = users_schema(100);

    let diff = compare(&source, &target);
    assert_eq!(diff.missing_tables.len(), 1);
    assert_eq!(diff.missing_tables[0].name, "categories");

    let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m");
    assert!(sql.contains("CREATE TABLE categories"));
    let create_pos = sql.find("CREATE TABLE categories").unwrap();
    let id_pos = sql[create_pos..].find("id INTEGER").unwrap();
    let name_pos = sql[create_pos..].find("name TEXT").unwrap();
    assert!(id_pos < name_pos, "columns must render in source order");
}

/// Scenario E: numeric precision change only; scale unchanged.
#[test]
fn scenario_e_precision_change_without_scale_change() {
    let source = products_schema();
    let mut target = products_schema();
    target.tables[0].columns[1].precision = Some(12);

    let diff = compare(&source, &target);
    assert_eq!(diff.modified_tables.len(), 1);
    let modification = &diff.modified_tables[0].modified_columns[0];
    assert_eq!(modification.differences, vec!["Precision changed from 10 to 12"]);
}

/// Scenario F: identical schemas produce an empty diff and a bare envelope.
#[test]
fn scenario_f_identical_schemas() {
    let schema = users_schema(100);
    let diff = compare(&schema, &schema);

    assert_eq!(diff.summary.differences_found, 0);
    assert_eq!(diff.summary.missing_table_count, 0);
    assert_eq!(diff.summary.extra_table_count, 0);
    assert_eq!(diff.summary.modified_table_count, 0);

    let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m");
    assert!(sql.contains("BEGIN TRANSACTION;"));
    assert!(sql.contains("COMMIT;"));
    assert!(!sql.contains("CREATE TABLE"));
    assert!(!sql.contains("ALTER TABLE"));
}

/// Testable property 2: symmetry of extras/missings.
#[test]
fn property_symmetry_of_extras_and_missings() {
    let mut source = users_schema(100);
    source.tables.push(categories_table());
    let target = users_schema(100);

    let forward = compare(&source, &target);
    let backward = compare(&target, &source);

    let forward_missing: Vec<String> = forward.missing_tables.iter().map(|t| t.full_name()).collect();
    let backward_extra: Vec<String> = backward.extra_tables.iter().map(|t| t.full_name()).collect();
    assert_eq!(forward_missing, backward_extra);
}

/// Testable property 3: partition disjointness.
#[test]
fn property_partition_disjointness() {
    let mut source = users_schema(100);
    source.tables.push(categories_table());
    let mut target = users_schema(120);
    target.tables.push(products_schema().tables.remove(0));

    let diff = compare(&source, &target);
    let missing: Vec<&str> = diff.missing_tables.iter().map(|t| t.name.as_str()).collect();
    let extra: Vec<&str> = diff.extra_tables.iter().map(|t| t.name.as_str()).collect();
    let modified: Vec<&str> = diff.modified_tables.iter().map(|t| t.table_name.as_str()).collect();

    for name in &missing {
        assert!(!extra.contains(name) && !modified.contains(name));
    }
    for name in &extra {
        assert!(!missing.contains(name) && !modified.contains(name));
    }
}

/// Testable property 5: determinism across repeated runs.
#[test]
fn property_determinism() {
    let source = users_schema(100);
    let target = users_schema(120);

    let first = synthesize(&compare(&source, &target), EngineKind::Sqlite, &fixed_clock(), "m");
    let second = synthesize(&compare(&source, &target), EngineKind::Sqlite, &fixed_clock(), "m");
    assert_eq!(first, second);
}
