//! Round-trips a hand-built `Schema` through JSON, the way the model is
//! actually used across the orchestrator/CLI boundary.

use schema_describer::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
use std::collections::BTreeMap;

fn sample_schema() -> Schema {
    let mut schema = Schema::empty("app");
    schema.tables.push(Table {
        name: "users".into(),
        schema: Some("public".into()),
        columns: vec![
            Column::new("id", "INTEGER", false),
            Column { default_value: Some("'unknown'".into()), ..Column::new("name", "VARCHAR", true) },
        ],
        constraints: vec![Constraint {
            name: "users_pk".into(),
            kind: ConstraintKind::PrimaryKey,
            table: "users".into(),
            schema: Some("public".into()),
            columns: vec!["id".into()],
            referenced_table: None,
            referenced_columns: None,
            properties: BTreeMap::new(),
        }],
        properties: BTreeMap::new(),
    });
    schema.views.push(View {
        name: "active_users".into(),
        schema: Some("public".into()),
        definition: "SELECT * FROM users".into(),
        properties: BTreeMap::new(),
    });
    schema.indexes.push(Index {
        name: "users_name_idx".into(),
        table: "users".into(),
        schema: Some("public".into()),
        columns: vec!["name".into()],
        is_unique: false,
        is_primary_key: false,
        properties: BTreeMap::new(),
    });
    schema
}

#[test]
fn schema_round_trips_through_json() {
    let schema = sample_schema();
    let json = serde_json::to_string(&schema).expect("serialize");
    let decoded: Schema = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(schema, decoded);
}

#[test]
fn json_keys_are_lower_camel_case() {
    let schema = sample_schema();
    let json = serde_json::to_string(&schema).expect("serialize");
    assert!(json.contains("\"databaseName\""));
    assert!(json.contains("\"isUnique\""));
    assert!(json.contains("\"isPrimaryKey\""));
    assert!(!json.contains("\"database_name\""));
}
