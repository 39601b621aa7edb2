//! Drives `DiffEngine::run` end-to-end against an in-process fake
//! describer, keyed by connection string, so the pipeline is exercised
//! without a live database.

use chrono::{TimeZone, Utc};
use migration_core::{CancellationToken, DiffEngine, DiffRequest};
use schema_describer::{Column, DescriberResult, EngineKind, ReadOptions, Schema, SchemaDescriber, Table};
use schema_differ::FixedClock;
use std::collections::BTreeMap;

struct FakeDescriber {
    schemas: BTreeMap<&'static str, Schema>,
}

#[async_trait::async_trait]
impl SchemaDescriber for FakeDescriber {
    async fn read_schema(&self, conn: &str, _options: &ReadOptions) -> DescriberResult<Schema> {
        Ok(self.schemas.get(conn).cloned().unwrap_or_else(|| Schema::empty("app")))
    }

    async fn test_connection(&self, conn: &str) -> bool {
        self.schemas.contains_key(conn)
    }

    fn display_name(&self, _conn: &str) -> String {
        "sqlite://***".to_owned()
    }
}

fn users_table(name_len: i64) -> Table {
    Table {
        name: "users".into(),
        schema: None,
        columns: vec![
            Column::new("id", "INTEGER", false),
            Column { max_length: Some(name_len), ..Column::new("name", "VARCHAR", false) },
        ],
        constraints: Vec::new(),
        properties: BTreeMap::new(),
    }
}

#[tokio::test]
async fn run_produces_a_report_and_a_script_for_a_widened_column() {
    let mut source_schema = Schema::empty("app");
    source_schema.tables.push(users_table(100));

    let mut target_schema = Schema::empty("app");
    target_schema.tables.push(users_table(120));

    let mut schemas = BTreeMap::new();
    schemas.insert("source-conn", source_schema);
    schemas.insert("target-conn", target_schema);

    let describer = FakeDescriber { schemas };
    let clock = FixedClock(Utc.ymd(2026, 1, 1).and_hms(0, 0, 0));
    let engine = DiffEngine::with_describer(&describer, EngineKind::Sqlite, &clock);
    let cancel = CancellationToken::new();

    let request = DiffRequest {
        source_conn: "source-conn",
        target_conn: "target-conn",
        options: ReadOptions::default(),
        migration_name: "m1".into(),
    };

    let outcome = engine.run(request, &cancel).await.expect("run should succeed");

    assert_eq!(outcome.comparison.summary.modified_table_count, 1);
    assert_eq!(outcome.report.metadata.migration_name, "m1");
    assert!(outcome.migration_script.contains("SQLite does not support ALTER COLUMN"));
}

#[tokio::test]
async fn run_fails_validation_before_reaching_the_comparator() {
    let mut invalid_schema = Schema::empty("app");
    invalid_schema.tables.push(Table {
        name: String::new(),
        schema: None,
        columns: Vec::new(),
        constraints: Vec::new(),
        properties: BTreeMap::new(),
    });

    let mut schemas = BTreeMap::new();
    schemas.insert("source-conn", invalid_schema);
    schemas.insert("target-conn", Schema::empty("app"));

    let describer = FakeDescriber { schemas };
    let clock = FixedClock(Utc.ymd(2026, 1, 1).and_hms(0, 0, 0));
    let engine = DiffEngine::with_describer(&describer, EngineKind::Sqlite, &clock);
    let cancel = CancellationToken::new();

    let request = DiffRequest {
        source_conn: "source-conn",
        target_conn: "target-conn",
        options: ReadOptions::default(),
        migration_name: "m1".into(),
    };

    let result = engine.run(request, &cancel).await;
    assert!(matches!(result, Err(migration_core::CoreError::Validation(_))));
}
