//! Migration-script synthesis. Dialect divergence is confined to
//! `SqlRenderer::render_column_modification`; everything else is shared.

use crate::clock::Clock;
use crate::model::SchemaComparison;
use schema_describer::{Column, EngineKind};
use std::fmt::Write as _;

/// Per-engine DDL rendering: one implementation per engine, selected by a
/// `match` in [`renderer`], never branched on per call.
pub trait SqlRenderer: Send + Sync {
    /// `CREATE TABLE <full-name> (...);` for a table present only in the
    /// source.
    fn render_create_table(&self, table: &schema_describer::Table) -> String {
        let mut out = String::new();
        let columns: Vec<String> = table.columns.iter().map(column_definition).collect();
        let _ = write!(out, "CREATE TABLE {} (\n  {}\n);", table.full_name(), columns.join(",\n  "));
        out
    }

    /// `ALTER TABLE ... ADD COLUMN ...;` for a column missing on the target
    /// side of a modified table.
    fn render_add_column(&self, table_name: &str, column: &Column) -> String {
        format!("ALTER TABLE {} ADD COLUMN {};", table_name, column_definition(column))
    }

    /// The dialect-divergent per-column modification statement.
    fn render_column_modification(&self, table_name: &str, column_name: &str, target: &Column) -> String;
}

/// `<name> <data-type>[(<max-length>)]? [(<precision>,<scale>)]? [NOT NULL]? [DEFAULT <expr>]?`
fn column_definition(column: &Column) -> String {
    let mut out = column.name.clone();
    let _ = write!(out, " {}", column.data_type);

    if let Some(len) = column.max_length {
        if column.data_type_upper().contains("VARCHAR") {
            let _ = write!(out, "({})", len);
        }
    }

    if let (Some(precision), Some(scale)) = (column.precision, column.scale) {
        let _ = write!(out, "({},{})", precision, scale);
    }

    if !column.nullable {
        out.push_str(" NOT NULL");
    }

    if let Some(default) = column.default_value.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, " DEFAULT {}", default);
    }

    out
}

struct PostgresRenderer;
struct MysqlRenderer;
struct MssqlRenderer;
struct SqliteRenderer;

impl SqlRenderer for PostgresRenderer {
    fn render_column_modification(&self, table_name: &str, column_name: &str, target: &Column) -> String {
        format!("ALTER TABLE {} ALTER COLUMN {} TYPE {};", table_name, column_name, target.data_type)
    }
}

impl SqlRenderer for MysqlRenderer {
    fn render_column_modification(&self, table_name: &str, _column_name: &str, target: &Column) -> String {
        format!("ALTER TABLE {} MODIFY COLUMN {};", table_name, column_definition(target))
    }
}

impl SqlRenderer for MssqlRenderer {
    fn render_column_modification(&self, table_name: &str, _column_name: &str, target: &Column) -> String {
        format!("ALTER TABLE {} ALTER COLUMN {};", table_name, column_definition(target))
    }
}

impl SqlRenderer for SqliteRenderer {
    fn render_column_modification(&self, table_name: &str, column_name: &str, _target: &Column) -> String {
        format!("-- SQLite does not support ALTER COLUMN. Manual migration required for {}.{}", table_name, column_name)
    }
}

/// Select the renderer for an engine. Mirrors `EngineKind::describer()`: a
/// `match` returning a trait object, no per-call branching at use sites.
pub fn renderer(engine: EngineKind) -> &'static dyn SqlRenderer {
    match engine {
        EngineKind::Postgres => &PostgresRenderer,
        EngineKind::MySql => &MysqlRenderer,
        EngineKind::SqlServer => &MssqlRenderer,
        EngineKind::Sqlite => &SqliteRenderer,
    }
}

/// Assemble the fixed-order migration script.
#[tracing::instrument(skip(diff, clock), fields(%engine, %migration_name))]
pub fn synthesize(diff: &SchemaComparison, engine: EngineKind, clock: &dyn Clock, migration_name: &str) -> String {
    tracing::debug!(
        missing_tables = diff.missing_tables.len(),
        modified_tables = diff.modified_tables.len(),
        "synthesizing migration script"
    );

    let render = renderer(engine);
    let mut out = String::new();

    let _ = writeln!(out, "-- Migration: {}", migration_name);
    let _ = writeln!(out, "-- Generated: {}", clock.now().to_rfc3339());
    let _ = writeln!(out, "-- Engine: {}", engine.tag());
    let _ = writeln!(out, "-- Generated by the schema diff engine.");
    out.push('\n');
    out.push_str("BEGIN TRANSACTION;\n");

    for table in &diff.missing_tables {
        out.push('\n');
        out.push_str(&render.render_create_table(table));
        out.push('\n');
    }

    for table_diff in &diff.modified_tables {
        let mut block = String::new();

        for column in &table_diff.missing_columns {
            let _ = writeln!(block, "{}", render.render_add_column(&table_diff.table_name, column));
        }

        for modification in &table_diff.modified_columns {
            let _ = writeln!(
                block,
                "{}",
                render.render_column_modification(&table_diff.table_name, &modification.source.name, &modification.target)
            );
        }

        if !block.is_empty() {
            out.push('\n');
            out.push_str(block.trim_end());
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str("COMMIT;\n");
    out.push_str("-- End of generated migration.\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::compare::compare;
    use chrono::TimeZone;
    use schema_describer::Schema;
    use std::collections::BTreeMap;

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.ymd(2026, 1, 1).and_hms(0, 0, 0))
    }

    use chrono::Utc;

    #[test]
    fn missing_table_produces_create_table_in_source_order() {
        let mut source = Schema::empty("db");
        source.tables.push(schema_describer::Table {
            name: "categories".into(),
            schema: None,
            columns: vec![Column::new("id", "INTEGER", false), Column::new("name", "VARCHAR", true)],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        });
        let target = Schema::empty("db");

        let diff = compare(&source, &target);
        let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m1");

        assert!(sql.contains("CREATE TABLE categories"));
        assert!(sql.contains("BEGIN TRANSACTION;"));
        assert!(sql.contains("COMMIT;"));
    }

    #[test]
    fn sqlite_modification_emits_manual_migration_comment() {
        let mut source = Schema::empty("db");
        source.tables.push(schema_describer::Table {
            name: "users".into(),
            schema: None,
            columns: vec![Column { max_length: Some(100), ..Column::new("name", "VARCHAR", false) }],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        });
        let mut target = source.clone();
        target.tables[0].columns[0].max_length = Some(120);

        let diff = compare(&source, &target);
        let sql = synthesize(&diff, EngineKind::Sqlite, &fixed_clock(), "m1");

        assert!(sql.contains("SQLite does not support ALTER COLUMN"));
        assert!(sql.contains("users.name"));
    }

    #[test]
    fn identical_schemas_still_emit_envelope() {
        let schema = Schema::empty("db");
        let diff = compare(&schema, &schema);
        let sql = synthesize(&diff, EngineKind::Postgres, &fixed_clock(), "m1");

        assert!(sql.contains("BEGIN TRANSACTION;"));
        assert!(sql.contains("COMMIT;"));
        assert!(!sql.contains("CREATE TABLE"));
    }
}
