//! MySQL introspection.

use crate::defaults::looks_like_mysql_auto_increment;
use crate::error::{DescriberError, DescriberResult};
use crate::model::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
use crate::options::ReadOptions;
use crate::redact;
use crate::SchemaDescriber;
use quaint::prelude::*;
use quaint::single::Quaint;
use std::collections::BTreeMap;
use tracing_futures::Instrument;

/// Introspects a MySQL (or MariaDB) database.
pub struct MysqlDescriber;

#[async_trait::async_trait]
impl SchemaDescriber for MysqlDescriber {
    async fn read_schema(&self, conn: &str, options: &ReadOptions) -> DescriberResult<Schema> {
        let database = Quaint::new(conn).await.map_err(DescriberError::from)?;
        let db_name = database.connection_info().schema_name().to_owned();

        let mut schema = Schema::empty(db_name.clone());
        schema.tables = read_tables(&database, &db_name, options)
            .instrument(tracing::info_span!("ReadTables", engine = "mysql", database = %db_name))
            .await?;

        // Views and indexes are optional reads for MySQL per the read
        // contract; this back-end implements both, but always reads
        // neither or both so source and target stay consistent.
        if options.include_views {
            schema.views = read_views(&database, &db_name).instrument(tracing::debug_span!("ReadViews")).await?;
        } else {
            schema.views = Vec::new();
        }

        if options.include_indexes {
            schema.indexes = read_indexes(&database, &db_name).instrument(tracing::debug_span!("ReadIndexes")).await?;
        } else {
            schema.indexes = Vec::new();
        }

        tracing::debug!(tables = schema.tables.len(), views = schema.views.len(), indexes = schema.indexes.len());

        Ok(schema)
    }

    async fn test_connection(&self, conn: &str) -> bool {
        Quaint::new(conn).await.is_ok()
    }

    fn display_name(&self, conn: &str) -> String {
        redact::display_name("mysql", conn)
    }
}

async fn read_tables(database: &Quaint, db_name: &str, options: &ReadOptions) -> DescriberResult<Vec<Table>> {
    let sql = "
        SELECT TABLE_NAME
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    ";

    tracing::debug!(database = db_name, "querying information_schema.TABLES");
    let rows = database.query_raw(sql, &[db_name.into()]).await.map_err(DescriberError::from)?;
    let mut tables = Vec::new();

    for row in rows.into_iter() {
        let table_name = get_string(&row, "TABLE_NAME")?;

        if !options.retains_table(&table_name) {
            continue;
        }

        let columns = read_columns(database, db_name, &table_name).await?;
        let constraints = read_constraints(database, db_name, &table_name, options).await?;

        tables.push(Table {
            name: table_name,
            schema: None,
            columns,
            constraints,
            properties: BTreeMap::new(),
        });
    }

    Ok(tables)
}

async fn read_columns(database: &Quaint, db_name: &str, table_name: &str) -> DescriberResult<Vec<Column>> {
    let sql = "
        SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_DEFAULT, EXTRA,
               CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, NUMERIC_SCALE,
               GENERATION_EXPRESSION
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    ";

    tracing::debug!(database = db_name, table = table_name, "querying information_schema.COLUMNS");
    let rows = database
        .query_raw(sql, &[db_name.into(), table_name.into()])
        .await
        .map_err(DescriberError::from)?;

    let mut columns = Vec::new();

    for row in rows.into_iter() {
        let extra = row.get("EXTRA").and_then(|v| v.to_string()).unwrap_or_default();
        let generation_expression = row.get("GENERATION_EXPRESSION").and_then(|v| v.to_string()).unwrap_or_default();

        columns.push(Column {
            name: get_string(&row, "COLUMN_NAME")?,
            data_type: get_string(&row, "DATA_TYPE")?,
            nullable: get_string(&row, "IS_NULLABLE")?.eq_ignore_ascii_case("YES"),
            default_value: row.get("COLUMN_DEFAULT").and_then(|v| v.to_string()),
            max_length: row.get("CHARACTER_MAXIMUM_LENGTH").and_then(|v| v.as_i64()),
            precision: row.get("NUMERIC_PRECISION").and_then(|v| v.as_i64()),
            scale: row.get("NUMERIC_SCALE").and_then(|v| v.as_i64()),
            is_identity: looks_like_mysql_auto_increment(&extra),
            is_computed: !generation_expression.is_empty(),
            properties: BTreeMap::new(),
        });
    }

    Ok(columns)
}

async fn read_constraints(
    database: &Quaint,
    db_name: &str,
    table_name: &str,
    options: &ReadOptions,
) -> DescriberResult<Vec<Constraint>> {
    let sql = "
        SELECT tc.CONSTRAINT_NAME, tc.CONSTRAINT_TYPE, kcu.COLUMN_NAME, kcu.ORDINAL_POSITION,
               kcu.REFERENCED_TABLE_NAME, kcu.REFERENCED_COLUMN_NAME
        FROM information_schema.TABLE_CONSTRAINTS tc
        JOIN information_schema.KEY_COLUMN_USAGE kcu
          ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
        WHERE tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ?
        ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
    ";

    let rows = database
        .query_raw(sql, &[db_name.into(), table_name.into()])
        .await
        .map_err(DescriberError::from)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Constraint> = BTreeMap::new();

    for row in rows.into_iter() {
        let name = get_string(&row, "CONSTRAINT_NAME")?;
        let raw_kind = get_string(&row, "CONSTRAINT_TYPE")?;

        let kind = match raw_kind.as_str() {
            "PRIMARY KEY" => ConstraintKind::PrimaryKey,
            "FOREIGN KEY" => ConstraintKind::ForeignKey,
            "UNIQUE" => ConstraintKind::Unique,
            // MySQL reports non-FK/PK/UNIQUE key constraints here too
            // (plain indexes surfaced as `KEY`); those are not constraints
            // in this model and are skipped.
            _ => continue,
        };

        if kind == ConstraintKind::ForeignKey && !options.include_foreign_keys {
            continue;
        }

        if !order.contains(&name) {
            order.push(name.clone());
        }

        let entry = grouped.entry(name.clone()).or_insert_with(|| Constraint {
            name: name.clone(),
            kind,
            table: table_name.to_owned(),
            schema: None,
            columns: Vec::new(),
            referenced_table: None,
            referenced_columns: if kind == ConstraintKind::ForeignKey { Some(Vec::new()) } else { None },
            properties: BTreeMap::new(),
        });

        if let Some(column) = row.get("COLUMN_NAME").and_then(|v| v.to_string()) {
            entry.columns.push(column);
        }

        if kind == ConstraintKind::ForeignKey {
            if entry.referenced_table.is_none() {
                entry.referenced_table = row.get("REFERENCED_TABLE_NAME").and_then(|v| v.to_string());
            }
            if let Some(referenced_column) = row.get("REFERENCED_COLUMN_NAME").and_then(|v| v.to_string()) {
                entry.referenced_columns.get_or_insert_with(Vec::new).push(referenced_column);
            }
        }
    }

    Ok(order.into_iter().filter_map(|name| grouped.remove(&name)).collect())
}

async fn read_views(database: &Quaint, db_name: &str) -> DescriberResult<Vec<View>> {
    let sql = "
        SELECT TABLE_NAME, VIEW_DEFINITION
        FROM information_schema.VIEWS
        WHERE TABLE_SCHEMA = ?
        ORDER BY TABLE_NAME
    ";

    let rows = database.query_raw(sql, &[db_name.into()]).await.map_err(DescriberError::from)?;
    let mut views = Vec::new();

    for row in rows.into_iter() {
        views.push(View {
            name: get_string(&row, "TABLE_NAME")?,
            schema: None,
            definition: row.get("VIEW_DEFINITION").and_then(|v| v.to_string()).unwrap_or_default(),
            properties: BTreeMap::new(),
        });
    }

    Ok(views)
}

async fn read_indexes(database: &Quaint, db_name: &str) -> DescriberResult<Vec<Index>> {
    let sql = "
        SELECT INDEX_NAME, TABLE_NAME, COLUMN_NAME, SEQ_IN_INDEX, NON_UNIQUE
        FROM information_schema.STATISTICS
        WHERE TABLE_SCHEMA = ?
        ORDER BY INDEX_NAME, SEQ_IN_INDEX
    ";

    let rows = database.query_raw(sql, &[db_name.into()]).await.map_err(DescriberError::from)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Index> = BTreeMap::new();

    for row in rows.into_iter() {
        let name = get_string(&row, "INDEX_NAME")?;
        if !order.contains(&name) {
            order.push(name.clone());
        }

        let entry = grouped.entry(name.clone()).or_insert_with(|| Index {
            name: name.clone(),
            table: String::new(),
            schema: None,
            columns: Vec::new(),
            is_unique: name == "PRIMARY",
            is_primary_key: name == "PRIMARY",
            properties: BTreeMap::new(),
        });

        entry.table = row.get("TABLE_NAME").and_then(|v| v.to_string()).unwrap_or_default();
        let non_unique = row.get("NON_UNIQUE").and_then(|v| v.as_i64()).unwrap_or(1);
        entry.is_unique = entry.is_unique || non_unique == 0;

        if let Some(column) = row.get("COLUMN_NAME").and_then(|v| v.to_string()) {
            entry.columns.push(column);
        }
    }

    Ok(order.into_iter().filter_map(|name| grouped.remove(&name)).collect())
}

fn get_string(row: &quaint::connector::ResultRow, column: &str) -> DescriberResult<String> {
    row.get(column)
        .and_then(|v| v.to_string())
        .ok_or_else(|| DescriberError::Catalog(format!("missing or non-string column '{}'", column)))
}
