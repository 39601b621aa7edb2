//! SQLite introspection.
//!
//! SQLite has no server-side schema/database namespace, so unlike the other
//! three back-ends every helper here takes only a table name, never a
//! schema or db name.

use crate::error::{DescriberError, DescriberResult};
use crate::model::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
use crate::options::ReadOptions;
use crate::redact;
use crate::SchemaDescriber;
use quaint::prelude::*;
use quaint::single::Quaint;
use std::collections::BTreeMap;
use tracing_futures::Instrument;

/// Introspects a SQLite database file (or `:memory:` connection).
pub struct SqliteDescriber;

#[async_trait::async_trait]
impl SchemaDescriber for SqliteDescriber {
    async fn read_schema(&self, conn: &str, options: &ReadOptions) -> DescriberResult<Schema> {
        let database = Quaint::new(conn).await.map_err(DescriberError::from)?;
        let db_name = database.connection_info().schema_name().to_owned();

        let mut schema = Schema::empty(db_name);
        schema.tables = read_tables(&database, options)
            .instrument(tracing::info_span!("ReadTables", engine = "sqlite"))
            .await?;
        schema.views = if options.include_views {
            read_views(&database).instrument(tracing::debug_span!("ReadViews")).await?
        } else {
            Vec::new()
        };
        schema.indexes = if options.include_indexes {
            read_indexes(&database, &schema.tables).instrument(tracing::debug_span!("ReadIndexes")).await?
        } else {
            Vec::new()
        };

        tracing::debug!(tables = schema.tables.len(), views = schema.views.len(), indexes = schema.indexes.len());

        Ok(schema)
    }

    async fn test_connection(&self, conn: &str) -> bool {
        Quaint::new(conn).await.is_ok()
    }

    fn display_name(&self, conn: &str) -> String {
        redact::display_name("sqlite", conn)
    }
}

async fn read_tables(database: &Quaint, options: &ReadOptions) -> DescriberResult<Vec<Table>> {
    let sql = "
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
        ORDER BY name
    ";

    tracing::debug!(sql, "querying sqlite_master");
    let rows = database.query_raw(sql, &[]).await.map_err(DescriberError::from)?;
    let mut tables = Vec::new();

    for row in rows.into_iter() {
        let table_name = get_string(&row, "name")?;

        if !options.retains_table(&table_name) {
            continue;
        }

        let columns = read_columns(database, &table_name).await?;
        let mut constraints = read_primary_key(database, &table_name).await?;

        if options.include_foreign_keys {
            constraints.extend(read_foreign_keys(database, &table_name).await?);
        }

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

async fn read_columns(database: &Quaint, table_name: &str) -> DescriberResult<Vec<Column>> {
    let sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
    let rows = database.query_raw(&sql, &[]).await.map_err(DescriberError::from)?;

    let mut columns = Vec::new();

    for row in rows.into_iter() {
        let notnull = row.get("notnull").and_then(|v| v.as_i64()).unwrap_or(0);
        let pk = row.get("pk").and_then(|v| v.as_i64()).unwrap_or(0);

        columns.push(Column {
            name: get_string(&row, "name")?,
            data_type: row.get("type").and_then(|v| v.to_string()).unwrap_or_default(),
            nullable: notnull == 0,
            default_value: row.get("dflt_value").and_then(|v| v.to_string()),
            max_length: None,
            precision: None,
            scale: None,
            is_identity: pk != 0,
            is_computed: false,
            properties: BTreeMap::new(),
        });
    }

    Ok(columns)
}

async fn read_primary_key(database: &Quaint, table_name: &str) -> DescriberResult<Vec<Constraint>> {
    let sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
    let rows = database.query_raw(&sql, &[]).await.map_err(DescriberError::from)?;

    // `pk` is the 1-based ordinal of the column within the primary key, 0 if
    // the column is not part of it; order columns by that ordinal.
    let mut members: BTreeMap<i64, String> = BTreeMap::new();

    for row in rows.into_iter() {
        let pk = row.get("pk").and_then(|v| v.as_i64()).unwrap_or(0);
        if pk > 0 {
            members.insert(pk, get_string(&row, "name")?);
        }
    }

    if members.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Constraint {
        name: format!("{}_pk", table_name),
        kind: ConstraintKind::PrimaryKey,
        table: table_name.to_owned(),
        schema: None,
        columns: members.into_values().collect(),
        referenced_table: None,
        referenced_columns: None,
        properties: BTreeMap::new(),
    }])
}

async fn read_foreign_keys(database: &Quaint, table_name: &str) -> DescriberResult<Vec<Constraint>> {
    let sql = format!("PRAGMA foreign_key_list({})", quote_identifier(table_name));
    let rows = database.query_raw(&sql, &[]).await.map_err(DescriberError::from)?;

    // Rows share an `id` per logical foreign key and are ordered by `seq`
    // within it; group by `id` to reconstruct composite foreign keys.
    let mut order: Vec<i64> = Vec::new();
    let mut grouped: BTreeMap<i64, Constraint> = BTreeMap::new();

    for row in rows.into_iter() {
        let id = row.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
        if !order.contains(&id) {
            order.push(id);
        }

        let referenced_table = row.get("table").and_then(|v| v.to_string()).unwrap_or_default();

        let entry = grouped.entry(id).or_insert_with(|| Constraint {
            name: format!("{}_fk_{}", table_name, id),
            kind: ConstraintKind::ForeignKey,
            table: table_name.to_owned(),
            schema: None,
            columns: Vec::new(),
            referenced_table: Some(referenced_table),
            referenced_columns: Some(Vec::new()),
            properties: BTreeMap::new(),
        });

        if let Some(column) = row.get("from").and_then(|v| v.to_string()) {
            entry.columns.push(column);
        }
        if let Some(referenced_column) = row.get("to").and_then(|v| v.to_string()) {
            entry.referenced_columns.get_or_insert_with(Vec::new).push(referenced_column);
        }
    }

    Ok(order.into_iter().filter_map(|id| grouped.remove(&id)).collect())
}

async fn read_views(database: &Quaint) -> DescriberResult<Vec<View>> {
    let sql = "SELECT name, sql FROM sqlite_master WHERE type = 'view' ORDER BY name";
    let rows = database.query_raw(sql, &[]).await.map_err(DescriberError::from)?;

    let mut views = Vec::new();
    for row in rows.into_iter() {
        views.push(View {
            name: get_string(&row, "name")?,
            schema: None,
            definition: row.get("sql").and_then(|v| v.to_string()).unwrap_or_default(),
            properties: BTreeMap::new(),
        });
    }

    Ok(views)
}

async fn read_indexes(database: &Quaint, tables: &[Table]) -> DescriberResult<Vec<Index>> {
    let mut indexes = Vec::new();

    for table in tables {
        let sql = format!("PRAGMA index_list({})", quote_identifier(&table.name));
        let rows = database.query_raw(&sql, &[]).await.map_err(DescriberError::from)?;

        for row in rows.into_iter() {
            let index_name = get_string(&row, "name")?;

            // Auto-generated indexes backing inline UNIQUE/PK declarations
            // are not user-named objects and are not part of this model.
            if index_name.starts_with("sqlite_autoindex_") {
                continue;
            }

            let is_unique = row.get("unique").and_then(|v| v.as_i64()).unwrap_or(0) != 0;
            let origin = row.get("origin").and_then(|v| v.to_string()).unwrap_or_default();
            let columns = read_index_columns(database, &index_name).await?;

            indexes.push(Index {
                name: index_name,
                table: table.name.clone(),
                schema: None,
                columns,
                is_unique,
                is_primary_key: origin == "pk",
                properties: BTreeMap::new(),
            });
        }
    }

    Ok(indexes)
}

async fn read_index_columns(database: &Quaint, index_name: &str) -> DescriberResult<Vec<String>> {
    let sql = format!("PRAGMA index_info({})", quote_identifier(index_name));
    let rows = database.query_raw(&sql, &[]).await.map_err(DescriberError::from)?;

    let mut by_seq: BTreeMap<i64, String> = BTreeMap::new();
    for row in rows.into_iter() {
        let seq = row.get("seqno").and_then(|v| v.as_i64()).unwrap_or(0);
        if let Some(name) = row.get("name").and_then(|v| v.to_string()) {
            by_seq.insert(seq, name);
        }
    }

    Ok(by_seq.into_values().collect())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn get_string(row: &quaint::connector::ResultRow, column: &str) -> DescriberResult<String> {
    row.get(column)
        .and_then(|v| v.to_string())
        .ok_or_else(|| DescriberError::Catalog(format!("missing or non-string column '{}'", column)))
}
