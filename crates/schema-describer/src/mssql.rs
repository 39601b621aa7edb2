//! Microsoft SQL Server introspection.

use crate::error::{DescriberError, DescriberResult};
use crate::model::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
use crate::options::ReadOptions;
use crate::redact;
use crate::SchemaDescriber;
use quaint::prelude::*;
use quaint::single::Quaint;
use std::collections::BTreeMap;
use tracing_futures::Instrument;

/// Introspects a Microsoft SQL Server database.
pub struct MssqlDescriber;

#[async_trait::async_trait]
impl SchemaDescriber for MssqlDescriber {
    async fn read_schema(&self, conn: &str, options: &ReadOptions) -> DescriberResult<Schema> {
        let database = Quaint::new(conn).await.map_err(DescriberError::from)?;
        let db_name = database.connection_info().schema_name().to_owned();

        let mut schema = Schema::empty(db_name);
        schema.tables = read_tables(&database, options)
            .instrument(tracing::info_span!("ReadTables", engine = "mssql"))
            .await?;

        schema.views = if options.include_views {
            read_views(&database).instrument(tracing::debug_span!("ReadViews")).await?
        } else {
            Vec::new()
        };
        schema.indexes = if options.include_indexes {
            read_indexes(&database).instrument(tracing::debug_span!("ReadIndexes")).await?
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
        redact::display_name("sqlserver", conn)
    }
}

async fn read_tables(database: &Quaint, options: &ReadOptions) -> DescriberResult<Vec<Table>> {
    let sql = "
        SELECT s.name AS schema_name, t.name AS table_name
        FROM sys.tables t
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        ORDER BY s.name, t.name
    ";

    tracing::debug!(sql, "querying sys.tables");
    let rows = database.query_raw(sql, &[]).await.map_err(DescriberError::from)?;
    let mut tables = Vec::new();

    for row in rows.into_iter() {
        let schema_name = get_string(&row, "schema_name")?;
        let table_name = get_string(&row, "table_name")?;

        if !options.retains_schema(&schema_name) {
            continue;
        }

        let full_name = format!("{}.{}", schema_name, table_name);
        if !options.retains_table(&full_name) {
            continue;
        }

        let columns = read_columns(database, &schema_name, &table_name).await?;
        let constraints = read_constraints(database, &schema_name, &table_name, options).await?;

        tables.push(Table {
            name: table_name,
            schema: Some(schema_name),
            columns,
            constraints,
            properties: BTreeMap::new(),
        });
    }

    Ok(tables)
}

async fn read_columns(database: &Quaint, schema_name: &str, table_name: &str) -> DescriberResult<Vec<Column>> {
    let sql = "
        SELECT c.name AS column_name, ty.name AS data_type, c.is_nullable,
               dc.definition AS default_value, c.max_length, c.precision, c.scale,
               c.is_identity, c.is_computed
        FROM sys.columns c
        JOIN sys.tables t ON t.object_id = c.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.types ty ON ty.user_type_id = c.user_type_id
        LEFT JOIN sys.default_constraints dc ON dc.parent_object_id = c.object_id AND dc.parent_column_id = c.column_id
        WHERE s.name = @P1 AND t.name = @P2
        ORDER BY c.column_id
    ";

    let rows = database
        .query_raw(sql, &[schema_name.into(), table_name.into()])
        .await
        .map_err(DescriberError::from)?;

    let mut columns = Vec::new();

    for row in rows.into_iter() {
        // `character_maximum_length`-equivalent `max_length` is in bytes for
        // (n)varchar on the wire; nvarchar stores 2 bytes/char, so halve it
        // for the unicode types the way SQL Server's own tooling reports.
        let data_type = get_string(&row, "data_type")?;
        let raw_max_length = row.get("max_length").and_then(|v| v.as_i64());
        let max_length = match (data_type.to_lowercase().as_str(), raw_max_length) {
            ("nvarchar", Some(n)) if n > 0 => Some(n / 2),
            (_, Some(n)) if n > 0 => Some(n),
            _ => None,
        };

        columns.push(Column {
            name: get_string(&row, "column_name")?,
            data_type,
            nullable: row.get("is_nullable").and_then(|v| v.as_bool()).unwrap_or(true),
            default_value: row.get("default_value").and_then(|v| v.to_string()),
            max_length,
            precision: row.get("precision").and_then(|v| v.as_i64()),
            scale: row.get("scale").and_then(|v| v.as_i64()),
            is_identity: row.get("is_identity").and_then(|v| v.as_bool()).unwrap_or(false),
            is_computed: row.get("is_computed").and_then(|v| v.as_bool()).unwrap_or(false),
            properties: BTreeMap::new(),
        });
    }

    Ok(columns)
}

async fn read_constraints(
    database: &Quaint,
    schema_name: &str,
    table_name: &str,
    options: &ReadOptions,
) -> DescriberResult<Vec<Constraint>> {
    let sql = "
        SELECT kc.name AS constraint_name, kc.type AS constraint_type, c.name AS column_name, ic.key_ordinal
        FROM sys.key_constraints kc
        JOIN sys.tables t ON t.object_id = kc.parent_object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.index_columns ic ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
        JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE s.name = @P1 AND t.name = @P2
        ORDER BY kc.name, ic.key_ordinal
    ";

    let rows = database
        .query_raw(sql, &[schema_name.into(), table_name.into()])
        .await
        .map_err(DescriberError::from)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Constraint> = BTreeMap::new();

    for row in rows.into_iter() {
        let name = get_string(&row, "constraint_name")?;
        let raw_kind = get_string(&row, "constraint_type")?;

        let kind = match raw_kind.trim() {
            "PK" => ConstraintKind::PrimaryKey,
            "UQ" => ConstraintKind::Unique,
            other => {
                return Err(DescriberError::Catalog(format!(
                    "unrecognized key constraint type '{}' on {}.{}",
                    other, schema_name, table_name
                )))
            }
        };

        if !order.contains(&name) {
            order.push(name.clone());
        }

        let entry = grouped.entry(name.clone()).or_insert_with(|| Constraint {
            name: name.clone(),
            kind,
            table: table_name.to_owned(),
            schema: Some(schema_name.to_owned()),
            columns: Vec::new(),
            referenced_table: None,
            referenced_columns: None,
            properties: BTreeMap::new(),
        });

        if let Some(column) = row.get("column_name").and_then(|v| v.to_string()) {
            entry.columns.push(column);
        }
    }

    let mut constraints: Vec<Constraint> = order.into_iter().filter_map(|name| grouped.remove(&name)).collect();

    if options.include_foreign_keys {
        constraints.extend(read_foreign_keys(database, schema_name, table_name).await?);
    }

    Ok(constraints)
}

async fn read_foreign_keys(database: &Quaint, schema_name: &str, table_name: &str) -> DescriberResult<Vec<Constraint>> {
    let sql = "
        SELECT fk.name AS constraint_name, c.name AS column_name, rt.name AS referenced_table,
               rc.name AS referenced_column, fkc.constraint_column_id
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables t ON t.object_id = fk.parent_object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.columns c ON c.object_id = fkc.parent_object_id AND c.column_id = fkc.parent_column_id
        JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id
        JOIN sys.columns rc ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
        WHERE s.name = @P1 AND t.name = @P2
        ORDER BY fk.name, fkc.constraint_column_id
    ";

    let rows = database
        .query_raw(sql, &[schema_name.into(), table_name.into()])
        .await
        .map_err(DescriberError::from)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Constraint> = BTreeMap::new();

    for row in rows.into_iter() {
        let name = get_string(&row, "constraint_name")?;
        if !order.contains(&name) {
            order.push(name.clone());
        }

        let entry = grouped.entry(name.clone()).or_insert_with(|| Constraint {
            name: name.clone(),
            kind: ConstraintKind::ForeignKey,
            table: table_name.to_owned(),
            schema: Some(schema_name.to_owned()),
            columns: Vec::new(),
            referenced_table: row.get("referenced_table").and_then(|v| v.to_string()),
            referenced_columns: Some(Vec::new()),
            properties: BTreeMap::new(),
        });

        if let Some(column) = row.get("column_name").and_then(|v| v.to_string()) {
            entry.columns.push(column);
        }
        if let Some(referenced_column) = row.get("referenced_column").and_then(|v| v.to_string()) {
            entry.referenced_columns.get_or_insert_with(Vec::new).push(referenced_column);
        }
    }

    Ok(order.into_iter().filter_map(|name| grouped.remove(&name)).collect())
}

async fn read_views(database: &Quaint) -> DescriberResult<Vec<View>> {
    let sql = "
        SELECT s.name AS schema_name, v.name AS view_name, m.definition
        FROM sys.views v
        JOIN sys.schemas s ON s.schema_id = v.schema_id
        JOIN sys.sql_modules m ON m.object_id = v.object_id
        ORDER BY s.name, v.name
    ";

    let rows = database.query_raw(sql, &[]).await.map_err(DescriberError::from)?;
    let mut views = Vec::new();

    for row in rows.into_iter() {
        views.push(View {
            name: get_string(&row, "view_name")?,
            schema: Some(get_string(&row, "schema_name")?),
            definition: row.get("definition").and_then(|v| v.to_string()).unwrap_or_default(),
            properties: BTreeMap::new(),
        });
    }

    Ok(views)
}

async fn read_indexes(database: &Quaint) -> DescriberResult<Vec<Index>> {
    let sql = "
        SELECT i.name AS index_name, t.name AS table_name, s.name AS schema_name,
               c.name AS column_name, ic.key_ordinal, i.is_unique, i.is_primary_key
        FROM sys.indexes i
        JOIN sys.tables t ON t.object_id = i.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE i.name IS NOT NULL
        ORDER BY i.name, ic.key_ordinal
    ";

    let rows = database.query_raw(sql, &[]).await.map_err(DescriberError::from)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Index> = BTreeMap::new();

    for row in rows.into_iter() {
        let name = get_string(&row, "index_name")?;
        if !order.contains(&name) {
            order.push(name.clone());
        }

        let entry = grouped.entry(name.clone()).or_insert_with(|| Index {
            name: name.clone(),
            table: String::new(),
            schema: None,
            columns: Vec::new(),
            is_unique: false,
            is_primary_key: false,
            properties: BTreeMap::new(),
        });

        entry.table = row.get("table_name").and_then(|v| v.to_string()).unwrap_or_default();
        entry.schema = row.get("schema_name").and_then(|v| v.to_string());
        entry.is_unique = row.get("is_unique").and_then(|v| v.as_bool()).unwrap_or(false);
        entry.is_primary_key = row.get("is_primary_key").and_then(|v| v.as_bool()).unwrap_or(false);

        if let Some(column) = row.get("column_name").and_then(|v| v.to_string()) {
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
