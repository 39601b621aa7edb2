//! The report payload: a structured rendering of a `SchemaComparison` for
//! external renderers. Field order matches emission order so serde's
//! declaration-order serialization satisfies the ordering contract without
//! a custom `Serialize` impl.

use chrono::{DateTime, Utc};
use schema_describer::EngineKind;
use schema_differ::{DiffSummary, Modification, SchemaComparison};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub migration_name: String,
    pub engine: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub full_name: String,
    pub column_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedTableReport {
    pub table_name: String,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub modified_columns: Vec<ModifiedField>,
    pub missing_constraints: Vec<String>,
    pub extra_constraints: Vec<String>,
    pub modified_constraints: Vec<ModifiedField>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedField {
    pub name: String,
    pub differences: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: DiffSummary,
    pub missing_tables: Vec<TableReport>,
    pub extra_tables: Vec<TableReport>,
    pub modified_tables: Vec<ModifiedTableReport>,
}

/// Build a [`Report`] from a diff. Pure, synchronous, infallible.
pub fn build(diff: &SchemaComparison, generated_at: DateTime<Utc>, migration_name: &str, engine: EngineKind) -> Report {
    Report {
        metadata: ReportMetadata {
            generated_at,
            migration_name: migration_name.to_owned(),
            engine: engine.tag().to_owned(),
        },
        summary: diff.summary,
        missing_tables: diff.missing_tables.iter().map(table_report).collect(),
        extra_tables: diff.extra_tables.iter().map(table_report).collect(),
        modified_tables: diff.modified_tables.iter().map(modified_table_report).collect(),
    }
}

fn table_report(table: &schema_describer::Table) -> TableReport {
    TableReport { full_name: table.full_name(), column_count: table.columns.len() }
}

fn modified_table_report(table_diff: &schema_differ::TableDiff) -> ModifiedTableReport {
    ModifiedTableReport {
        table_name: table_diff.table_name.clone(),
        missing_columns: table_diff.missing_columns.iter().map(|c| c.name.clone()).collect(),
        extra_columns: table_diff.extra_columns.iter().map(|c| c.name.clone()).collect(),
        modified_columns: table_diff.modified_columns.iter().map(|m| modified_field(&m.source.name, m)).collect(),
        missing_constraints: table_diff.missing_constraints.iter().map(|c| c.name.clone()).collect(),
        extra_constraints: table_diff.extra_constraints.iter().map(|c| c.name.clone()).collect(),
        modified_constraints: table_diff
            .modified_constraints
            .iter()
            .map(|m| modified_field(&m.source.name, m))
            .collect(),
    }
}

fn modified_field<T>(name: &str, modification: &Modification<T>) -> ModifiedField {
    ModifiedField { name: name.to_owned(), differences: modification.differences.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use schema_describer::{Column, Schema};
    use schema_differ::compare;
    use std::collections::BTreeMap;

    #[test]
    fn report_preserves_source_order_of_modified_tables() {
        let mut source = Schema::empty("db");
        source.tables.push(schema_describer::Table {
            name: "users".into(),
            schema: None,
            columns: vec![Column::new("id", "INTEGER", false)],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        });
        let mut target = source.clone();
        target.tables[0].columns[0].nullable = true;

        let diff = compare(&source, &target);
        let report = build(&diff, Utc.ymd(2026, 1, 1).and_hms(0, 0, 0), "m1", EngineKind::Sqlite);

        assert_eq!(report.modified_tables.len(), 1);
        assert_eq!(report.modified_tables[0].table_name, "users");
        assert_eq!(report.metadata.migration_name, "m1");
    }
}
