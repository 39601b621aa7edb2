//! The pure comparison algorithm. No I/O, no fallibility: by the time a
//! [`Schema`] reaches here it has already passed validation.

use crate::model::{DiffSummary, Modification, SchemaComparison, TableDiff};
use rayon::prelude::*;
use schema_describer::{Column, Constraint, Index, Schema, Table};
use std::collections::BTreeMap;

/// Tables above this count are diffed with `rayon`'s `par_iter` instead of a
/// plain sequential loop. Below it, thread pool dispatch overhead would
/// outweigh the benefit.
const PARALLEL_THRESHOLD: usize = 32;

/// Compare a source schema against a target schema.
///
/// Both arguments are assumed valid per the schema validation gate; this
/// function never fails.
#[tracing::instrument(skip(source, target), fields(source_tables = source.tables.len(), target_tables = target.tables.len()))]
pub fn compare(source: &Schema, target: &Schema) -> SchemaComparison {
    let source_tables: BTreeMap<String, &Table> = source.tables.iter().map(|t| (t.full_name(), t)).collect();
    let target_tables: BTreeMap<String, &Table> = target.tables.iter().map(|t| (t.full_name(), t)).collect();

    let missing_tables: Vec<Table> = source
        .tables
        .iter()
        .filter(|t| !target_tables.contains_key(&t.full_name()))
        .cloned()
        .collect();

    let extra_tables: Vec<Table> = target
        .tables
        .iter()
        .filter(|t| !source_tables.contains_key(&t.full_name()))
        .cloned()
        .collect();

    let common_names: Vec<&String> = source_tables
        .keys()
        .filter(|name| target_tables.contains_key(*name))
        .collect();

    let table_diffs: Vec<(String, TableDiff)> = if common_names.len() >= PARALLEL_THRESHOLD {
        common_names
            .par_iter()
            .map(|name| {
                let src = source_tables[*name];
                let tgt = target_tables[*name];
                ((*name).clone(), diff_table(src, tgt))
            })
            .collect()
    } else {
        common_names
            .iter()
            .map(|name| {
                let src = source_tables[*name];
                let tgt = target_tables[*name];
                ((*name).clone(), diff_table(src, tgt))
            })
            .collect()
    };

    // The parallel section above may schedule work in any order; re-key and
    // re-walk in source-iteration order so the emitted list is identical
    // regardless of whether the sequential or parallel path ran.
    let table_diffs_by_name: BTreeMap<String, TableDiff> = table_diffs.into_iter().collect();
    let modified_tables: Vec<TableDiff> = source
        .tables
        .iter()
        .filter_map(|t| table_diffs_by_name.get(&t.full_name()))
        .filter(|d| !d.is_empty())
        .cloned()
        .collect();

    let (missing_indexes, extra_indexes, modified_indexes) = diff_indexes(source, target);

    tracing::debug!(
        missing_tables = missing_tables.len(),
        extra_tables = extra_tables.len(),
        modified_tables = modified_tables.len(),
        "comparison complete"
    );

    let summary = DiffSummary {
        tables_compared: source.tables.len() + target.tables.len(),
        differences_found: missing_tables.len() + extra_tables.len() + modified_tables.len(),
        missing_table_count: missing_tables.len(),
        extra_table_count: extra_tables.len(),
        modified_table_count: modified_tables.len(),
    };

    SchemaComparison {
        summary,
        missing_tables,
        extra_tables,
        modified_tables,
        missing_indexes,
        extra_indexes,
        modified_indexes,
    }
}

fn diff_table(src: &Table, tgt: &Table) -> TableDiff {
    let source_columns: BTreeMap<&str, &Column> = src.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let target_columns: BTreeMap<&str, &Column> = tgt.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let missing_columns: Vec<Column> = src
        .columns
        .iter()
        .filter(|c| !target_columns.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let extra_columns: Vec<Column> = tgt
        .columns
        .iter()
        .filter(|c| !source_columns.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let modified_columns: Vec<Modification<Column>> = src
        .columns
        .iter()
        .filter_map(|s| target_columns.get(s.name.as_str()).map(|t| (s, *t)))
        .filter_map(|(s, t)| {
            let differences = column_differences(s, t);
            if differences.is_empty() {
                None
            } else {
                Some(Modification { source: s.clone(), target: t.clone(), differences })
            }
        })
        .collect();

    let source_constraints: BTreeMap<&str, &Constraint> =
        src.constraints.iter().map(|c| (c.name.as_str(), c)).collect();
    let target_constraints: BTreeMap<&str, &Constraint> =
        tgt.constraints.iter().map(|c| (c.name.as_str(), c)).collect();

    let missing_constraints: Vec<Constraint> = src
        .constraints
        .iter()
        .filter(|c| !target_constraints.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let extra_constraints: Vec<Constraint> = tgt
        .constraints
        .iter()
        .filter(|c| !source_constraints.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let modified_constraints: Vec<Modification<Constraint>> = src
        .constraints
        .iter()
        .filter_map(|s| target_constraints.get(s.name.as_str()).map(|t| (s, *t)))
        .filter_map(|(s, t)| {
            let differences = constraint_differences(s, t);
            if differences.is_empty() {
                None
            } else {
                Some(Modification { source: s.clone(), target: t.clone(), differences })
            }
        })
        .collect();

    TableDiff {
        table_name: src.full_name(),
        missing_columns,
        extra_columns,
        modified_columns,
        missing_constraints,
        extra_constraints,
        modified_constraints,
    }
}

fn diff_indexes(source: &Schema, target: &Schema) -> (Vec<Index>, Vec<Index>, Vec<Modification<Index>>) {
    let source_indexes: BTreeMap<&str, &Index> = source.indexes.iter().map(|i| (i.name.as_str(), i)).collect();
    let target_indexes: BTreeMap<&str, &Index> = target.indexes.iter().map(|i| (i.name.as_str(), i)).collect();

    let missing: Vec<Index> = source
        .indexes
        .iter()
        .filter(|i| !target_indexes.contains_key(i.name.as_str()))
        .cloned()
        .collect();

    let extra: Vec<Index> = target
        .indexes
        .iter()
        .filter(|i| !source_indexes.contains_key(i.name.as_str()))
        .cloned()
        .collect();

    let modified: Vec<Modification<Index>> = source
        .indexes
        .iter()
        .filter_map(|s| target_indexes.get(s.name.as_str()).map(|t| (s, *t)))
        .filter_map(|(s, t)| {
            let differences = index_differences(s, t);
            if differences.is_empty() {
                None
            } else {
                Some(Modification { source: s.clone(), target: t.clone(), differences })
            }
        })
        .collect();

    (missing, extra, modified)
}

/// Column-level differences, in the fixed predicate order the contract pins.
fn column_differences(src: &Column, tgt: &Column) -> Vec<String> {
    let mut differences = Vec::new();

    if src.data_type != tgt.data_type {
        differences.push(changed("DataType", &src.data_type, &tgt.data_type));
    }
    if src.nullable != tgt.nullable {
        differences.push(changed("IsNullable", &src.nullable, &tgt.nullable));
    }
    if !defaults_equal(src.default_value.as_deref(), tgt.default_value.as_deref()) {
        differences.push(changed("DefaultValue", &display_opt(&src.default_value), &display_opt(&tgt.default_value)));
    }
    if src.max_length != tgt.max_length {
        differences.push(changed("MaxLength", &display_opt_i64(src.max_length), &display_opt_i64(tgt.max_length)));
    }
    if src.precision != tgt.precision {
        differences.push(changed("Precision", &display_opt_i64(src.precision), &display_opt_i64(tgt.precision)));
    }
    if src.scale != tgt.scale {
        differences.push(changed("Scale", &display_opt_i64(src.scale), &display_opt_i64(tgt.scale)));
    }
    if src.is_identity != tgt.is_identity {
        differences.push(changed("IsIdentity", &src.is_identity, &tgt.is_identity));
    }

    differences
}

/// Index-level differences, in the fixed predicate order the contract pins.
fn index_differences(src: &Index, tgt: &Index) -> Vec<String> {
    let mut differences = Vec::new();

    if src.table != tgt.table {
        differences.push(changed("TableName", &src.table, &tgt.table));
    }
    if src.columns != tgt.columns {
        differences.push(changed("Columns", &src.columns.join(", "), &tgt.columns.join(", ")));
    }
    if src.is_unique != tgt.is_unique {
        differences.push(changed("IsUnique", &src.is_unique, &tgt.is_unique));
    }
    if src.is_primary_key != tgt.is_primary_key {
        differences.push(changed("IsPrimaryKey", &src.is_primary_key, &tgt.is_primary_key));
    }

    differences
}

/// Constraint-level differences, in the fixed predicate order the contract pins.
fn constraint_differences(src: &Constraint, tgt: &Constraint) -> Vec<String> {
    let mut differences = Vec::new();

    if src.kind != tgt.kind {
        differences.push(changed("Type", &src.kind, &tgt.kind));
    }
    if src.columns != tgt.columns {
        differences.push(changed("Columns", &src.columns.join(", "), &tgt.columns.join(", ")));
    }
    if src.referenced_table != tgt.referenced_table {
        differences.push(changed("ReferencedTable", &display_opt(&src.referenced_table), &display_opt(&tgt.referenced_table)));
    }
    if src.referenced_columns.is_some()
        && tgt.referenced_columns.is_some()
        && src.referenced_columns != tgt.referenced_columns
    {
        differences.push(changed(
            "ReferencedColumns",
            &display_opt_vec(&src.referenced_columns),
            &display_opt_vec(&tgt.referenced_columns),
        ));
    }

    differences
}

fn changed(field: &str, src: &dyn std::fmt::Display, tgt: &dyn std::fmt::Display) -> String {
    format!("{} changed from {} to {}", field, src, tgt)
}

fn display_opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn display_opt_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn display_opt_vec(value: &Option<Vec<String>>) -> String {
    value.as_ref().map(|v| v.join(", ")).unwrap_or_default()
}

/// Null and empty-string default values are treated as equal.
fn defaults_equal(src: Option<&str>, tgt: Option<&str>) -> bool {
    src.unwrap_or("") == tgt.unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_describer::Table;
    use std::collections::BTreeMap;

    fn users_table(name_type: &str, name_len: Option<i64>) -> Table {
        Table {
            name: "users".into(),
            schema: None,
            columns: vec![
                Column::new("id", "INTEGER", false),
                Column { max_length: name_len, ..Column::new("name", name_type, false) },
            ],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    fn schema_with(table: Table) -> Schema {
        let mut schema = Schema::empty("db");
        schema.tables.push(table);
        schema
    }

    #[test]
    fn identity_diff_is_empty() {
        let schema = schema_with(users_table("VARCHAR", Some(100)));
        let diff = compare(&schema, &schema);
        assert_eq!(diff.summary.differences_found, 0);
        assert!(diff.missing_tables.is_empty());
        assert!(diff.extra_tables.is_empty());
        assert!(diff.modified_tables.is_empty());
    }

    #[test]
    fn widened_column_is_reported_with_ordered_predicates() {
        let source = schema_with(users_table("VARCHAR", Some(100)));
        let target = schema_with(users_table("VARCHAR", Some(120)));

        let diff = compare(&source, &target);
        assert_eq!(diff.modified_tables.len(), 1);
        let table_diff = &diff.modified_tables[0];
        assert_eq!(table_diff.modified_columns.len(), 1);
        assert_eq!(table_diff.modified_columns[0].differences, vec!["MaxLength changed from 100 to 120"]);
    }

    #[test]
    fn symmetry_of_extras_and_missings() {
        let mut source = Schema::empty("db");
        source.tables.push(users_table("VARCHAR", Some(100)));

        let target = Schema::empty("db");

        let forward = compare(&source, &target);
        let backward = compare(&target, &source);

        let forward_missing: Vec<String> = forward.missing_tables.iter().map(|t| t.full_name()).collect();
        let backward_extra: Vec<String> = backward.extra_tables.iter().map(|t| t.full_name()).collect();
        assert_eq!(forward_missing, backward_extra);
    }

    #[test]
    fn null_and_empty_default_are_treated_as_equal() {
        let mut source_table = users_table("VARCHAR", Some(100));
        source_table.columns[1].default_value = None;
        let mut target_table = users_table("VARCHAR", Some(100));
        target_table.columns[1].default_value = Some(String::new());

        let diff = compare(&schema_with(source_table), &schema_with(target_table));
        assert!(diff.modified_tables.is_empty());
    }
}
