//! The diff model produced by [`crate::compare::compare`].

use schema_describer::{Constraint, Index, Table};
use serde::{Deserialize, Serialize};

/// The full result of comparing a source schema against a target schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaComparison {
    pub summary: DiffSummary,
    pub missing_tables: Vec<Table>,
    pub extra_tables: Vec<Table>,
    pub modified_tables: Vec<TableDiff>,
    pub missing_indexes: Vec<Index>,
    pub extra_indexes: Vec<Index>,
    pub modified_indexes: Vec<Modification<Index>>,
}

/// Aggregate counters rolled up from the comparison below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub tables_compared: usize,
    pub differences_found: usize,
    pub missing_table_count: usize,
    pub extra_table_count: usize,
    pub modified_table_count: usize,
}

/// A `(source, target, difference-list)` triple, generic over the kind of
/// object being compared (column, constraint, index).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification<T> {
    pub source: T,
    pub target: T,
    pub differences: Vec<String>,
}

/// The three-way partition of one table's columns and constraints, present
/// only for tables whose full-name exists on both sides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    pub table_name: String,
    pub missing_columns: Vec<schema_describer::Column>,
    pub extra_columns: Vec<schema_describer::Column>,
    pub modified_columns: Vec<Modification<schema_describer::Column>>,
    pub missing_constraints: Vec<Constraint>,
    pub extra_constraints: Vec<Constraint>,
    pub modified_constraints: Vec<Modification<Constraint>>,
}

impl TableDiff {
    /// A `TableDiff` is only retained by the comparator when at least one of
    /// its six partitions is non-empty.
    pub fn is_empty(&self) -> bool {
        self.missing_columns.is_empty()
            && self.extra_columns.is_empty()
            && self.modified_columns.is_empty()
            && self.missing_constraints.is_empty()
            && self.extra_constraints.is_empty()
            && self.modified_constraints.is_empty()
    }
}
