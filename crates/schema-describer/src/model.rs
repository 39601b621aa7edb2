//! The normalized, engine-agnostic schema model.
//!
//! Every introspection back-end produces one of these; the comparator and
//! migration synthesizer never see engine-specific catalog rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A full database schema, as read from one connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The database's name.
    pub database_name: String,
    /// The schema's tables, in catalog (schema, name) order.
    pub tables: Vec<Table>,
    /// The schema's views.
    pub views: Vec<View>,
    /// The schema's indexes, flattened across all tables.
    pub indexes: Vec<Index>,
    /// Free-form metadata (engine version, read timestamp, ...).
    pub metadata: BTreeMap<String, String>,
}

impl Schema {
    /// An empty schema, useful as a builder seed in tests.
    pub fn empty(database_name: impl Into<String>) -> Schema {
        Schema {
            database_name: database_name.into(),
            tables: Vec::new(),
            views: Vec::new(),
            indexes: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Find a table by its full name.
    pub fn table(&self, full_name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.full_name() == full_name)
    }
}

/// A table (or, for SQLite, equivalently a rowid/without-rowid table).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// The table's bare name.
    pub name: String,
    /// The namespace the table lives in (`public`, `dbo`, ...); empty for
    /// engines without namespaces, such as SQLite.
    pub schema: Option<String>,
    /// The table's columns, in ordinal order.
    pub columns: Vec<Column>,
    /// The table's constraints.
    pub constraints: Vec<Constraint>,
    /// Free-form table-level properties.
    pub properties: BTreeMap<String, String>,
}

impl Table {
    /// `schema.name` when the table has a namespace, else `name`.
    pub fn full_name(&self) -> String {
        full_name(self.schema.as_deref(), &self.name)
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A column of a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name.
    pub name: String,
    /// The engine-native type spelling, e.g. `VARCHAR`, `int4`, `NVARCHAR`.
    pub data_type: String,
    /// Whether the column accepts `NULL`.
    pub nullable: bool,
    /// The raw engine-form default expression, if any.
    pub default_value: Option<String>,
    /// Declared maximum length, meaningful for string types.
    pub max_length: Option<i64>,
    /// Declared numeric precision.
    pub precision: Option<i64>,
    /// Declared numeric scale.
    pub scale: Option<i64>,
    /// Whether the column is an identity/auto-increment/serial column.
    pub is_identity: bool,
    /// Whether the column is a computed (generated) column.
    pub is_computed: bool,
    /// Free-form column-level properties.
    pub properties: BTreeMap<String, String>,
}

impl Column {
    /// Build a column with only the fields the comparator cares about set;
    /// handy for constructing literals in tests.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Column {
        Column {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            max_length: None,
            precision: None,
            scale: None,
            is_identity: false,
            is_computed: false,
            properties: BTreeMap::new(),
        }
    }

    /// The data type, uppercased, as used for type-family comparisons in
    /// the migration synthesizer (e.g. matching `VARCHAR`).
    pub fn data_type_upper(&self) -> String {
        self.data_type.to_uppercase()
    }
}

/// The closed set of constraint kinds a catalog can surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    /// `PRIMARY KEY`.
    PrimaryKey,
    /// `FOREIGN KEY`.
    ForeignKey,
    /// `UNIQUE`.
    Unique,
    /// `CHECK`.
    Check,
    /// A column default, modeled as a named constraint on engines that name
    /// them (SQL Server).
    Default,
    /// `NOT NULL`, modeled as a named constraint on engines that name it.
    NotNull,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintKind::PrimaryKey => "PrimaryKey",
            ConstraintKind::ForeignKey => "ForeignKey",
            ConstraintKind::Unique => "Unique",
            ConstraintKind::Check => "Check",
            ConstraintKind::Default => "Default",
            ConstraintKind::NotNull => "NotNull",
        };
        write!(f, "{}", s)
    }
}

/// A table-level constraint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// The kind of constraint.
    pub kind: ConstraintKind,
    /// The owning table's bare name.
    pub table: String,
    /// The owning table's namespace, if any.
    pub schema: Option<String>,
    /// The columns the constraint is defined over, in ordinal order.
    pub columns: Vec<String>,
    /// Populated iff `kind == ForeignKey`: the referenced table's name.
    pub referenced_table: Option<String>,
    /// Populated iff `kind == ForeignKey`: the referenced columns, in order.
    pub referenced_columns: Option<Vec<String>>,
    /// Free-form constraint-level properties.
    pub properties: BTreeMap<String, String>,
}

impl Constraint {
    /// `schema.name` when the owning table has a namespace, else `name`.
    pub fn full_name(&self) -> String {
        full_name(self.schema.as_deref(), &self.name)
    }
}

/// An index, possibly but not necessarily backing a primary key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Index name.
    pub name: String,
    /// The owning table's bare name.
    pub table: String,
    /// The owning table's namespace, if any.
    pub schema: Option<String>,
    /// Indexed columns, in their position within the index definition.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub is_unique: bool,
    /// Whether the index backs a primary key.
    pub is_primary_key: bool,
    /// Free-form properties, e.g. raw `Definition` text for display.
    pub properties: BTreeMap<String, String>,
}

/// A view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    /// View name.
    pub name: String,
    /// The view's namespace, if any.
    pub schema: Option<String>,
    /// The view's defining query text.
    pub definition: String,
    /// Free-form properties.
    pub properties: BTreeMap<String, String>,
}

fn full_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!("{}.{}", s, name),
        _ => name.to_string(),
    }
}
