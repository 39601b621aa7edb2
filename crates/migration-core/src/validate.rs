//! The schema validation gate. Runs once per schema, before either side
//! reaches the comparator.

use schema_describer::Schema;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("database name must not be empty")]
    EmptyDatabaseName,

    #[error("table name must not be empty")]
    EmptyTableName,

    #[error("table '{table}' has a column with an empty name")]
    EmptyColumnName { table: String },

    #[error("column '{table}.{column}' has an empty data type")]
    EmptyDataType { table: String, column: String },
}

/// Validate a single schema. Both schemas must pass before either reaches
/// the comparator.
pub fn validate(schema: &Schema) -> Result<(), ValidationError> {
    if schema.database_name.trim().is_empty() {
        return Err(ValidationError::EmptyDatabaseName);
    }

    for table in &schema.tables {
        if table.name.trim().is_empty() {
            return Err(ValidationError::EmptyTableName);
        }

        for column in &table.columns {
            if column.name.trim().is_empty() {
                return Err(ValidationError::EmptyColumnName { table: table.full_name() });
            }
            if column.data_type.trim().is_empty() {
                return Err(ValidationError::EmptyDataType { table: table.full_name(), column: column.name.clone() });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_describer::Column;
    use std::collections::BTreeMap;

    #[test]
    fn empty_database_name_is_rejected() {
        let schema = Schema::empty("");
        assert_eq!(validate(&schema), Err(ValidationError::EmptyDatabaseName));
    }

    #[test]
    fn well_formed_schema_passes() {
        let mut schema = Schema::empty("db");
        schema.tables.push(schema_describer::Table {
            name: "users".into(),
            schema: None,
            columns: vec![Column::new("id", "INTEGER", false)],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        });
        assert!(validate(&schema).is_ok());
    }

    #[test]
    fn empty_data_type_is_rejected() {
        let mut schema = Schema::empty("db");
        schema.tables.push(schema_describer::Table {
            name: "users".into(),
            schema: None,
            columns: vec![Column::new("id", "", false)],
            constraints: Vec::new(),
            properties: BTreeMap::new(),
        });
        assert_eq!(
            validate(&schema),
            Err(ValidationError::EmptyDataType { table: "users".into(), column: "id".into() })
        );
    }
}
