//! Boundary validation for CLI inputs, performed before any I/O.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_CONNECTION_STRING_LEN: usize = 2000;

static SAFE_MIGRATION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("compile regex"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("connection string must not be empty")]
    EmptyConnectionString,

    #[error("connection string exceeds {max} characters", max = MAX_CONNECTION_STRING_LEN)]
    ConnectionStringTooLong,

    #[error("migration name must not be empty")]
    EmptyMigrationName,

    #[error("migration name contains characters unsafe for a file path")]
    UnsafeMigrationName,

    #[error("unknown engine type '{0}'")]
    UnknownEngineType(String),
}

pub fn validate_connection_string(conn: &str) -> Result<(), BoundaryError> {
    if conn.is_empty() {
        return Err(BoundaryError::EmptyConnectionString);
    }
    if conn.len() > MAX_CONNECTION_STRING_LEN {
        return Err(BoundaryError::ConnectionStringTooLong);
    }
    Ok(())
}

pub fn validate_migration_name(name: &str) -> Result<(), BoundaryError> {
    if name.is_empty() {
        return Err(BoundaryError::EmptyMigrationName);
    }
    if !SAFE_MIGRATION_NAME.is_match(name) {
        return Err(BoundaryError::UnsafeMigrationName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_connection_strings() {
        let conn = "x".repeat(2001);
        assert_eq!(validate_connection_string(&conn), Err(BoundaryError::ConnectionStringTooLong));
    }

    #[test]
    fn accepts_connection_string_at_the_limit() {
        let conn = "x".repeat(2000);
        assert!(validate_connection_string(&conn).is_ok());
    }

    #[test]
    fn rejects_path_unsafe_migration_names() {
        assert_eq!(validate_migration_name("../evil"), Err(BoundaryError::UnsafeMigrationName));
        assert_eq!(validate_migration_name("a/b"), Err(BoundaryError::UnsafeMigrationName));
    }

    #[test]
    fn accepts_safe_migration_names() {
        assert!(validate_migration_name("schema_migration_20260101_000000").is_ok());
    }
}
