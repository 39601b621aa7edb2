#![deny(rust_2018_idioms, unsafe_code)]

//! Normalized schema model and engine-specific catalog introspection.
//!
//! This crate owns the engine-agnostic [`Schema`] model and the four
//! catalog-introspection back-ends that populate it. Nothing in here
//! knows how to compare two schemas or synthesize DDL; that is
//! `schema-differ`'s job.

pub mod defaults;
pub mod error;
pub mod model;
pub mod mssql;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod redact;
pub mod sqlite;

pub use error::{DescriberError, DescriberResult};
pub use model::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
pub use options::ReadOptions;

/// A database description connector. Implemented once per engine; the
/// orchestrator never branches on the engine itself, only on which
/// `&dyn SchemaDescriber` it was handed.
#[async_trait::async_trait]
pub trait SchemaDescriber: Send + Sync {
    /// Open one connection, run the catalog queries, and return a fully
    /// populated [`Schema`]. The connection is released on every exit path.
    async fn read_schema(&self, conn: &str, options: &ReadOptions) -> DescriberResult<Schema>;

    /// Attempt connect-and-close. Never raises; only returns success.
    async fn test_connection(&self, conn: &str) -> bool;

    /// A safe display form of `conn` with credentials redacted.
    fn display_name(&self, conn: &str) -> String;
}

/// The four supported engine families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// PostgreSQL and PostgreSQL-compatible engines.
    Postgres,
    /// MySQL and MySQL-compatible engines (MariaDB).
    MySql,
    /// Microsoft SQL Server.
    SqlServer,
    /// SQLite.
    Sqlite,
}

impl EngineKind {
    /// Parse the `--type` CLI value.
    pub fn parse(tag: &str) -> Option<EngineKind> {
        match tag {
            "postgres" | "postgresql" => Some(EngineKind::Postgres),
            "mysql" => Some(EngineKind::MySql),
            "sqlserver" | "mssql" => Some(EngineKind::SqlServer),
            "sqlite" => Some(EngineKind::Sqlite),
            _ => None,
        }
    }

    /// The canonical tag used in headers and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::MySql => "mysql",
            EngineKind::SqlServer => "sqlserver",
            EngineKind::Sqlite => "sqlite",
        }
    }

    /// The back-end implementing [`SchemaDescriber`] for this engine.
    pub fn describer(&self) -> &'static dyn SchemaDescriber {
        match self {
            EngineKind::Postgres => &postgres::PostgresDescriber,
            EngineKind::MySql => &mysql::MysqlDescriber,
            EngineKind::SqlServer => &mssql::MssqlDescriber,
            EngineKind::Sqlite => &sqlite::SqliteDescriber,
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!(EngineKind::parse("postgres"), Some(EngineKind::Postgres));
        assert_eq!(EngineKind::parse("mysql"), Some(EngineKind::MySql));
        assert_eq!(EngineKind::parse("sqlserver"), Some(EngineKind::SqlServer));
        assert_eq!(EngineKind::parse("sqlite"), Some(EngineKind::Sqlite));
        assert_eq!(EngineKind::parse("oracle"), None);
    }

    #[test]
    fn dispatch_is_static_no_branching_at_call_site() {
        for engine in [EngineKind::Postgres, EngineKind::MySql, EngineKind::SqlServer, EngineKind::Sqlite] {
            let describer = engine.describer();
            assert_eq!(describer.display_name("not a url"), format!("{}://***", engine.tag()));
        }
    }
}
