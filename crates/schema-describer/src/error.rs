//! Errors surfaced by introspection back-ends.

/// Errors a [`crate::SchemaDescriber`] can raise while reading a schema.
///
/// Back-ends return the most specific variant they can; the orchestrator
/// classifies these unchanged rather than re-deriving the category from a
/// message string.
#[derive(Debug, thiserror::Error)]
pub enum DescriberError {
    /// Authentication or network failure while opening the connection.
    #[error("could not connect to the database: {0}")]
    Connection(String),

    /// The catalog query returned a row shape this back-end cannot normalize.
    #[error("unexpected catalog shape: {0}")]
    Catalog(String),

    /// The catalog query was rejected for lack of privilege.
    #[error("insufficient privilege: {0}")]
    Permission(String),
}

/// The result type used throughout introspection.
pub type DescriberResult<T> = core::result::Result<T, DescriberError>;

impl From<quaint::error::Error> for DescriberError {
    fn from(e: quaint::error::Error) -> Self {
        use quaint::error::ErrorKind;

        match e.kind() {
            ErrorKind::AuthenticationFailed { .. }
            | ErrorKind::ConnectionError(_)
            | ErrorKind::ConnectTimeout(_)
            | ErrorKind::Timeout(_)
            | ErrorKind::TlsError { .. }
            | ErrorKind::DatabaseUrlIsInvalid(_)
            | ErrorKind::DatabaseDoesNotExist { .. } => DescriberError::Connection(e.to_string()),
            ErrorKind::DatabaseAccessDenied { .. } => DescriberError::Permission(e.to_string()),
            _ => DescriberError::Catalog(e.to_string()),
        }
    }
}
