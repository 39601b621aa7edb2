//! The closed error taxonomy. Back-ends surface their own specific errors;
//! this module only classifies and formats them for the caller.

use schema_describer::DescriberError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validate::ValidationError),

    #[error("could not connect: {0}")]
    Connection(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("could not read catalog: {0}")]
    Catalog(String),

    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<DescriberError> for CoreError {
    fn from(err: DescriberError) -> CoreError {
        match err {
            DescriberError::Connection(msg) => CoreError::Connection(msg),
            DescriberError::Permission(msg) => CoreError::Permission(msg),
            DescriberError::Catalog(msg) => CoreError::Catalog(msg),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describer_errors_convert_without_losing_their_kind() {
        assert!(matches!(CoreError::from(DescriberError::Connection("x".into())), CoreError::Connection(_)));
        assert!(matches!(CoreError::from(DescriberError::Permission("x".into())), CoreError::Permission(_)));
        assert!(matches!(CoreError::from(DescriberError::Catalog("x".into())), CoreError::Catalog(_)));
    }
}
