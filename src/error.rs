use core::fmt;
use miette::Diagnostic;

pub type Result<T> = core::result::Result<T, ApiError>;

/// Potential API errors
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no unique application index could be allocated after {attempts} attempts")]
    #[diagnostic(
        code(educenters::allocation_exhausted),
        help("the application was not created, the request can be retried")
    )]
    AllocationExhausted { attempts: u32 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors returned by the database layer
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StorageError {
    /// A unique constraint rejected a write, the value was taken by a concurrent transaction
    #[error("unique constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("cannot decode {column}: {message}")]
    Decode { column: String, message: String },
}

impl ApiError {
    pub fn message<T: fmt::Display>(m: T) -> ApiError {
        ApiError::Invalid(m.to_string())
    }

    pub fn not_found<T: fmt::Display>(what: T) -> ApiError {
        ApiError::NotFound(what.to_string())
    }

    /// Return true if this error is a unique constraint violation coming from the storage
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, ApiError::Storage(StorageError::ConstraintViolation(_)))
    }
}

impl StorageError {
    pub fn decode<T: fmt::Display>(column: &str, message: T) -> StorageError {
        StorageError::Decode {
            column: column.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_message_is_stable() {
        let err = ApiError::AllocationExhausted { attempts: 5 };
        assert_eq!(
            format!("{err}"),
            "no unique application index could be allocated after 5 attempts"
        );
    }

    #[test]
    fn only_constraint_violations_are_flagged() {
        let conflict: ApiError =
            StorageError::ConstraintViolation("application.app_index".into()).into();
        assert!(conflict.is_constraint_violation());

        let other: ApiError = StorageError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(!other.is_constraint_violation());
        assert!(!ApiError::not_found("application 3").is_constraint_violation());
    }
}
