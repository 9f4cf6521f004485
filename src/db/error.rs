use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

use crate::auth::AuthError;

/// Failure kinds surfaced by every `Store` operation.
///
/// Driver errors are classified once in `From<sqlx::Error>` so callers can
/// tell a missing row from a constraint failure from a broken connection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Password hashing failed while storing or checking credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if is_constraint(db.as_ref()) => {
                Self::ConstraintViolation(db.message().to_owned())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(e),
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Database(sqlx::Error::Migrate(Box::new(e)))
    }
}

// SQLite reports the extended result code, which sqlx maps onto `ErrorKind`;
// the message check covers older builds that only return SQLITE_CONSTRAINT.
fn is_constraint(err: &dyn DatabaseError) -> bool {
    !matches!(err.kind(), ErrorKind::Other) || err.message().contains("constraint failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_a_connection_error() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn row_not_found_is_a_plain_database_error() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = StoreError::not_found("pool", 7);
        assert_eq!(err.to_string(), "pool 7 not found");
    }
}
