use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors raised by the storage layer.
///
/// Statement failures on the read path are not errors; the query gateway
/// reports them as [`crate::QueryOutcome::Failure`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),
    #[error("constraint violation in '{table}': {message}")]
    ConstraintViolation { table: String, message: String },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Classify an error raised while writing rows of `table`.
    pub(crate) fn from_write(table: &str, err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            return Self::Unreachable(err);
        }
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return Self::ConstraintViolation {
                    table: table.to_string(),
                    message: db_err.message().to_string(),
                };
            }
        }
        Self::Db(err)
    }

    /// Classify an error raised by schema or transaction bookkeeping.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            Self::Unreachable(err)
        } else {
            Self::Db(err)
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Errors that mean the database itself is gone, not that a statement failed.
pub(crate) fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_unreachable() {
        assert!(StoreError::from_sqlx(sqlx::Error::PoolClosed).is_unreachable());
        assert!(StoreError::from_write("customers", sqlx::Error::PoolTimedOut).is_unreachable());
        assert!(!StoreError::from_sqlx(sqlx::Error::RowNotFound).is_unreachable());
    }
}
