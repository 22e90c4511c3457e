//! Metadata store error types.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Read or update targeting an aggregate that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input caught before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced row (method revision, client, employee) does not exist.
    #[error("reference error: {0}")]
    Reference(String),

    /// A data invariant rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Connectivity or other infrastructure failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MetadataError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::ForeignKeyViolation => {
                    return Self::Reference(db_err.message().to_string());
                }
                ErrorKind::UniqueViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation => {
                    return Self::Constraint(db_err.message().to_string());
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

impl From<assay_core::Error> for MetadataError {
    fn from(err: assay_core::Error) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Constraint(err.to_string())
        }
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
