//! Unified error handling for amityd.
//!
//! This module provides the error taxonomy surfaced by the service layer,
//! with stable error codes for metric labeling. Storage-level errors live in
//! [`crate::db::DbError`] next to sqlx; race-induced uniqueness violations
//! are re-classified here as [`CoreError::Conflict`] so callers never see a
//! raw constraint failure.

use crate::db::DbError;
use thiserror::Error;

/// Errors surfaced by the social-graph and presence services.
///
/// The first five kinds are recoverable and must stay distinct so a
/// presentation layer can map each to its own status code and message.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Unrecoverable storage failure.
    #[error("database error: {0}")]
    Db(DbError),
}

impl CoreError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState(_) => "invalid_state",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::Conflict(_) => "conflict",
            Self::Db(_) => "database_error",
        }
    }

    /// Whether the error is a client-recoverable kind (anything but `Db`).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Db(_))
    }
}

impl From<DbError> for CoreError {
    /// Storage uniqueness violations are caught at the constraint site and
    /// re-classified as `Conflict`; everything else is a storage fault.
    fn from(err: DbError) -> Self {
        match err {
            DbError::FriendshipExists(a, b) => {
                CoreError::Conflict(format!("friendship already exists between {a} and {b}"))
            }
            DbError::PendingRequestExists => {
                CoreError::Conflict("friend request already exists".to_string())
            }
            other => CoreError::Db(other),
        }
    }
}

/// Result type for service operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::NotFound("x".into()).error_code(), "not_found");
        assert_eq!(CoreError::Forbidden("x".into()).error_code(), "forbidden");
        assert_eq!(
            CoreError::InvalidState("x".into()).error_code(),
            "invalid_state"
        );
        assert_eq!(
            CoreError::InvalidOperation("x".into()).error_code(),
            "invalid_operation"
        );
        assert_eq!(CoreError::Conflict("x".into()).error_code(), "conflict");
    }

    #[test]
    fn test_unique_violations_become_conflict() {
        let err: CoreError = DbError::PendingRequestExists.into();
        assert!(matches!(err, CoreError::Conflict(_)));

        let err: CoreError = DbError::FriendshipExists(1, 2).into();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(err.is_recoverable());
    }
}
