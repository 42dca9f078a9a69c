//! Repository Module
//!
//! Free async functions over `sqlx` executors. Functions that must join a
//! caller's transaction take `&mut SqliteConnection`; reads take any
//! [`SqliteExecutor`](sqlx::SqliteExecutor).

pub mod assignment;
pub mod branch;
pub mod inventory;
pub mod notification;
pub mod sale;
pub mod transfer;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 锁冲突 / 连接池超时 / IO，整体重试即可
    #[error("Storage busy: {0}")]
    Busy(String),
}

/// SQLite primary result codes for SQLITE_BUSY / SQLITE_LOCKED (extended
/// codes share the low byte)
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Whether the error is a transient storage condition
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => {
            let primary = db
                .code()
                .and_then(|c| c.parse::<i64>().ok())
                .map(|c| c & 0xff);
            matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
                || db.message().contains("database is locked")
        }
        _ => false,
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            return RepoError::Busy(err.to_string());
        }
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Busy(msg) => AppError::busy(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolTimedOut),
            RepoError::Busy(_)
        ));
    }

    #[test]
    fn test_busy_maps_to_503() {
        let err: AppError = RepoError::Busy("locked".into()).into();
        assert_eq!(err.code, ErrorCode::SystemBusy);
        assert_eq!(err.http_status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
