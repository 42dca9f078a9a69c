use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Inventory not found: product {product_id} at branch {branch_id}")]
    NotFound { product_id: i64, branch_id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage busy: {0}")]
    TransientStorage(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepoError> for LedgerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Busy(msg) => LedgerError::TransientStorage(msg),
            RepoError::Validation(msg) => LedgerError::Validation(msg),
            RepoError::NotFound(msg) | RepoError::Duplicate(msg) | RepoError::Database(msg) => {
                LedgerError::Database(msg)
            }
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::from(err).into()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                available,
                requested,
            } => AppError::insufficient_stock(available, requested),
            LedgerError::NotFound {
                product_id,
                branch_id,
            } => AppError::new(ErrorCode::InventoryNotFound)
                .with_detail("productId", product_id)
                .with_detail("branchId", branch_id),
            LedgerError::Validation(msg) => AppError::validation(msg),
            LedgerError::TransientStorage(msg) => AppError::busy(msg),
            LedgerError::Database(msg) => AppError::database(msg),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
