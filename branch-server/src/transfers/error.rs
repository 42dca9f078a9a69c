use crate::db::repository::RepoError;
use crate::inventory::LedgerError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Transfer workflow errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Source and target branch must differ")]
    SameBranch,

    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i64),

    #[error("User {0} has no active branch assignment")]
    NoActiveAssignment(i64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Branch {0} not found")]
    BranchNotFound(i64),

    #[error("Transfer request {0} not found")]
    TransferNotFound(i64),

    #[error("Inventory not found: product {product_id} at branch {branch_id}")]
    InventoryNotFound { product_id: i64, branch_id: i64 },

    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage busy: {0}")]
    TransientStorage(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<LedgerError> for TransferError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                available,
                requested,
            } => TransferError::InsufficientStock {
                available,
                requested,
            },
            LedgerError::NotFound {
                product_id,
                branch_id,
            } => TransferError::InventoryNotFound {
                product_id,
                branch_id,
            },
            LedgerError::Validation(msg) => TransferError::Validation(msg),
            LedgerError::TransientStorage(msg) => TransferError::TransientStorage(msg),
            LedgerError::Database(msg) => TransferError::Database(msg),
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Busy(msg) => TransferError::TransientStorage(msg),
            RepoError::Validation(msg) => TransferError::Validation(msg),
            RepoError::NotFound(msg) | RepoError::Duplicate(msg) | RepoError::Database(msg) => {
                TransferError::Database(msg)
            }
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::from(err).into()
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Validation(msg) => AppError::validation(msg),
            TransferError::SameBranch => AppError::new(ErrorCode::SameBranchTransfer),
            TransferError::InvalidQuantity(quantity) => {
                AppError::new(ErrorCode::InvalidQuantity).with_detail("quantity", quantity)
            }
            TransferError::NoActiveAssignment(user_id) => {
                AppError::new(ErrorCode::NoActiveAssignment).with_detail("userId", user_id)
            }
            TransferError::Unauthorized(msg) => AppError::permission_denied(msg),
            TransferError::BranchNotFound(id) => {
                AppError::new(ErrorCode::BranchNotFound).with_detail("branchId", id)
            }
            TransferError::TransferNotFound(id) => {
                AppError::new(ErrorCode::TransferNotFound).with_detail("transferId", id)
            }
            TransferError::InventoryNotFound {
                product_id,
                branch_id,
            } => AppError::new(ErrorCode::InventoryNotFound)
                .with_detail("productId", product_id)
                .with_detail("branchId", branch_id),
            TransferError::InsufficientStock {
                available,
                requested,
            } => AppError::insufficient_stock(available, requested),
            TransferError::Conflict(msg) => AppError::state_conflict(msg),
            TransferError::TransientStorage(msg) => AppError::busy(msg),
            TransferError::Database(msg) => AppError::database(msg),
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_http_mapping() {
        let cases = [
            (TransferError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (TransferError::SameBranch, StatusCode::BAD_REQUEST),
            (TransferError::InvalidQuantity(0), StatusCode::BAD_REQUEST),
            (TransferError::NoActiveAssignment(9), StatusCode::FORBIDDEN),
            (TransferError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (TransferError::BranchNotFound(1), StatusCode::NOT_FOUND),
            (TransferError::TransferNotFound(1), StatusCode::NOT_FOUND),
            (
                TransferError::InsufficientStock {
                    available: 1,
                    requested: 2,
                },
                StatusCode::CONFLICT,
            ),
            (TransferError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                TransferError::TransientStorage("locked".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).http_status(), status);
        }
    }

    #[test]
    fn test_domain_codes() {
        assert_eq!(AppError::from(TransferError::SameBranch).code, ErrorCode::SameBranchTransfer);
        assert_eq!(
            AppError::from(TransferError::InvalidQuantity(-1)).code,
            ErrorCode::InvalidQuantity
        );
        let app = AppError::from(TransferError::NoActiveAssignment(9));
        assert_eq!(app.code, ErrorCode::NoActiveAssignment);
        assert_eq!(app.details.unwrap()["userId"], 9);
    }

    #[test]
    fn test_ledger_error_keeps_stock_details() {
        let err: TransferError = LedgerError::InsufficientStock {
            available: 3,
            requested: 5,
        }
        .into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientStock);
        let details = app.details.unwrap();
        assert_eq!(details["available"], 3);
        assert_eq!(details["requested"], 5);
    }
}
