//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::InventoryNotFound
            | Self::TransferNotFound
            | Self::BranchNotFound
            | Self::NotificationNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists | Self::InsufficientStock | Self::TransferStateConflict => {
                StatusCode::CONFLICT
            }

            // 403 Forbidden
            Self::PermissionDenied | Self::NoActiveAssignment => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::SameBranchTransfer
            | Self::InvalidQuantity => StatusCode::BAD_REQUEST,
        }
    }
}
