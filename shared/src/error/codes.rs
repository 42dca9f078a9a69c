//! Unified error codes for the branch back office
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Inventory errors
//! - 5xxx: Transfer errors
//! - 6xxx: Branch errors
//! - 7xxx: Notification errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16`; 成功响应不带错误码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// User has no active branch assignment
    NoActiveAssignment = 2002,

    // ==================== 4xxx: Inventory ====================
    /// No inventory record for (product, branch)
    InventoryNotFound = 4001,
    /// Adjustment would drive stock below zero
    InsufficientStock = 4002,

    // ==================== 5xxx: Transfer ====================
    /// Transfer request not found
    TransferNotFound = 5001,
    /// Transfer request is not in the state the operation requires
    TransferStateConflict = 5002,
    /// Source and target branch are the same
    SameBranchTransfer = 5003,
    /// Transfer quantity must be positive
    InvalidQuantity = 5004,

    // ==================== 6xxx: Branch ====================
    /// Branch not found
    BranchNotFound = 6001,

    // ==================== 7xxx: Notification ====================
    /// Notification not found
    NotificationNotFound = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// System busy (lock contention, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::NoActiveAssignment => "User has no active branch assignment",

            // Inventory
            ErrorCode::InventoryNotFound => "Inventory record not found",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Transfer
            ErrorCode::TransferNotFound => "Transfer request not found",
            ErrorCode::TransferStateConflict => "Transfer request is not in the required state",
            ErrorCode::SameBranchTransfer => "Source and target branch must differ",
            ErrorCode::InvalidQuantity => "Quantity must be greater than zero",

            // Branch
            ErrorCode::BranchNotFound => "Branch not found",

            // Notification
            ErrorCode::NotificationNotFound => "Notification not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::NoActiveAssignment),

            // Inventory
            4001 => Ok(ErrorCode::InventoryNotFound),
            4002 => Ok(ErrorCode::InsufficientStock),

            // Transfer
            5001 => Ok(ErrorCode::TransferNotFound),
            5002 => Ok(ErrorCode::TransferStateConflict),
            5003 => Ok(ErrorCode::SameBranchTransfer),
            5004 => Ok(ErrorCode::InvalidQuantity),

            // Branch
            6001 => Ok(ErrorCode::BranchNotFound),

            // Notification
            7001 => Ok(ErrorCode::NotificationNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_codes() {
        let codes = [
            ErrorCode::ValidationFailed,
            ErrorCode::PermissionDenied,
            ErrorCode::InsufficientStock,
            ErrorCode::TransferStateConflict,
            ErrorCode::BranchNotFound,
            ErrorCode::NotificationNotFound,
            ErrorCode::SystemBusy,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_value_rejected() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "4002");
        let back: ErrorCode = serde_json::from_str("5002").unwrap();
        assert_eq!(back, ErrorCode::TransferStateConflict);
    }

    #[test]
    fn test_domain_codes_roundtrip() {
        for code in [
            ErrorCode::SameBranchTransfer,
            ErrorCode::InvalidQuantity,
            ErrorCode::NoActiveAssignment,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }
}
