//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 2xxx: Permission errors
/// - 4xxx: Inventory errors
/// - 5xxx: Transfer errors
/// - 6xxx: Branch errors
/// - 7xxx: Notification errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Permission errors (2xxx)
    Permission,
    /// Inventory errors (4xxx)
    Inventory,
    /// Transfer errors (5xxx)
    Transfer,
    /// Branch errors (6xxx)
    Branch,
    /// Notification errors (7xxx)
    Notification,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            2000..3000 => Self::Permission,
            4000..5000 => Self::Inventory,
            5000..6000 => Self::Transfer,
            6000..7000 => Self::Branch,
            7000..8000 => Self::Notification,
            9000.. => Self::System,
            _ => Self::General,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Permission => "permission",
            Self::Inventory => "inventory",
            Self::Transfer => "transfer",
            Self::Branch => "branch",
            Self::Notification => "notification",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ranges() {
        assert_eq!(ErrorCode::ValidationFailed.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::PermissionDenied.category(), ErrorCategory::Permission);
        assert_eq!(ErrorCode::InsufficientStock.category(), ErrorCategory::Inventory);
        assert_eq!(ErrorCode::TransferNotFound.category(), ErrorCategory::Transfer);
        assert_eq!(ErrorCode::BranchNotFound.category(), ErrorCategory::Branch);
        assert_eq!(ErrorCode::NotificationNotFound.category(), ErrorCategory::Notification);
        assert_eq!(ErrorCode::SystemBusy.category(), ErrorCategory::System);
    }
}
