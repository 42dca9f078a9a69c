//! Transfer Request Model (门店调拨)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 调拨类型（目前只有拆分调拨）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum TransferType {
    #[default]
    Split,
}

/// Transfer status
///
/// | from | to |
/// |------|----|
/// | pending | approved_completed, rejected |
/// | rejected | resent |
///
/// `approved_completed` and `resent` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TransferStatus {
    Pending,
    #[serde(alias = "approved")]
    ApprovedCompleted,
    Rejected,
    Resent,
}

impl TransferStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ApprovedCompleted => "approved_completed",
            Self::Rejected => "rejected",
            Self::Resent => "resent",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" | "approved_completed" => Ok(Self::ApprovedCompleted),
            "rejected" => Ok(Self::Rejected),
            "resent" => Ok(Self::Resent),
            other => Err(format!("unknown transfer status: {other}")),
        }
    }
}

/// Transfer request entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TransferRequest {
    pub id: i64,
    pub transfer_type: TransferType,
    pub product_id: i64,
    pub source_branch_id: i64,
    pub target_branch_id: i64,
    pub quantity: i64,
    pub status: TransferStatus,
    pub notes: Option<String>,
    pub reject_reason: Option<String>,
    pub created_by: i64,
    pub approved_by: Option<i64>,
    /// Id of the rejected request this one re-submits
    pub resent_from: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create transfer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCreate {
    pub product_id: i64,
    pub source_branch_id: i64,
    pub target_branch_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
    /// Acting user
    pub user_id: i64,
}

/// Approve / resend payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAction {
    pub user_id: i64,
}

/// Reject payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReject {
    pub user_id: i64,
    pub reason: Option<String>,
}

/// List filter. `branch_id` matches either side of the transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuery {
    pub branch_id: Option<i64>,
    pub status: Option<TransferStatus>,
}
