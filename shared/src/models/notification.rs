//! Notification Model (通知)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted notification. `user_id = None` is the branch-wide row.
/// Only `is_read` ever changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub branch_id: i64,
    pub title: String,
    pub message: String,
    /// Free-form tag, e.g. `stock_split_request`
    #[serde(rename = "type")]
    pub notification_type: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub data: Value,
    pub is_read: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub user_id: i64,
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Mark-all-read payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllRequest {
    pub user_id: i64,
}

/// Unread counter response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub count: i64,
}
