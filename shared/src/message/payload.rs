use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

// ==================== Notification Kind ====================

/// 通知类型标签（持久化为 `notification.notification_type`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// 总店向分店发起拆分调拨
    StockSplitRequest,
    /// 调拨已批准并完成库存移动
    StockSplitApproved,
    /// 调拨被拒绝
    StockSplitRejected,
    /// 被拒绝的调拨重新提交
    StockSplitResent,
    /// 库存降至最低库存线
    LowStock,
}

impl NotificationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StockSplitRequest => "stock_split_request",
            Self::StockSplitApproved => "stock_split_approved",
            Self::StockSplitRejected => "stock_split_rejected",
            Self::StockSplitResent => "stock_split_resent",
            Self::LowStock => "low_stock",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Notification Payload ====================

/// 业务层交给 broker 的通知内容（尚未落库）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Opaque JSON stored verbatim
    pub data: Value,
}

impl NotificationPayload {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// 调拨请求通知
    pub fn split_request(transfer_id: i64, product_id: i64, source: i64, quantity: i64) -> Self {
        Self::new(
            NotificationKind::StockSplitRequest,
            "Stock split request",
            format!("Branch {source} requests to split {quantity} unit(s) of product {product_id}"),
        )
        .with_data(json!({
            "transferId": transfer_id,
            "productId": product_id,
            "sourceBranchId": source,
            "quantity": quantity,
        }))
    }

    /// 重新提交的调拨请求通知
    pub fn split_resent(transfer_id: i64, resent_from: i64, product_id: i64, source: i64, quantity: i64) -> Self {
        Self::new(
            NotificationKind::StockSplitResent,
            "Stock split request resent",
            format!("Branch {source} resent a split of {quantity} unit(s) of product {product_id}"),
        )
        .with_data(json!({
            "transferId": transfer_id,
            "resentFrom": resent_from,
            "productId": product_id,
            "sourceBranchId": source,
            "quantity": quantity,
        }))
    }

    /// 调拨批准通知
    pub fn split_approved(transfer_id: i64, product_id: i64, target: i64, quantity: i64) -> Self {
        Self::new(
            NotificationKind::StockSplitApproved,
            "Stock split approved",
            format!("{quantity} unit(s) of product {product_id} moved to branch {target}"),
        )
        .with_data(json!({
            "transferId": transfer_id,
            "productId": product_id,
            "targetBranchId": target,
            "quantity": quantity,
        }))
    }

    /// 调拨拒绝通知
    pub fn split_rejected(transfer_id: i64, product_id: i64, reason: Option<&str>) -> Self {
        let message = match reason {
            Some(r) => format!("Split of product {product_id} was rejected: {r}"),
            None => format!("Split of product {product_id} was rejected"),
        };
        Self::new(NotificationKind::StockSplitRejected, "Stock split rejected", message).with_data(
            json!({
                "transferId": transfer_id,
                "productId": product_id,
                "reason": reason,
            }),
        )
    }

    /// 低库存预警
    pub fn low_stock(product_id: i64, branch_id: i64, quantity: i64, min_stock: i64) -> Self {
        Self::new(
            NotificationKind::LowStock,
            "Low stock",
            format!("Product {product_id} is down to {quantity} (minimum {min_stock})"),
        )
        .with_data(json!({
            "productId": product_id,
            "branchId": branch_id,
            "quantity": quantity,
            "minStock": min_stock,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(NotificationKind::StockSplitRequest.as_str(), "stock_split_request");
        assert_eq!(
            serde_json::to_string(&NotificationKind::LowStock).unwrap(),
            "\"low_stock\""
        );
    }

    #[test]
    fn test_rejected_without_reason() {
        let p = NotificationPayload::split_rejected(1, 2, None);
        assert_eq!(p.kind, NotificationKind::StockSplitRejected);
        assert!(p.data["reason"].is_null());
    }
}
