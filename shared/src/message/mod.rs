//! 门店通知流事件
//!
//! 这些类型在 branch-server 与前端之间共享，用于 SSE 推送
//! 以及多实例部署时经 Redis 转发的频道消息。

use serde::{Deserialize, Serialize};

use crate::models::Notification;

pub mod payload;
pub use payload::*;

/// 每个门店回放缓冲区的上限
pub const REPLAY_CAPACITY: usize = 100;

/// SSE 流上的单个事件（`data: <json>\n\n`）
///
/// | type | 字段 |
/// |------|------|
/// | `connected` | 无，订阅后立即发送 |
/// | `heartbeat` | `timestamp` |
/// | `notification` | `notification` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected,
    Heartbeat { timestamp: i64 },
    Notification { notification: Notification },
}

impl StreamEvent {
    pub fn heartbeat(timestamp: i64) -> Self {
        Self::Heartbeat { timestamp }
    }

    pub fn notification(notification: Notification) -> Self {
        Self::Notification { notification }
    }

    /// JSON 编码（SSE data 行）
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 跨实例频道消息：门店 + 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    pub branch_id: i64,
    pub notification: Notification,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connected_frame() {
        assert_eq!(StreamEvent::Connected.to_json().unwrap(), r#"{"type":"connected"}"#);
    }

    #[test]
    fn test_heartbeat_frame() {
        let v: serde_json::Value = serde_json::from_str(&StreamEvent::heartbeat(42).to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"type": "heartbeat", "timestamp": 42}));
    }

    #[test]
    fn test_notification_frame() {
        let n = Notification {
            id: 7,
            user_id: None,
            branch_id: 3,
            title: "t".into(),
            message: "m".into(),
            notification_type: "low_stock".into(),
            data: json!({"productId": 1}),
            is_read: false,
            created_at: 1,
            updated_at: 1,
        };
        let v: serde_json::Value =
            serde_json::from_str(&StreamEvent::notification(n).to_json().unwrap()).unwrap();
        assert_eq!(v["type"], "notification");
        assert_eq!(v["notification"]["type"], "low_stock");
        assert_eq!(v["notification"]["branchId"], 3);
        assert!(v["notification"]["userId"].is_null());
    }
}
