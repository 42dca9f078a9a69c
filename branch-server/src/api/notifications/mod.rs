//! Notification API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/notifications/stream/{branch_id} | GET | SSE 实时流 |
//! | /api/notifications/recent/{branch_id} | GET | 回放缓冲 (轮询降级) |
//! | /api/notifications | GET | 已持久化通知 |
//! | /api/notifications/unread-count | GET | 未读数 |
//! | /api/notifications/{id}/read | POST | 标记已读 |
//! | /api/notifications/read-all | POST | 全部已读 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/stream/{branch_id}", get(handler::stream))
        .route("/recent/{branch_id}", get(handler::recent))
        .route("/unread-count", get(handler::unread_count))
        .route("/read-all", post(handler::mark_all_read))
        .route("/{id}/read", post(handler::mark_read))
}
