//! Transfer API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/transfers | POST | 发起调拨 |
//! | /api/transfers | GET | 按门店 / 状态查询 |
//! | /api/transfers/{id} | GET | 单个调拨单 |
//! | /api/transfers/{id}/approve | POST | 审批并移动库存 |
//! | /api/transfers/{id}/reject | POST | 驳回 |
//! | /api/transfers/{id}/resend | POST | 驳回后重新提交 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/transfers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/resend", post(handler::resend))
}
