//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`transfers`] - 调拨单接口
//! - [`inventory`] - 库存读取与安全库存
//! - [`sales`] - 销售扣减
//! - [`notifications`] - 通知流、回放、已读跟踪

pub mod health;
pub mod inventory;
pub mod notifications;
pub mod sales;
pub mod transfers;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::middleware::logging_middleware;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build the Axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(transfers::router())
        .merge(inventory::router())
        .merge(sales::router())
        .merge(notifications::router())
}

/// Router with state and the Tower HTTP middleware stack
///
/// `Router::layer` wraps what came before, so the last layer runs first.
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .with_state(state)
        // CORS - innermost, sees the uncompressed body
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        // Request ID - outermost, so logging and tracing see it
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
