//! Inventory API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{branch_id}/{product_id}", get(handler::get_stock))
        .route("/{branch_id}/{product_id}/min-stock", put(handler::set_min_stock))
}
