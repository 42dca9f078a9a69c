//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{InventoryRecord, MinStockUpdate};

/// GET /api/inventory/:branch_id/:product_id
///
/// 没有记录时返回数量为 0 的空记录，不会创建。
pub async fn get_stock(
    State(state): State<ServerState>,
    Path((branch_id, product_id)): Path<(i64, i64)>,
) -> AppResult<Json<InventoryRecord>> {
    let record = state
        .ledger
        .find(product_id, branch_id)
        .await?
        .unwrap_or_else(|| InventoryRecord::empty(product_id, branch_id, 0));
    Ok(Json(record))
}

/// PUT /api/inventory/:branch_id/:product_id/min-stock
pub async fn set_min_stock(
    State(state): State<ServerState>,
    Path((branch_id, product_id)): Path<(i64, i64)>,
    Json(payload): Json<MinStockUpdate>,
) -> AppResult<Json<InventoryRecord>> {
    let record = state
        .ledger
        .set_min_stock(product_id, branch_id, payload.min_stock)
        .await?;
    Ok(Json(record))
}
