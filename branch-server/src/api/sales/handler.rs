//! Sale API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{SaleCreate, SaleReceipt};

/// POST /api/sales - 记录销售并扣减库存
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SaleCreate>,
) -> AppResult<Json<SaleReceipt>> {
    Ok(Json(state.sales.record_sale(payload).await?))
}
