//! Transfer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{TransferAction, TransferCreate, TransferQuery, TransferReject, TransferRequest};

/// POST /api/transfers - 发起调拨
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransferCreate>,
) -> AppResult<Json<TransferRequest>> {
    let request = state.transfers.create_transfer_request(payload).await?;
    Ok(Json(request))
}

/// GET /api/transfers - 查询调拨单
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TransferQuery>,
) -> AppResult<Json<Vec<TransferRequest>>> {
    let requests = state.transfers.list(&query).await?;
    Ok(Json(requests))
}

/// GET /api/transfers/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TransferRequest>> {
    Ok(Json(state.transfers.get(id).await?))
}

/// POST /api/transfers/:id/approve
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransferAction>,
) -> AppResult<Json<TransferRequest>> {
    Ok(Json(state.transfers.approve(payload.user_id, id).await?))
}

/// POST /api/transfers/:id/reject
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransferReject>,
) -> AppResult<Json<TransferRequest>> {
    Ok(Json(
        state
            .transfers
            .reject(payload.user_id, id, payload.reason)
            .await?,
    ))
}

/// POST /api/transfers/:id/resend - 返回新的 pending 调拨单
pub async fn resend(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransferAction>,
) -> AppResult<Json<TransferRequest>> {
    Ok(Json(state.transfers.resend(payload.user_id, id).await?))
}
