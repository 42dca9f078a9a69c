//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
};
use futures::{Stream, StreamExt, future};
use serde::Deserialize;
use std::convert::Infallible;

use crate::core::ServerState;
use crate::db::repository::RepoError;
use crate::utils::validation::MAX_RECENT_LIMIT;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::message::StreamEvent;
use shared::models::{Notification, NotificationQuery, ReadAllRequest, UnreadCount};

const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadQuery {
    pub user_id: i64,
    pub branch_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: i64,
}

/// GET /api/notifications/stream/:branch_id - SSE
///
/// 首个事件为 `connected`；客户端断开时 Subscription 被 drop，自动注销。
/// 服务关闭时流主动结束，并立即注销连接。
pub async fn stream(
    State(state): State<ServerState>,
    Path(branch_id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.registry.subscribe(branch_id);
    let handle = subscription.handle();
    tracing::info!(
        branch_id,
        connection_id = handle.connection_id,
        "Notification stream opened"
    );

    let shutdown = state.shutdown.clone();
    let events = futures::stream::unfold(Some(subscription), move |slot| {
        let shutdown = shutdown.clone();
        async move {
            let mut subscription = slot?;
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                event = subscription.recv() => event,
            };
            // None: subscription is dropped here, which unregisters it
            next.map(|event| (event, Some(subscription)))
        }
    })
    .filter_map(|event| future::ready(sse_event(&event).map(Ok::<_, Infallible>)));
    Sse::new(events)
}

/// Encode one frame; events that fail to encode are logged and skipped
fn sse_event(event: &StreamEvent) -> Option<Event> {
    match event.to_json() {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unencodable stream event");
            None
        }
    }
}

/// GET /api/notifications/recent/:branch_id?limit=N - 最新在前
pub async fn recent(
    State(state): State<ServerState>,
    Path(branch_id): Path<i64>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let items = state
        .channel
        .recent(branch_id, limit)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(items))
}

/// GET /api/notifications?userId&branchId&unreadOnly
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.store.list(&query).await?))
}

/// GET /api/notifications/unread-count?userId
pub async fn unread_count(
    State(state): State<ServerState>,
    Query(query): Query<UnreadQuery>,
) -> AppResult<Json<UnreadCount>> {
    let count = state
        .store
        .unread_count(query.user_id, query.branch_id)
        .await?;
    Ok(Json(UnreadCount { count }))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MarkReadRequest>,
) -> AppResult<Json<Notification>> {
    match state.store.mark_read(id, payload.user_id).await {
        Ok(n) => Ok(Json(n)),
        Err(RepoError::NotFound(_)) => {
            Err(AppError::new(ErrorCode::NotificationNotFound).with_detail("notificationId", id))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/notifications/read-all - 返回更新条数
pub async fn mark_all_read(
    State(state): State<ServerState>,
    Json(payload): Json<ReadAllRequest>,
) -> AppResult<Json<u64>> {
    Ok(Json(state.store.mark_all_read(payload.user_id).await?))
}
