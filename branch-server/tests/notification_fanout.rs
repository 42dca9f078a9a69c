//! 通知扇出：落库行数、单次发布、已读跟踪、回放预热

mod common;

use branch_server::core::{Config, ServerState};
use branch_server::notifications::Notifier;
use common::{assign, seed_branch, test_env};
use shared::message::{NotificationPayload, StreamEvent};
use shared::models::{BranchType, NotificationQuery, Role};
use std::time::Duration;

async fn count_rows(state: &ServerState, branch_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notification WHERE branch_id = ?")
        .bind(branch_id)
        .fetch_one(&state.pool)
        .await
        .unwrap()
}

fn payload() -> NotificationPayload {
    NotificationPayload::split_request(1, 501, 10, 4)
}

#[tokio::test]
async fn test_three_roles_produce_four_rows() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    assign(&state.pool, 11, sub.id, Role::Admin).await;
    assign(&state.pool, 12, sub.id, Role::Staff).await;
    assign(&state.pool, 13, sub.id, Role::Manager).await;
    assign(&state.pool, 14, sub.id, Role::Cashier).await;

    let recipients = state
        .broker
        .try_notify_branch_roles(sub.id, &[Role::Admin, Role::Staff, Role::Manager], &payload())
        .await
        .unwrap();
    assert_eq!(recipients, 3);
    assert_eq!(count_rows(state, sub.id).await, 4);

    let branch_wide: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification WHERE branch_id = ? AND user_id IS NULL",
    )
    .bind(sub.id)
    .fetch_one(&state.pool)
    .await
    .unwrap();
    assert_eq!(branch_wide, 1);
}

#[tokio::test]
async fn test_user_with_two_roles_gets_one_row() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    assign(&state.pool, 21, sub.id, Role::Admin).await;
    assign(&state.pool, 21, sub.id, Role::Staff).await;

    let recipients = state
        .broker
        .try_notify_branch_roles(sub.id, &[Role::Admin, Role::Staff, Role::Manager], &payload())
        .await
        .unwrap();
    assert_eq!(recipients, 1);
    assert_eq!(count_rows(state, sub.id).await, 2);
}

#[tokio::test]
async fn test_large_fanout_keeps_every_row() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    for user in 100..160 {
        assign(&state.pool, user, sub.id, Role::Staff).await;
    }

    for _ in 0..50 {
        let recipients = state
            .broker
            .try_notify_branch_roles(sub.id, &[Role::Staff], &payload())
            .await
            .unwrap();
        assert_eq!(recipients, 60);
    }
    assert_eq!(count_rows(state, sub.id).await, 50 * 61);
}

#[tokio::test]
async fn test_publish_happens_once_per_call() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    for user in 31..36 {
        assign(&state.pool, user, sub.id, Role::Staff).await;
    }

    let mut subscription = state.registry.subscribe(sub.id);
    assert_eq!(subscription.recv().await, Some(StreamEvent::Connected));

    state
        .broker
        .notify_branch_roles(sub.id, &[Role::Staff], payload())
        .await;

    match subscription.recv().await {
        Some(StreamEvent::Notification { notification }) => {
            assert_eq!(notification.user_id, None);
            assert_eq!(notification.notification_type, "stock_split_request");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    let next = tokio::time::timeout(Duration::from_millis(100), subscription.recv()).await;
    assert!(next.is_err(), "only one broadcast expected");

    let recent = state.channel.recent(sub.id, 100).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn test_read_tracking() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    assign(&state.pool, 41, sub.id, Role::Manager).await;
    assign(&state.pool, 42, sub.id, Role::Manager).await;

    state
        .broker
        .try_notify_branch_roles(sub.id, &[Role::Manager], &payload())
        .await
        .unwrap();
    state
        .broker
        .try_notify_user(41, sub.id, &NotificationPayload::low_stock(501, sub.id, 2, 5))
        .await
        .unwrap();

    // 41: 两条个人通知 + 一条门店通知；门店取自其分配
    let query = NotificationQuery {
        user_id: 41,
        branch_id: None,
        unread_only: true,
    };
    let visible = state.store.list(&query).await.unwrap();
    assert_eq!(visible.len(), 3);
    assert_eq!(state.store.unread_count(41, None).await.unwrap(), 3);

    let personal = visible.iter().find(|n| n.user_id == Some(41)).unwrap();
    let read = state.store.mark_read(personal.id, 41).await.unwrap();
    assert!(read.is_read);
    assert_eq!(state.store.unread_count(41, None).await.unwrap(), 2);

    // 别人的个人通知不可标记
    assert!(state.store.mark_read(personal.id, 42).await.is_err());

    let updated = state.store.mark_all_read(41).await.unwrap();
    assert_eq!(updated, 1);
    assert!(state.store.list(&query).await.unwrap().iter().all(|n| n.user_id.is_none()));
}

#[tokio::test]
async fn test_delivery_failure_is_swallowed() {
    let env = test_env().await;
    let state = &env.state;
    let sub = seed_branch(&state.pool, "Sub", BranchType::Sub).await;
    assign(&state.pool, 51, sub.id, Role::Admin).await;

    state.pool.close().await;
    // 只记录日志，不 panic 也不返回错误
    state
        .broker
        .notify_branch_roles(sub.id, &[Role::Admin], payload())
        .await;
    assert!(state.channel.recent(sub.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replay_buffer_warms_up_after_restart() {
    let env = test_env().await;
    let sub = seed_branch(&env.state.pool, "Sub", BranchType::Sub).await;
    assign(&env.state.pool, 61, sub.id, Role::Admin).await;
    for _ in 0..3 {
        env.state
            .broker
            .try_notify_branch_roles(sub.id, &[Role::Admin], &payload())
            .await
            .unwrap();
    }

    let config = Config::with_work_dir(env.dir.path().to_string_lossy().to_string());
    let restarted = ServerState::initialize(&config).await.unwrap();
    let recent = restarted.channel.recent(sub.id, 100).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|n| n.user_id.is_none()));
    assert!(recent.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}
