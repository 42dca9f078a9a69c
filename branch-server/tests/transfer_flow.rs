//! 调拨单完整流程：创建 / 审批 / 驳回 / 重新提交

mod common;

use branch_server::inventory::InventoryLedger;
use branch_server::transfers::{TransferError, TransferManager};
use common::{Recorded, RecordingNotifier, assign, assign_main_admin, seed_branch, test_env};
use shared::message::NotificationKind;
use shared::models::{BranchType, Role, TransferCreate, TransferQuery, TransferStatus};
use std::sync::Arc;

const PRODUCT: i64 = 501;
const MAIN_ADMIN: i64 = 1;
const SUB_MANAGER: i64 = 2;
const CASHIER: i64 = 3;

struct Fixture {
    env: common::TestEnv,
    manager: TransferManager,
    ledger: Arc<InventoryLedger>,
    notifier: Arc<RecordingNotifier>,
    main_id: i64,
    sub_id: i64,
}

async fn fixture(main_stock: i64) -> Fixture {
    let env = test_env().await;
    let pool = env.state.pool.clone();
    let main = seed_branch(&pool, "Main", BranchType::Main).await;
    let sub = seed_branch(&pool, "Sub", BranchType::Sub).await;
    assign_main_admin(&pool, MAIN_ADMIN, main.id).await;
    assign(&pool, SUB_MANAGER, sub.id, Role::Manager).await;
    assign(&pool, CASHIER, main.id, Role::Cashier).await;

    let ledger = Arc::new(InventoryLedger::new(pool.clone()));
    if main_stock > 0 {
        ledger.adjust(PRODUCT, main.id, main_stock).await.unwrap();
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = TransferManager::new(pool, ledger.clone(), notifier.clone());
    Fixture {
        env,
        manager,
        ledger,
        notifier,
        main_id: main.id,
        sub_id: sub.id,
    }
}

fn request(user_id: i64, source: i64, target: i64, quantity: i64) -> TransferCreate {
    TransferCreate {
        product_id: PRODUCT,
        source_branch_id: source,
        target_branch_id: target,
        quantity,
        notes: Some("weekend restock".into()),
        user_id,
    }
}

#[tokio::test]
async fn test_main_to_sub_create_notifies_target_once() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 4))
        .await
        .unwrap();

    assert_eq!(created.status, TransferStatus::Pending);
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 10);
    assert_eq!(
        f.notifier.calls(),
        vec![Recorded::BranchRoles {
            branch_id: f.sub_id,
            roles: vec![Role::Admin, Role::Staff, Role::Manager],
            kind: NotificationKind::StockSplitRequest,
        }]
    );
}

#[tokio::test]
async fn test_sub_to_main_create_does_not_notify() {
    let f = fixture(0).await;
    f.ledger.adjust(PRODUCT, f.sub_id, 6).await.unwrap();

    f.manager
        .create_transfer_request(request(MAIN_ADMIN, f.sub_id, f.main_id, 2))
        .await
        .unwrap();
    assert!(f.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_create_over_stock_is_rejected_without_row() {
    let f = fixture(3).await;
    let err = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientStock {
            available: 3,
            requested: 5
        }
    ));
    assert!(f.manager.list(&TransferQuery::default()).await.unwrap().is_empty());
    assert!(f.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_create_preconditions() {
    let f = fixture(0).await;

    let err = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InventoryNotFound { .. }));

    let err = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.main_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::SameBranch));

    let err = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidQuantity(0)));

    let err = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, 999_999, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::BranchNotFound(999_999)));
}

#[tokio::test]
async fn test_cashier_and_unknown_users_cannot_initiate() {
    let f = fixture(10).await;
    let err = f
        .manager
        .create_transfer_request(request(CASHIER, f.main_id, f.sub_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Unauthorized(_)));

    let err = f
        .manager
        .create_transfer_request(request(4242, f.main_id, f.sub_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NoActiveAssignment(4242)));
}

#[tokio::test]
async fn test_approve_moves_stock_once() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 4))
        .await
        .unwrap();

    // 分店经理在目标门店审批
    let approved = f.manager.approve(SUB_MANAGER, created.id).await.unwrap();
    assert_eq!(approved.status, TransferStatus::ApprovedCompleted);
    assert_eq!(approved.approved_by, Some(SUB_MANAGER));
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 6);
    assert_eq!(f.ledger.get(PRODUCT, f.sub_id).await.unwrap(), 4);

    for _ in 0..2 {
        let err = f.manager.approve(SUB_MANAGER, created.id).await.unwrap_err();
        assert!(matches!(err, TransferError::Conflict(_)));
    }
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 6);
    assert_eq!(f.ledger.get(PRODUCT, f.sub_id).await.unwrap(), 4);
    assert_eq!(f.notifier.count_kind(NotificationKind::StockSplitApproved), 1);
}

#[tokio::test]
async fn test_concurrent_approvals_move_stock_once() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 4))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        f.manager.approve(SUB_MANAGER, created.id),
        f.manager.approve(MAIN_ADMIN, created.id)
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 6);
    assert_eq!(f.ledger.get(PRODUCT, f.sub_id).await.unwrap(), 4);
}

#[tokio::test]
async fn test_manager_at_source_cannot_approve() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 4))
        .await
        .unwrap();

    let pool = f.env.state.pool.clone();
    common::assign(&pool, 7, f.main_id, Role::Manager).await;

    let err = f.manager.approve(7, created.id).await.unwrap_err();
    assert!(matches!(err, TransferError::Unauthorized(_)));
    assert_eq!(
        f.manager.get(created.id).await.unwrap().status,
        TransferStatus::Pending
    );
}

#[tokio::test]
async fn test_approve_with_drained_source_rolls_back() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 8))
        .await
        .unwrap();

    // 审批前源门店库存被卖掉
    f.ledger.adjust(PRODUCT, f.main_id, -5).await.unwrap();

    let err = f.manager.approve(SUB_MANAGER, created.id).await.unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientStock {
            available: 5,
            requested: 8
        }
    ));
    let still = f.manager.get(created.id).await.unwrap();
    assert_eq!(still.status, TransferStatus::Pending);
    assert_eq!(still.approved_by, None);
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 5);
    assert!(f.ledger.find(PRODUCT, f.sub_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_approve_crossing_min_stock_sends_low_stock() {
    let f = fixture(10).await;
    f.ledger.set_min_stock(PRODUCT, f.main_id, 5).await.unwrap();

    let first = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 3))
        .await
        .unwrap();
    f.manager.approve(SUB_MANAGER, first.id).await.unwrap();
    assert_eq!(f.notifier.count_kind(NotificationKind::LowStock), 0);

    let second = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 3))
        .await
        .unwrap();
    f.manager.approve(SUB_MANAGER, second.id).await.unwrap();
    assert_eq!(f.notifier.count_kind(NotificationKind::LowStock), 1);
    assert!(f.notifier.calls().contains(&Recorded::BranchRoles {
        branch_id: f.main_id,
        roles: vec![Role::Admin, Role::Manager],
        kind: NotificationKind::LowStock,
    }));
}

#[tokio::test]
async fn test_reject_then_resend() {
    let f = fixture(10).await;
    let created = f
        .manager
        .create_transfer_request(request(MAIN_ADMIN, f.main_id, f.sub_id, 4))
        .await
        .unwrap();

    let rejected = f
        .manager
        .reject(SUB_MANAGER, created.id, Some("no shelf space".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, TransferStatus::Rejected);
    assert_eq!(rejected.reject_reason.as_deref(), Some("no shelf space"));
    assert_eq!(f.ledger.get(PRODUCT, f.main_id).await.unwrap(), 10);
    assert_eq!(f.notifier.count_kind(NotificationKind::StockSplitRejected), 1);

    let err = f.manager.approve(SUB_MANAGER, created.id).await.unwrap_err();
    assert!(matches!(err, TransferError::Conflict(_)));

    let resent = f.manager.resend(MAIN_ADMIN, created.id).await.unwrap();
    assert_ne!(resent.id, created.id);
    assert_eq!(resent.status, TransferStatus::Pending);
    assert_eq!(resent.resent_from, Some(created.id));
    assert_eq!(resent.quantity, 4);
    assert_eq!(
        f.manager.get(created.id).await.unwrap().status,
        TransferStatus::Resent
    );
    assert_eq!(f.notifier.count_kind(NotificationKind::StockSplitResent), 1);

    let err = f.manager.resend(MAIN_ADMIN, created.id).await.unwrap_err();
    assert!(matches!(err, TransferError::Conflict(_)));

    let pending = f
        .manager
        .list(&TransferQuery {
            branch_id: Some(f.sub_id),
            status: Some(TransferStatus::Pending),
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, resent.id);
}

#[tokio::test]
async fn test_missing_request_is_not_found() {
    let f = fixture(0).await;
    let err = f.manager.approve(MAIN_ADMIN, 12345).await.unwrap_err();
    assert!(matches!(err, TransferError::TransferNotFound(12345)));
}
