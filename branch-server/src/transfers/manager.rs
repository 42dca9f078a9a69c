//! TransferManager - 调拨单状态机
//!
//! ```text
//! pending ──approve──▶ approved_completed
//!    │
//!    └──reject──▶ rejected ──resend──▶ resent
//!                                        │
//!                        (新 pending 行, resent_from 指向旧行)
//! ```
//!
//! 审批在同一事务内完成状态更新和库存移动；库存不足时整体回滚，单据保持 `pending`。
//! 通知在提交之后发出，失败不影响业务结果。

use super::error::{TransferError, TransferResult};
use crate::auth::{self, Action, Actor, Decision};
use crate::db::repository::{branch, transfer as repo};
use crate::inventory::InventoryLedger;
use crate::notifications::{LOW_STOCK_ROLES, Notifier, SPLIT_OUTCOME_ROLES, SPLIT_REQUEST_ROLES};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::message::NotificationPayload;
use shared::models::{Branch, BranchType, TransferCreate, TransferQuery, TransferRequest, TransferStatus, TransferType};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct TransferManager {
    pool: SqlitePool,
    ledger: Arc<InventoryLedger>,
    notifier: Arc<dyn Notifier>,
}

/// Only main → sub requests alert the receiving branch
fn notifies_target(source: &Branch, target: &Branch) -> bool {
    source.branch_type == BranchType::Main && target.branch_type == BranchType::Sub
}

fn require(decision: Decision, user_id: i64) -> TransferResult<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Unassigned => Err(TransferError::NoActiveAssignment(user_id)),
        Decision::Deny(reason) => Err(TransferError::Unauthorized(reason.to_string())),
    }
}

impl TransferManager {
    pub fn new(pool: SqlitePool, ledger: Arc<InventoryLedger>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            ledger,
            notifier,
        }
    }

    pub async fn get(&self, request_id: i64) -> TransferResult<TransferRequest> {
        repo::find_by_id(&self.pool, request_id)
            .await?
            .ok_or(TransferError::TransferNotFound(request_id))
    }

    pub async fn list(&self, query: &TransferQuery) -> TransferResult<Vec<TransferRequest>> {
        Ok(repo::list(&self.pool, query).await?)
    }

    async fn actor(&self, user_id: i64) -> TransferResult<Option<Actor>> {
        Ok(auth::resolve_actor(&self.pool, user_id).await?)
    }

    async fn branch(&self, branch_id: i64) -> TransferResult<Branch> {
        branch::find_by_id(&self.pool, branch_id)
            .await?
            .ok_or(TransferError::BranchNotFound(branch_id))
    }

    /// Shared create/resend preconditions. Returns (source, target) branches.
    async fn check_initiation(
        &self,
        user_id: i64,
        product_id: i64,
        source_id: i64,
        target_id: i64,
        quantity: i64,
    ) -> TransferResult<(Branch, Branch)> {
        if source_id == target_id {
            return Err(TransferError::SameBranch);
        }
        if quantity <= 0 {
            return Err(TransferError::InvalidQuantity(quantity));
        }

        let source = self.branch(source_id).await?;
        let target = self.branch(target_id).await?;

        let actor = self.actor(user_id).await?;
        require(
            auth::authorize(actor.as_ref(), Action::InitiateTransfer, source_id, target_id),
            user_id,
        )?;

        let record = self
            .ledger
            .find(product_id, source_id)
            .await?
            .ok_or(TransferError::InventoryNotFound {
                product_id,
                branch_id: source_id,
            })?;
        if record.quantity < quantity {
            return Err(TransferError::InsufficientStock {
                available: record.quantity,
                requested: quantity,
            });
        }
        Ok((source, target))
    }

    /// Persist a new `pending` request. Inventory is not touched until approval.
    pub async fn create_transfer_request(&self, data: TransferCreate) -> TransferResult<TransferRequest> {
        validate_optional_text(data.notes.as_deref(), "notes", MAX_NOTE_LEN)
            .map_err(TransferError::Validation)?;

        let (source, target) = self
            .check_initiation(
                data.user_id,
                data.product_id,
                data.source_branch_id,
                data.target_branch_id,
                data.quantity,
            )
            .await?;

        let now = shared::util::now_millis();
        let request = TransferRequest {
            id: shared::util::snowflake_id(),
            transfer_type: TransferType::Split,
            product_id: data.product_id,
            source_branch_id: data.source_branch_id,
            target_branch_id: data.target_branch_id,
            quantity: data.quantity,
            status: TransferStatus::Pending,
            notes: data.notes,
            reject_reason: None,
            created_by: data.user_id,
            approved_by: None,
            resent_from: None,
            created_at: now,
            updated_at: now,
        };
        repo::insert(&self.pool, &request).await?;

        tracing::info!(
            transfer_id = request.id,
            product_id = request.product_id,
            source = request.source_branch_id,
            target = request.target_branch_id,
            quantity = request.quantity,
            "Transfer request created"
        );

        if notifies_target(&source, &target) {
            self.notifier
                .notify_branch_roles(
                    target.id,
                    SPLIT_REQUEST_ROLES,
                    NotificationPayload::split_request(
                        request.id,
                        request.product_id,
                        source.id,
                        request.quantity,
                    ),
                )
                .await;
        }
        Ok(request)
    }

    /// `pending → approved_completed` plus the stock move, one transaction
    pub async fn approve(&self, user_id: i64, request_id: i64) -> TransferResult<TransferRequest> {
        let request = self.get(request_id).await?;
        if request.status != TransferStatus::Pending {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is {}, expected pending",
                request.status.as_str()
            )));
        }
        let actor = self.actor(user_id).await?;
        require(
            auth::authorize(
                actor.as_ref(),
                Action::ApproveTransfer,
                request.source_branch_id,
                request.target_branch_id,
            ),
            user_id,
        )?;

        let guard = self
            .ledger
            .lock_keys(&[
                (request.product_id, request.source_branch_id),
                (request.product_id, request.target_branch_id),
            ])
            .await;

        let mut tx = self.pool.begin().await?;
        let now = shared::util::now_millis();
        if !repo::mark_approved(&mut *tx, request_id, user_id, now).await? {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is no longer pending"
            )));
        }
        let outcome = InventoryLedger::apply_move(
            &mut *tx,
            request.product_id,
            request.source_branch_id,
            request.target_branch_id,
            request.quantity,
        )
        .await?;
        let approved = repo::find_by_id(&mut *tx, request_id)
            .await?
            .ok_or(TransferError::TransferNotFound(request_id))?;
        tx.commit().await?;
        drop(guard);

        tracing::info!(
            transfer_id = request_id,
            approved_by = user_id,
            source_remaining = outcome.source.current,
            target_quantity = outcome.target.current,
            "Transfer request approved"
        );

        self.notifier
            .notify_branch_roles(
                approved.source_branch_id,
                SPLIT_OUTCOME_ROLES,
                NotificationPayload::split_approved(
                    approved.id,
                    approved.product_id,
                    approved.target_branch_id,
                    approved.quantity,
                ),
            )
            .await;

        if outcome.source.crossed_min_stock() {
            self.notifier
                .notify_branch_roles(
                    outcome.source.branch_id,
                    LOW_STOCK_ROLES,
                    NotificationPayload::low_stock(
                        outcome.source.product_id,
                        outcome.source.branch_id,
                        outcome.source.current,
                        outcome.source.min_stock,
                    ),
                )
                .await;
        }
        Ok(approved)
    }

    /// `pending → rejected`, no inventory effect
    pub async fn reject(&self, user_id: i64, request_id: i64, reason: Option<String>) -> TransferResult<TransferRequest> {
        validate_optional_text(reason.as_deref(), "reason", MAX_NOTE_LEN)
            .map_err(TransferError::Validation)?;

        let request = self.get(request_id).await?;
        if request.status != TransferStatus::Pending {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is {}, expected pending",
                request.status.as_str()
            )));
        }
        let actor = self.actor(user_id).await?;
        require(
            auth::authorize(
                actor.as_ref(),
                Action::ApproveTransfer,
                request.source_branch_id,
                request.target_branch_id,
            ),
            user_id,
        )?;

        let now = shared::util::now_millis();
        if !repo::mark_rejected(&self.pool, request_id, reason.as_deref(), now).await? {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is no longer pending"
            )));
        }
        let rejected = self.get(request_id).await?;

        tracing::info!(transfer_id = request_id, rejected_by = user_id, "Transfer request rejected");

        self.notifier
            .notify_branch_roles(
                rejected.source_branch_id,
                SPLIT_OUTCOME_ROLES,
                NotificationPayload::split_rejected(rejected.id, rejected.product_id, reason.as_deref()),
            )
            .await;
        Ok(rejected)
    }

    /// `rejected → resent`; returns the new `pending` request
    pub async fn resend(&self, user_id: i64, request_id: i64) -> TransferResult<TransferRequest> {
        let previous = self.get(request_id).await?;
        if previous.status != TransferStatus::Rejected {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is {}, expected rejected",
                previous.status.as_str()
            )));
        }

        let (source, target) = self
            .check_initiation(
                user_id,
                previous.product_id,
                previous.source_branch_id,
                previous.target_branch_id,
                previous.quantity,
            )
            .await?;

        let now = shared::util::now_millis();
        let request = TransferRequest {
            id: shared::util::snowflake_id(),
            status: TransferStatus::Pending,
            reject_reason: None,
            created_by: user_id,
            approved_by: None,
            resent_from: Some(previous.id),
            created_at: now,
            updated_at: now,
            ..previous.clone()
        };

        let mut tx = self.pool.begin().await?;
        if !repo::mark_resent(&mut *tx, request_id, now).await? {
            return Err(TransferError::Conflict(format!(
                "transfer {request_id} is no longer rejected"
            )));
        }
        repo::insert(&mut *tx, &request).await?;
        tx.commit().await?;

        tracing::info!(
            transfer_id = request.id,
            resent_from = request_id,
            "Transfer request resent"
        );

        if notifies_target(&source, &target) {
            self.notifier
                .notify_branch_roles(
                    target.id,
                    SPLIT_REQUEST_ROLES,
                    NotificationPayload::split_resent(
                        request.id,
                        previous.id,
                        request.product_id,
                        source.id,
                        request.quantity,
                    ),
                )
                .await;
        }
        Ok(request)
    }
}
