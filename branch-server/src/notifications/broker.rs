//! NotificationBroker - 先落库，再扇出
//!
//! 通知失败只记日志，从不让触发它的业务操作失败。

use super::channel::BranchChannel;
use super::store::NotificationStore;
use super::{DeliveryError, Notifier};
use crate::db::repository::assignment;
use async_trait::async_trait;
use shared::message::NotificationPayload;
use shared::models::{Notification, Role};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct NotificationBroker {
    pool: SqlitePool,
    store: NotificationStore,
    channel: Arc<dyn BranchChannel>,
}

fn build_row(user_id: Option<i64>, branch_id: i64, payload: &NotificationPayload, now: i64) -> Notification {
    Notification {
        id: shared::util::snowflake_id(),
        user_id,
        branch_id,
        title: payload.title.clone(),
        message: payload.message.clone(),
        notification_type: payload.kind.as_str().to_string(),
        data: payload.data.clone(),
        is_read: false,
        created_at: now,
        updated_at: now,
    }
}

impl NotificationBroker {
    pub fn new(pool: SqlitePool, store: NotificationStore, channel: Arc<dyn BranchChannel>) -> Self {
        Self {
            pool,
            store,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<dyn BranchChannel> {
        &self.channel
    }

    /// One row per distinct recipient + one branch-wide row, one insert
    /// transaction, one publish. Returns the recipient count.
    pub async fn try_notify_branch_roles(
        &self,
        branch_id: i64,
        roles: &[Role],
        payload: &NotificationPayload,
    ) -> Result<usize, DeliveryError> {
        let assignments = assignment::find_active_by_branch_roles(&self.pool, branch_id, roles).await?;
        let recipients: BTreeSet<i64> = assignments.iter().map(|a| a.user_id).collect();

        let now = shared::util::now_millis();
        let branch_wide = build_row(None, branch_id, payload, now);
        let mut rows: Vec<Notification> = recipients
            .iter()
            .map(|user_id| build_row(Some(*user_id), branch_id, payload, now))
            .collect();
        rows.push(branch_wide.clone());

        self.store.insert_batch(&rows).await?;
        self.channel.publish(branch_id, branch_wide).await?;
        Ok(recipients.len())
    }

    /// One personal row, published on the branch channel
    pub async fn try_notify_user(
        &self,
        user_id: i64,
        branch_id: i64,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let row = build_row(Some(user_id), branch_id, payload, shared::util::now_millis());
        self.store.insert_batch(std::slice::from_ref(&row)).await?;
        self.channel.publish(branch_id, row).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationBroker {
    async fn notify_branch_roles(&self, branch_id: i64, roles: &[Role], payload: NotificationPayload) {
        match self.try_notify_branch_roles(branch_id, roles, &payload).await {
            Ok(recipients) => tracing::debug!(
                branch_id,
                kind = %payload.kind,
                recipients,
                "Branch notification delivered"
            ),
            Err(e) => tracing::warn!(
                branch_id,
                kind = %payload.kind,
                error = %e,
                "Branch notification delivery failed"
            ),
        }
    }

    async fn notify_user(&self, user_id: i64, branch_id: i64, payload: NotificationPayload) {
        if let Err(e) = self.try_notify_user(user_id, branch_id, &payload).await {
            tracing::warn!(
                user_id,
                branch_id,
                kind = %payload.kind,
                error = %e,
                "User notification delivery failed"
            );
        }
    }
}
