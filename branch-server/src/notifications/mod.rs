//! 门店通知
//!
//! # 组件
//!
//! | 组件 | 职责 |
//! |------|------|
//! | [`NotificationStore`] | 通知行持久化、已读跟踪 |
//! | [`ConnectionRegistry`] | 每个门店的实时订阅连接、扇出、心跳 |
//! | [`BranchChannel`] | 回放缓冲 + 扇出传输（进程内 / Redis） |
//! | [`NotificationBroker`] | 先落库再扇出，失败只记日志 |

pub mod broker;
pub mod channel;
pub mod registry;
pub mod store;

pub use broker::NotificationBroker;
pub use channel::{BranchChannel, InProcessChannel};
pub use registry::{ConnectionRegistry, Subscription, SubscriptionHandle};
pub use store::NotificationStore;

use crate::db::repository::RepoError;
use async_trait::async_trait;
use shared::message::NotificationPayload;
use shared::models::Role;
use thiserror::Error;

/// Delivery failures. Logged by the broker, never returned to business callers.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Best-effort notification sink used by business services
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_branch_roles(&self, branch_id: i64, roles: &[Role], payload: NotificationPayload);

    async fn notify_user(&self, user_id: i64, branch_id: i64, payload: NotificationPayload);
}

/// Roles alerted about split requests arriving at a branch
pub const SPLIT_REQUEST_ROLES: &[Role] = &[Role::Admin, Role::Staff, Role::Manager];

/// Roles alerted about the outcome of a split at the source branch
pub const SPLIT_OUTCOME_ROLES: &[Role] = &[Role::Admin, Role::Manager, Role::Staff];

/// Roles alerted about low stock
pub const LOW_STOCK_ROLES: &[Role] = &[Role::Admin, Role::Manager];
