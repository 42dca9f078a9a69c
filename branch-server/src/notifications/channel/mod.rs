//! BranchChannel - 门店通知频道
//!
//! 回放缓冲（最新在前，上限 100）+ 实时扇出。
//!
//! | 实现 | 回放 | 扇出 | 部署 |
//! |------|------|------|------|
//! | [`InProcessChannel`] | 进程内 `VecDeque` | 本地 [`ConnectionRegistry`](super::ConnectionRegistry) | 单实例 |
//! | `RedisChannel` | `LPUSH` + `LTRIM` | `PUBLISH` → 各实例监听器 → 本地注册表 | 多实例 |

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::InProcessChannel;
#[cfg(feature = "redis")]
pub use self::redis::{RedisChannel, run_listener};

use super::DeliveryError;
use async_trait::async_trait;
use shared::models::Notification;

#[async_trait]
pub trait BranchChannel: Send + Sync {
    /// Append to the branch replay buffer and fan out to live subscribers
    async fn publish(&self, branch_id: i64, notification: Notification) -> Result<(), DeliveryError>;

    /// Replay buffer, newest first, at most `limit` entries
    async fn recent(&self, branch_id: i64, limit: usize) -> Result<Vec<Notification>, DeliveryError>;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}
