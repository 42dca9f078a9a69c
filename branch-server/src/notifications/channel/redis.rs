//! Redis 频道：多实例共享回放缓冲和扇出
//!
//! - 回放：`crab:branch:{id}:recent` 列表，`LPUSH` + `LTRIM 0 cap-1`
//! - 扇出：`PUBLISH crab:branch:{id}`，每个实例的 [`run_listener`] 用
//!   `PSUBSCRIBE crab:branch:*` 接收后写入本地注册表

use super::BranchChannel;
use crate::notifications::{ConnectionRegistry, DeliveryError};
use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use shared::message::{ChannelMessage, StreamEvent};
use shared::models::Notification;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const KEY_PREFIX: &str = "crab:branch";

fn replay_key(branch_id: i64) -> String {
    format!("{KEY_PREFIX}:{branch_id}:recent")
}

fn channel_name(branch_id: i64) -> String {
    format!("{KEY_PREFIX}:{branch_id}")
}

impl From<redis::RedisError> for DeliveryError {
    fn from(err: redis::RedisError) -> Self {
        DeliveryError::Channel(err.to_string())
    }
}

pub struct RedisChannel {
    client: redis::Client,
    capacity: usize,
}

impl RedisChannel {
    pub fn new(url: &str, capacity: usize) -> Result<Self, DeliveryError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            capacity: capacity.clamp(1, shared::message::REPLAY_CAPACITY),
        })
    }

    pub fn client(&self) -> redis::Client {
        self.client.clone()
    }
}

#[async_trait]
impl BranchChannel for RedisChannel {
    async fn publish(&self, branch_id: i64, notification: Notification) -> Result<(), DeliveryError> {
        let entry = serde_json::to_string(&notification)?;
        let message = serde_json::to_string(&ChannelMessage {
            branch_id,
            notification,
        })?;
        let key = replay_key(branch_id);

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .lpush(&key, entry)
            .ignore()
            .ltrim(&key, 0, self.capacity as isize - 1)
            .ignore()
            .publish(channel_name(branch_id), message)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn recent(&self, branch_id: i64, limit: usize) -> Result<Vec<Notification>, DeliveryError> {
        let limit = limit.min(self.capacity);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn
            .lrange(replay_key(branch_id), 0, limit as isize - 1)
            .await?;
        Ok(raw
            .iter()
            .filter_map(|entry| match serde_json::from_str::<Notification>(entry) {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!(branch_id, error = %e, "Skipping malformed replay entry");
                    None
                }
            })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Forward channel messages from every instance to the local registry
/// until `shutdown` fires. Reconnects after errors.
pub async fn run_listener(
    client: redis::Client,
    registry: Arc<ConnectionRegistry>,
    shutdown: CancellationToken,
) {
    loop {
        match forward_messages(&client, &registry, &shutdown).await {
            Ok(()) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Redis channel listener failed, reconnecting");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
            }
        }
    }
}

async fn forward_messages(
    client: &redis::Client,
    registry: &ConnectionRegistry,
    shutdown: &CancellationToken,
) -> redis::RedisResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(format!("{KEY_PREFIX}:*")).await?;
    tracing::info!("Redis channel listener subscribed");

    let mut messages = pubsub.on_message();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            msg = messages.next() => {
                let Some(msg) = msg else {
                    return Err(redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "pubsub stream closed",
                    )));
                };
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Unreadable channel payload");
                        continue;
                    }
                };
                match serde_json::from_str::<ChannelMessage>(&payload) {
                    Ok(m) => {
                        registry.broadcast(m.branch_id, &StreamEvent::notification(m.notification));
                    }
                    Err(e) => tracing::warn!(error = %e, "Malformed channel message"),
                }
            }
        }
    }
}
