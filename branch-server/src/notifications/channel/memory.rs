use super::BranchChannel;
use crate::notifications::{ConnectionRegistry, DeliveryError};
use async_trait::async_trait;
use dashmap::DashMap;
use shared::message::StreamEvent;
use shared::models::Notification;
use std::collections::VecDeque;
use std::sync::Arc;

/// 进程内频道：回放缓冲与扇出在同一把门店锁内完成，两者顺序一致
pub struct InProcessChannel {
    registry: Arc<ConnectionRegistry>,
    buffers: DashMap<i64, VecDeque<Notification>>,
    capacity: usize,
}

impl InProcessChannel {
    pub fn new(registry: Arc<ConnectionRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            buffers: DashMap::new(),
            capacity: capacity.clamp(1, shared::message::REPLAY_CAPACITY),
        }
    }

    /// Seed a branch buffer (newest first), e.g. from persisted rows at startup
    pub fn preload(&self, branch_id: i64, newest_first: Vec<Notification>) {
        let mut buffer: VecDeque<Notification> = newest_first.into();
        buffer.truncate(self.capacity);
        self.buffers.insert(branch_id, buffer);
    }
}

#[async_trait]
impl BranchChannel for InProcessChannel {
    async fn publish(&self, branch_id: i64, notification: Notification) -> Result<(), DeliveryError> {
        let mut buffer = self.buffers.entry(branch_id).or_default();
        buffer.push_front(notification.clone());
        buffer.truncate(self.capacity);
        let delivered = self
            .registry
            .broadcast(branch_id, &StreamEvent::notification(notification));
        drop(buffer);
        tracing::debug!(branch_id, delivered, "Branch notification published");
        Ok(())
    }

    async fn recent(&self, branch_id: i64, limit: usize) -> Result<Vec<Notification>, DeliveryError> {
        Ok(self
            .buffers
            .get(&branch_id)
            .map(|b| b.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
