//! ConnectionRegistry - 每个门店的实时订阅连接
//!
//! 每个连接对应一个有界 mpsc 队列。写入在门店槽位锁内完成，
//! 所以同一门店的所有订阅者看到相同的事件顺序。写入失败（接收端已关闭
//! 或队列已满）只移除该连接，不影响其他订阅者。

use dashmap::DashMap;
use futures::Stream;
use shared::message::StreamEvent;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub branch_id: i64,
    pub connection_id: u64,
}

#[derive(Default)]
struct BranchSlot {
    connections: HashMap<u64, mpsc::Sender<StreamEvent>>,
}

impl BranchSlot {
    /// Write to every connection; failed writes are removed. Returns the
    /// number of successful writes.
    fn deliver(&mut self, branch_id: i64, event: &StreamEvent) -> usize {
        let mut delivered = 0;
        self.connections
            .retain(|connection_id, tx| match tx.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(branch_id, connection_id, "Subscriber queue full, dropping connection");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(branch_id, connection_id, "Subscriber gone, pruning connection");
                    false
                }
            });
        delivered
    }
}

pub struct ConnectionRegistry {
    branches: DashMap<i64, BranchSlot>,
    next_id: AtomicU64,
    buffer: usize,
}

impl ConnectionRegistry {
    /// `buffer` is the per-connection queue depth
    pub fn new(buffer: usize) -> Self {
        Self {
            branches: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a live subscriber. The first event on the stream is
    /// `connected`; nothing is replayed.
    pub fn subscribe(self: &Arc<Self>, branch_id: i64) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let _ = tx.try_send(StreamEvent::Connected);

        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.branches
            .entry(branch_id)
            .or_default()
            .connections
            .insert(connection_id, tx);
        tracing::debug!(branch_id, connection_id, "Subscriber connected");

        Subscription {
            handle: SubscriptionHandle {
                branch_id,
                connection_id,
            },
            rx,
            registry: Arc::clone(self),
        }
    }

    /// Idempotent. Returns whether the connection was still registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let removed = match self.branches.get_mut(&handle.branch_id) {
            Some(mut slot) => slot.connections.remove(&handle.connection_id).is_some(),
            None => false,
        };
        self.prune_empty(handle.branch_id);
        if removed {
            tracing::debug!(
                branch_id = handle.branch_id,
                connection_id = handle.connection_id,
                "Subscriber disconnected"
            );
        }
        removed
    }

    /// Fan out to every live connection of the branch
    pub fn broadcast(&self, branch_id: i64, event: &StreamEvent) -> usize {
        let delivered = match self.branches.get_mut(&branch_id) {
            Some(mut slot) => slot.deliver(branch_id, event),
            None => return 0,
        };
        self.prune_empty(branch_id);
        delivered
    }

    /// Write a heartbeat to every connection of every branch
    pub fn heartbeat(&self) -> usize {
        let event = StreamEvent::heartbeat(shared::util::now_millis());
        let mut delivered = 0;
        let mut emptied = Vec::new();
        for mut slot in self.branches.iter_mut() {
            let branch_id = *slot.key();
            delivered += slot.deliver(branch_id, &event);
            if slot.connections.is_empty() {
                emptied.push(branch_id);
            }
        }
        for branch_id in emptied {
            self.prune_empty(branch_id);
        }
        delivered
    }

    fn prune_empty(&self, branch_id: i64) {
        self.branches
            .remove_if(&branch_id, |_, slot| slot.connections.is_empty());
    }

    pub fn connection_count(&self, branch_id: i64) -> usize {
        self.branches
            .get(&branch_id)
            .map(|slot| slot.connections.len())
            .unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        self.branches.iter().map(|slot| slot.connections.len()).sum()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<StreamEvent>,
    registry: Arc<ConnectionRegistry>,
}

impl Subscription {
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.handle);
    }
}
