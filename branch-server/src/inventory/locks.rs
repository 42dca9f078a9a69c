//! 库存键锁表
//!
//! 每个 (product, branch) 一把异步互斥锁。同一键的操作串行，不同键互不阻塞。
//! 多键操作按 (product_id, branch_id) 升序加锁，避免死锁。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// (product_id, branch_id)
pub type StockKey = (i64, i64);

#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<DashMap<StockKey, Arc<Mutex<()>>>>,
}

/// Holds every lock acquired by one `lock_many` call until dropped
#[must_use = "locks are released when the guard is dropped"]
pub struct StockGuard {
    keys: Vec<StockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl StockGuard {
    /// Keys held, in acquisition order
    pub fn keys(&self) -> &[StockKey] {
        &self.keys
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: StockKey) -> Arc<Mutex<()>> {
        // Clone out of the shard before awaiting
        self.slots.entry(key).or_default().clone()
    }

    pub async fn lock(&self, key: StockKey) -> StockGuard {
        self.lock_many(&[key]).await
    }

    /// Acquire all keys in ascending order (duplicates collapse)
    pub async fn lock_many(&self, keys: &[StockKey]) -> StockGuard {
        let mut ordered = keys.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            guards.push(self.slot(*key).lock_owned().await);
        }
        StockGuard {
            keys: ordered,
            _guards: guards,
        }
    }

    /// Number of keys ever locked
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
