//! InventoryLedger - 门店库存计数器
//!
//! # 并发模型
//!
//! | 层 | 机制 | 作用 |
//! |----|------|------|
//! | 进程内 | [`KeyedLocks`] | 同一 (product, branch) 串行 |
//! | 数据库 | 条件写 `quantity >= amount` | 跨进程也不会出现负库存 |
//! | 事务 | 先写后读 | 首条语句即取得 SQLite 写锁，不会出现读锁升级失败 |
//!
//! `apply_*` 关联函数在调用方的事务里执行，不加锁；调用方需先用
//! [`InventoryLedger::lock_keys`] 锁住涉及的键。

use super::error::{LedgerError, LedgerResult};
use super::locks::{KeyedLocks, StockGuard, StockKey};
use crate::db::repository::inventory as repo;
use crate::utils::validation::validate_non_negative;
use shared::models::InventoryRecord;
use sqlx::{SqliteConnection, SqlitePool};

/// Result of one applied delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub product_id: i64,
    pub branch_id: i64,
    pub previous: i64,
    pub current: i64,
    pub min_stock: i64,
}

impl Adjustment {
    /// Stock went from above `min_stock` to at-or-below it in this write.
    /// A zero `min_stock` means no threshold is configured.
    pub fn crossed_min_stock(&self) -> bool {
        self.min_stock > 0 && self.previous > self.min_stock && self.current <= self.min_stock
    }
}

/// Result of a two-sided move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub source: Adjustment,
    pub target: Adjustment,
}

pub struct InventoryLedger {
    pool: SqlitePool,
    locks: KeyedLocks,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: KeyedLocks::new(),
        }
    }

    /// Lock keys for a caller-managed transaction
    pub async fn lock_keys(&self, keys: &[StockKey]) -> StockGuard {
        self.locks.lock_many(keys).await
    }

    /// Current quantity, 0 when no record exists (does not create one)
    pub async fn get(&self, product_id: i64, branch_id: i64) -> LedgerResult<i64> {
        Ok(self
            .find(product_id, branch_id)
            .await?
            .map(|r| r.quantity)
            .unwrap_or(0))
    }

    pub async fn find(&self, product_id: i64, branch_id: i64) -> LedgerResult<Option<InventoryRecord>> {
        Ok(repo::find(&self.pool, product_id, branch_id).await?)
    }

    /// Existing record, or a fresh zero-quantity one
    pub async fn reserve_or_create(&self, product_id: i64, branch_id: i64) -> LedgerResult<InventoryRecord> {
        let _guard = self.locks.lock((product_id, branch_id)).await;
        let mut conn = self.pool.acquire().await?;
        Self::apply_reserve(&mut *conn, product_id, branch_id).await
    }

    /// Apply `delta` atomically. Fails with `InsufficientStock` (quantity
    /// untouched) if the result would be negative.
    pub async fn adjust(&self, product_id: i64, branch_id: i64, delta: i64) -> LedgerResult<Adjustment> {
        let _guard = self.locks.lock((product_id, branch_id)).await;
        let mut tx = self.pool.begin().await?;
        let adjustment = Self::apply_adjust(&mut *tx, product_id, branch_id, delta).await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    /// Move `quantity` from one branch to another; both sides or neither.
    pub async fn move_stock(
        &self,
        product_id: i64,
        from_branch: i64,
        to_branch: i64,
        quantity: i64,
    ) -> LedgerResult<MoveOutcome> {
        let _guard = self
            .locks
            .lock_many(&[(product_id, from_branch), (product_id, to_branch)])
            .await;
        let mut tx = self.pool.begin().await?;
        let outcome = Self::apply_move(&mut *tx, product_id, from_branch, to_branch, quantity).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn set_min_stock(&self, product_id: i64, branch_id: i64, min_stock: i64) -> LedgerResult<InventoryRecord> {
        validate_non_negative(min_stock, "minStock").map_err(LedgerError::Validation)?;
        let _guard = self.locks.lock((product_id, branch_id)).await;
        Ok(repo::set_min_stock(&self.pool, product_id, branch_id, min_stock, shared::util::now_millis()).await?)
    }

    // ========== Transaction-scoped primitives (caller holds the locks) ==========

    pub async fn apply_reserve(
        conn: &mut SqliteConnection,
        product_id: i64,
        branch_id: i64,
    ) -> LedgerResult<InventoryRecord> {
        Ok(repo::insert_if_missing(conn, product_id, branch_id, shared::util::now_millis()).await?)
    }

    pub async fn apply_adjust(
        conn: &mut SqliteConnection,
        product_id: i64,
        branch_id: i64,
        delta: i64,
    ) -> LedgerResult<Adjustment> {
        let now = shared::util::now_millis();

        let (current, min_stock) = if delta > 0 {
            repo::increment(&mut *conn, product_id, branch_id, delta, now).await?
        } else if delta < 0 {
            let requested = delta.checked_neg().ok_or_else(|| {
                LedgerError::Validation(format!("delta out of range: {delta}"))
            })?;
            match repo::decrement(&mut *conn, product_id, branch_id, requested, now).await? {
                Some(row) => row,
                None => {
                    let available = repo::find(&mut *conn, product_id, branch_id)
                        .await?
                        .map(|r| r.quantity)
                        .unwrap_or(0);
                    return Err(LedgerError::InsufficientStock {
                        available,
                        requested,
                    });
                }
            }
        } else {
            // zero delta: read only, no record is created
            match repo::find(&mut *conn, product_id, branch_id).await? {
                Some(r) => (r.quantity, r.min_stock),
                None => (0, 0),
            }
        };

        Ok(Adjustment {
            product_id,
            branch_id,
            previous: current - delta,
            current,
            min_stock,
        })
    }

    pub async fn apply_move(
        conn: &mut SqliteConnection,
        product_id: i64,
        from_branch: i64,
        to_branch: i64,
        quantity: i64,
    ) -> LedgerResult<MoveOutcome> {
        if quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "move quantity must be greater than 0, got {quantity}"
            )));
        }
        if from_branch == to_branch {
            return Err(LedgerError::Validation(
                "source and target branch must differ".into(),
            ));
        }
        // 条件扣减先行；失败后再读，区分记录缺失和库存不足
        let now = shared::util::now_millis();
        let Some((current, min_stock)) =
            repo::decrement(&mut *conn, product_id, from_branch, quantity, now).await?
        else {
            return Err(match repo::find(&mut *conn, product_id, from_branch).await? {
                Some(record) => LedgerError::InsufficientStock {
                    available: record.quantity,
                    requested: quantity,
                },
                None => LedgerError::NotFound {
                    product_id,
                    branch_id: from_branch,
                },
            });
        };
        let source = Adjustment {
            product_id,
            branch_id: from_branch,
            previous: current + quantity,
            current,
            min_stock,
        };
        let target = Self::apply_adjust(&mut *conn, product_id, to_branch, quantity).await?;
        Ok(MoveOutcome { source, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use std::sync::Arc;

    async fn test_ledger() -> (tempfile::TempDir, InventoryLedger) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbService::new(dir.path().join("ledger.db")).await.unwrap();
        (dir, InventoryLedger::new(db.pool))
    }

    #[tokio::test]
    async fn test_get_missing_is_zero_and_does_not_create() {
        let (_dir, ledger) = test_ledger().await;
        assert_eq!(ledger.get(1, 1).await.unwrap(), 0);
        assert!(ledger.find(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reserve_or_create_is_idempotent() {
        let (_dir, ledger) = test_ledger().await;
        let first = ledger.reserve_or_create(1, 1).await.unwrap();
        assert_eq!(first.quantity, 0);
        ledger.adjust(1, 1, 5).await.unwrap();
        let second = ledger.reserve_or_create(1, 1).await.unwrap();
        assert_eq!(second.quantity, 5);
    }

    #[tokio::test]
    async fn test_adjust_rejects_negative_result() {
        let (_dir, ledger) = test_ledger().await;
        ledger.adjust(1, 1, 3).await.unwrap();

        let err = ledger.adjust(1, 1, -4).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 3,
                requested: 4
            }
        ));
        assert_eq!(ledger.get(1, 1).await.unwrap(), 3);

        let adj = ledger.adjust(1, 1, -3).await.unwrap();
        assert_eq!((adj.previous, adj.current), (3, 0));
    }

    #[tokio::test]
    async fn test_negative_adjust_on_missing_record() {
        let (_dir, ledger) = test_ledger().await;
        let err = ledger.adjust(7, 7, -1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 0,
                requested: 1
            }
        ));
        assert!(ledger.find(7, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_move_stock_all_or_nothing() {
        let (_dir, ledger) = test_ledger().await;
        ledger.adjust(1, 10, 5).await.unwrap();

        let err = ledger.move_stock(1, 10, 20, 6).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        assert_eq!(ledger.get(1, 10).await.unwrap(), 5);
        assert!(ledger.find(1, 20).await.unwrap().is_none());

        let outcome = ledger.move_stock(1, 10, 20, 5).await.unwrap();
        assert_eq!(outcome.source.current, 0);
        assert_eq!(outcome.target.current, 5);
    }

    #[tokio::test]
    async fn test_move_from_missing_source() {
        let (_dir, ledger) = test_ledger().await;
        let err = ledger.move_stock(1, 10, 20, 1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotFound {
                product_id: 1,
                branch_id: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_min_stock_crossing() {
        let (_dir, ledger) = test_ledger().await;
        ledger.adjust(1, 1, 10).await.unwrap();
        ledger.set_min_stock(1, 1, 5).await.unwrap();

        let a = ledger.adjust(1, 1, -4).await.unwrap();
        assert!(!a.crossed_min_stock());
        let b = ledger.adjust(1, 1, -1).await.unwrap();
        assert!(b.crossed_min_stock());
        let c = ledger.adjust(1, 1, -1).await.unwrap();
        assert!(!c.crossed_min_stock());

        assert!(matches!(
            ledger.set_min_stock(1, 1, -1).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_move_on_disjoint_key_is_not_busy() {
        let (_dir, ledger) = test_ledger().await;
        let ledger = Arc::new(ledger);
        ledger.adjust(1, 10, 300).await.unwrap();
        ledger.adjust(2, 10, 1).await.unwrap();

        let churn = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for _ in 0..300 {
                    ledger.adjust(2, 10, -1).await.unwrap();
                    ledger.adjust(2, 10, 1).await.unwrap();
                }
            })
        };
        let mut moves = Vec::new();
        for _ in 0..300 {
            let ledger = ledger.clone();
            moves.push(tokio::spawn(async move { ledger.move_stock(1, 10, 20, 1).await }));
        }
        for m in moves {
            let result = m.await.unwrap();
            assert!(result.is_ok(), "move failed: {result:?}");
        }
        churn.await.unwrap();

        assert_eq!(ledger.get(1, 10).await.unwrap(), 0);
        assert_eq!(ledger.get(1, 20).await.unwrap(), 300);
        assert_eq!(ledger.get(2, 10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_move_reports_available_on_shortfall() {
        let (_dir, ledger) = test_ledger().await;
        ledger.adjust(1, 10, 2).await.unwrap();
        let err = ledger.move_stock(1, 10, 20, 3).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 2,
                requested: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_oversell() {
        let (_dir, ledger) = test_ledger().await;
        let ledger = Arc::new(ledger);
        ledger.adjust(1, 1, 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.adjust(1, 1, -1).await.is_ok() }));
        }
        let mut succeeded = 0;
        for h in handles {
            if h.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 10);
        assert_eq!(ledger.get(1, 1).await.unwrap(), 0);
    }
}
