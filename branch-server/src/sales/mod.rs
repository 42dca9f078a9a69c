//! 销售扣减钩子
//!
//! 一笔销售 = 一个事务：销售单 + 每行 `reserve_or_create` + `adjust(-q)` + 销售行。
//! 任一行库存不足时整单回滚。提交后，对本次销售中跌破 `minStock` 的行
//! 通知门店 `{admin, manager}`。

use crate::db::repository::sale as repo;
use crate::inventory::{Adjustment, InventoryLedger, LedgerError, LedgerResult, StockKey};
use crate::notifications::{LOW_STOCK_ROLES, Notifier};
use crate::utils::validation::{MAX_SALE_LINES, validate_positive};
use shared::message::NotificationPayload;
use shared::models::{Sale, SaleCreate, SaleLine, SaleReceipt};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SalesService {
    pool: SqlitePool,
    ledger: Arc<InventoryLedger>,
    notifier: Arc<dyn Notifier>,
}

impl SalesService {
    pub fn new(pool: SqlitePool, ledger: Arc<InventoryLedger>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            ledger,
            notifier,
        }
    }

    pub async fn record_sale(&self, data: SaleCreate) -> LedgerResult<SaleReceipt> {
        if data.lines.is_empty() {
            return Err(LedgerError::Validation("sale has no lines".into()));
        }
        if data.lines.len() > MAX_SALE_LINES {
            return Err(LedgerError::Validation(format!(
                "too many sale lines ({}, max {MAX_SALE_LINES})",
                data.lines.len()
            )));
        }
        for line in &data.lines {
            validate_positive(line.quantity, "quantity").map_err(LedgerError::Validation)?;
        }

        let keys: Vec<StockKey> = data
            .lines
            .iter()
            .map(|l| (l.product_id, data.branch_id))
            .collect();
        let guard = self.ledger.lock_keys(&keys).await;

        let now = shared::util::now_millis();
        let sale = Sale {
            id: shared::util::snowflake_id(),
            branch_id: data.branch_id,
            created_by: data.user_id,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        repo::insert_sale(&mut *tx, &sale).await?;

        let mut lines = Vec::with_capacity(data.lines.len());
        let mut adjustments: Vec<Adjustment> = Vec::with_capacity(data.lines.len());
        for input in &data.lines {
            InventoryLedger::apply_reserve(&mut *tx, input.product_id, data.branch_id).await?;
            let adjustment =
                InventoryLedger::apply_adjust(&mut *tx, input.product_id, data.branch_id, -input.quantity).await?;
            let line = SaleLine {
                id: shared::util::snowflake_id(),
                sale_id: sale.id,
                product_id: input.product_id,
                quantity: input.quantity,
                remaining: adjustment.current,
            };
            repo::insert_line(&mut *tx, &line).await?;
            lines.push(line);
            adjustments.push(adjustment);
        }
        tx.commit().await?;
        drop(guard);

        tracing::info!(
            sale_id = sale.id,
            branch_id = sale.branch_id,
            lines = lines.len(),
            "Sale recorded"
        );

        // 同一商品可出现在多行：以整单的首个 previous 和最后 current 判断跨越
        for crossed in crossings(&adjustments) {
            self.notifier
                .notify_branch_roles(
                    crossed.branch_id,
                    LOW_STOCK_ROLES,
                    NotificationPayload::low_stock(
                        crossed.product_id,
                        crossed.branch_id,
                        crossed.current,
                        crossed.min_stock,
                    ),
                )
                .await;
        }

        Ok(SaleReceipt { sale, lines })
    }
}

/// Collapse per-line adjustments to one per product and keep those that
/// crossed `minStock` within this sale.
fn crossings(adjustments: &[Adjustment]) -> Vec<Adjustment> {
    let mut merged: Vec<Adjustment> = Vec::new();
    for adj in adjustments {
        match merged.iter_mut().find(|m| m.product_id == adj.product_id) {
            Some(m) => {
                m.current = adj.current;
                m.min_stock = adj.min_stock;
            }
            None => merged.push(*adj),
        }
    }
    merged.retain(Adjustment::crossed_min_stock);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(product_id: i64, previous: i64, current: i64, min_stock: i64) -> Adjustment {
        Adjustment {
            product_id,
            branch_id: 1,
            previous,
            current,
            min_stock,
        }
    }

    #[test]
    fn test_crossings_merge_repeated_products() {
        // 10 → 6 → 4 with min 5: one crossing for product 1
        let found = crossings(&[adj(1, 10, 6, 5), adj(1, 6, 4, 5), adj(2, 3, 2, 5)]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_id, 1);
        assert_eq!((found[0].previous, found[0].current), (10, 4));
    }

    #[test]
    fn test_no_crossing_without_threshold() {
        assert!(crossings(&[adj(1, 10, 0, 0)]).is_empty());
    }
}
