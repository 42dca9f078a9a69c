//! 门店库存账本
//!
//! - [`InventoryLedger`] - 原子增减 / 跨店移动，库存永不为负
//! - [`KeyedLocks`] - (product, branch) 键锁
//! - [`LedgerError`] - 账本错误

pub mod error;
pub mod ledger;
pub mod locks;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Adjustment, InventoryLedger, MoveOutcome};
pub use locks::{KeyedLocks, StockGuard, StockKey};
