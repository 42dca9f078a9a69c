//! Inventory Model (门店库存)

use serde::{Deserialize, Serialize};

/// Stock counter for one (product, branch) pair. `quantity` never goes
/// below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub product_id: i64,
    pub branch_id: i64,
    pub quantity: i64,
    pub min_stock: i64,
    pub updated_at: i64,
}

impl InventoryRecord {
    /// Fresh zero-quantity record (not yet persisted)
    pub fn empty(product_id: i64, branch_id: i64, now: i64) -> Self {
        Self {
            product_id,
            branch_id,
            quantity: 0,
            min_stock: 0,
            updated_at: now,
        }
    }
}

/// Ledger read response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: i64,
    pub branch_id: i64,
    pub quantity: i64,
}

/// Update min stock payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinStockUpdate {
    pub min_stock: i64,
}
