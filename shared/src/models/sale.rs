//! Sale Model (销售扣减)

use serde::{Deserialize, Serialize};

/// One sold line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Record sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreate {
    pub branch_id: i64,
    pub user_id: i64,
    pub lines: Vec<SaleLineInput>,
}

/// Sale header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub branch_id: i64,
    pub created_by: i64,
    pub created_at: i64,
}

/// Sale line after decrement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Branch stock right after this line was applied
    pub remaining: i64,
}

/// Record sale response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}
