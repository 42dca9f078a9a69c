//! Branch Model (门店)

use serde::{Deserialize, Serialize};
use std::fmt;

/// 门店类型：总店 / 分店
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum BranchType {
    Main,
    Sub,
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Sub => write!(f, "sub"),
        }
    }
}

/// Branch entity. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub branch_type: BranchType,
    pub created_at: i64,
}

impl Branch {
    pub fn is_main(&self) -> bool {
        self.branch_type == BranchType::Main
    }
}

/// Create branch payload (seeding only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub branch_type: BranchType,
}
