//! User ↔ Branch assignment (员工门店任职)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch-scoped role. Closed set; `is_main_admin` is carried separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Cashier,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment row. Only the first active row of a user (lowest id) governs
/// authorization; a user may hold several rows at one branch with
/// different roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserBranchAssignment {
    pub id: i64,
    pub user_id: i64,
    pub branch_id: i64,
    pub role: Role,
    pub is_main_admin: bool,
    pub is_active: bool,
}

/// Create assignment payload (seeding only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCreate {
    pub user_id: i64,
    pub branch_id: i64,
    pub role: Role,
    #[serde(default)]
    pub is_main_admin: bool,
}
