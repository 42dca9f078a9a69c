//! 调拨授权门
//!
//! 纯函数，无副作用。默认拒绝，每个分支显式列出：
//!
//! | 身份 | 发起 (source) | 审批 (source → target) |
//! |------|---------------|------------------------|
//! | 总店管理员 `is_main_admin` | 任意 | 任意 |
//! | manager | branch == source | branch == target |
//! | admin / staff | branch == source | branch == source |
//! | cashier | 拒绝 | 拒绝 |
//! | 无有效任职 | 拒绝 | 拒绝 |

use shared::models::{Role, UserBranchAssignment};

/// 授权主体：用户的首个有效任职
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub branch_id: i64,
    pub role: Role,
    pub is_main_admin: bool,
}

impl From<&UserBranchAssignment> for Actor {
    fn from(a: &UserBranchAssignment) -> Self {
        Self {
            user_id: a.user_id,
            branch_id: a.branch_id,
            role: a.role,
            is_main_admin: a.is_main_admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InitiateTransfer,
    ApproveTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// 用户没有有效任职
    Unassigned,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn when(cond: bool, reason: &'static str) -> Self {
        if cond { Decision::Allow } else { Decision::Deny(reason) }
    }
}

pub fn authorize(actor: Option<&Actor>, action: Action, source: i64, target: i64) -> Decision {
    let Some(actor) = actor else {
        return Decision::Unassigned;
    };
    if actor.is_main_admin {
        return Decision::Allow;
    }
    match (actor.role, action) {
        (Role::Manager, Action::InitiateTransfer) => {
            Decision::when(actor.branch_id == source, "manager may only initiate from own branch")
        }
        (Role::Manager, Action::ApproveTransfer) => {
            Decision::when(actor.branch_id == target, "manager may only approve into own branch")
        }
        (Role::Admin | Role::Staff, Action::InitiateTransfer | Action::ApproveTransfer) => {
            Decision::when(actor.branch_id == source, "branch staff may only act on own branch")
        }
        (Role::Cashier, _) => Decision::Deny("cashier may not manage transfers"),
    }
}

pub fn can_initiate_transfer(actor: Option<&Actor>, source: i64) -> bool {
    // target is irrelevant for initiation
    authorize(actor, Action::InitiateTransfer, source, source).is_allowed()
}

pub fn can_approve_transfer(actor: Option<&Actor>, source: i64, target: i64) -> bool {
    authorize(actor, Action::ApproveTransfer, source, target).is_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: i64 = 1;
    const SUB: i64 = 2;
    const OTHER: i64 = 3;

    fn actor(role: Role, branch_id: i64, is_main_admin: bool) -> Actor {
        Actor {
            user_id: 100,
            branch_id,
            role,
            is_main_admin,
        }
    }

    #[test]
    fn test_no_assignment_denied() {
        assert!(!can_initiate_transfer(None, MAIN));
        assert!(!can_approve_transfer(None, MAIN, SUB));
        assert_eq!(
            authorize(None, Action::ApproveTransfer, MAIN, SUB),
            Decision::Unassigned
        );
    }

    #[test]
    fn test_main_admin_allowed_everywhere() {
        let a = actor(Role::Cashier, OTHER, true);
        assert!(can_initiate_transfer(Some(&a), MAIN));
        assert!(can_approve_transfer(Some(&a), MAIN, SUB));
        assert!(can_approve_transfer(Some(&a), SUB, MAIN));
    }

    #[test]
    fn test_manager_rules() {
        let at_main = actor(Role::Manager, MAIN, false);
        let at_sub = actor(Role::Manager, SUB, false);

        assert!(can_initiate_transfer(Some(&at_main), MAIN));
        assert!(!can_initiate_transfer(Some(&at_sub), MAIN));

        assert!(can_approve_transfer(Some(&at_sub), MAIN, SUB));
        assert!(!can_approve_transfer(Some(&at_main), MAIN, SUB));
    }

    #[test]
    fn test_staff_and_admin_source_only() {
        for role in [Role::Staff, Role::Admin] {
            let at_main = actor(role, MAIN, false);
            let at_sub = actor(role, SUB, false);
            assert!(can_initiate_transfer(Some(&at_main), MAIN));
            assert!(!can_initiate_transfer(Some(&at_sub), MAIN));
            assert!(can_approve_transfer(Some(&at_main), MAIN, SUB));
            assert!(!can_approve_transfer(Some(&at_sub), MAIN, SUB));
        }
    }

    #[test]
    fn test_cashier_denied() {
        let a = actor(Role::Cashier, MAIN, false);
        assert!(!can_initiate_transfer(Some(&a), MAIN));
        assert!(!can_approve_transfer(Some(&a), MAIN, SUB));
        assert_eq!(
            authorize(Some(&a), Action::InitiateTransfer, MAIN, SUB),
            Decision::Deny("cashier may not manage transfers")
        );
    }
}
