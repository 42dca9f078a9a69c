//! 集成测试公共工具：临时工作目录、种子数据、记录型 Notifier

#![allow(dead_code)]

use async_trait::async_trait;
use branch_server::core::{Config, ServerState};
use branch_server::db::repository::{assignment, branch};
use branch_server::notifications::Notifier;
use parking_lot::Mutex;
use shared::message::{NotificationKind, NotificationPayload};
use shared::models::{AssignmentCreate, Branch, BranchCreate, BranchType, Role, UserBranchAssignment};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// 完整服务器状态 + 持有临时目录
pub struct TestEnv {
    pub dir: TempDir,
    pub state: ServerState,
}

pub async fn test_env() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_work_dir(dir.path().to_string_lossy().to_string());
    let state = ServerState::initialize(&config).await.unwrap();
    TestEnv { dir, state }
}

pub async fn seed_branch(pool: &SqlitePool, name: &str, branch_type: BranchType) -> Branch {
    branch::create(
        pool,
        BranchCreate {
            name: name.to_string(),
            branch_type,
        },
    )
    .await
    .unwrap()
}

pub async fn assign(pool: &SqlitePool, user_id: i64, branch_id: i64, role: Role) -> UserBranchAssignment {
    assignment::create(
        pool,
        AssignmentCreate {
            user_id,
            branch_id,
            role,
            is_main_admin: false,
        },
    )
    .await
    .unwrap()
}

pub async fn assign_main_admin(pool: &SqlitePool, user_id: i64, branch_id: i64) -> UserBranchAssignment {
    assignment::create(
        pool,
        AssignmentCreate {
            user_id,
            branch_id,
            role: Role::Admin,
            is_main_admin: true,
        },
    )
    .await
    .unwrap()
}

/// One recorded notifier call
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    BranchRoles {
        branch_id: i64,
        roles: Vec<Role>,
        kind: NotificationKind,
    },
    User {
        user_id: i64,
        branch_id: i64,
        kind: NotificationKind,
    },
}

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().clone()
    }

    pub fn count_kind(&self, kind: NotificationKind) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| match c {
                Recorded::BranchRoles { kind: k, .. } | Recorded::User { kind: k, .. } => *k == kind,
            })
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_branch_roles(&self, branch_id: i64, roles: &[Role], payload: NotificationPayload) {
        self.calls.lock().push(Recorded::BranchRoles {
            branch_id,
            roles: roles.to_vec(),
            kind: payload.kind,
        });
    }

    async fn notify_user(&self, user_id: i64, branch_id: i64, payload: NotificationPayload) {
        self.calls.lock().push(Recorded::User {
            user_id,
            branch_id,
            kind: payload.kind,
        });
    }
}
