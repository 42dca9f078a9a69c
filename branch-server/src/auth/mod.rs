//! 授权模块
//!
//! 认证不在本服务范围内：调用方在请求体 / 查询参数中携带 `userId`，
//! 这里只负责把它解析为 [`Actor`] 并交给授权门判断。

pub mod gate;

pub use gate::{Action, Actor, Decision, authorize, can_approve_transfer, can_initiate_transfer};

use crate::db::repository::{RepoResult, assignment};
use sqlx::SqliteExecutor;

/// Resolve the acting user to their first active assignment
pub async fn resolve_actor<'e>(executor: impl SqliteExecutor<'e>, user_id: i64) -> RepoResult<Option<Actor>> {
    Ok(assignment::find_primary_active(executor, user_id)
        .await?
        .as_ref()
        .map(Actor::from))
}
