//! NotificationStore - 通知持久化与已读跟踪
//!
//! 行只会被插入一次，之后只有 `is_read` 会变；核心流程从不删除。

use crate::db::repository::{RepoError, RepoResult, assignment, notification as repo};
use shared::models::{Notification, NotificationQuery};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct NotificationStore {
    pool: SqlitePool,
}

impl NotificationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert all rows in one transaction
    pub async fn insert_batch(&self, rows: &[Notification]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            repo::insert(&mut *tx, row).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Branch whose branch-wide rows the user sees: the explicit one, or the
    /// branch of the user's first active assignment
    async fn visible_branch(&self, user_id: i64, branch_id: Option<i64>) -> RepoResult<Option<i64>> {
        match branch_id {
            Some(b) => Ok(Some(b)),
            None => Ok(assignment::find_primary_active(&self.pool, user_id)
                .await?
                .map(|a| a.branch_id)),
        }
    }

    /// Personal rows plus the branch-wide rows of the visible branch, newest first
    pub async fn list(&self, query: &NotificationQuery) -> RepoResult<Vec<Notification>> {
        let branch = self.visible_branch(query.user_id, query.branch_id).await?;
        repo::list_visible(&self.pool, query.user_id, branch, query.unread_only).await
    }

    pub async fn unread_count(&self, user_id: i64, branch_id: Option<i64>) -> RepoResult<i64> {
        let branch = self.visible_branch(user_id, branch_id).await?;
        repo::count_unread(&self.pool, user_id, branch).await
    }

    pub async fn mark_read(&self, id: i64, user_id: i64) -> RepoResult<Notification> {
        let now = shared::util::now_millis();
        if !repo::mark_read(&self.pool, id, user_id, now).await? {
            return Err(RepoError::NotFound(format!("notification {id}")));
        }
        repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("notification {id}")))
    }

    pub async fn mark_all_read(&self, user_id: i64) -> RepoResult<u64> {
        repo::mark_all_read(&self.pool, user_id, shared::util::now_millis()).await
    }

    pub async fn recent_branch_wide(&self, branch_id: i64, limit: usize) -> RepoResult<Vec<Notification>> {
        repo::recent_branch_wide(&self.pool, branch_id, limit as i64).await
    }
}
