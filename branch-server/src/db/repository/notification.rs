//! Notification Repository

use super::RepoResult;
use shared::models::Notification;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, user_id, branch_id, title, message, notification_type, data, is_read, created_at, updated_at";

pub async fn insert<'e>(executor: impl SqliteExecutor<'e>, n: &Notification) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO notification (id, user_id, branch_id, title, message, notification_type, data, is_read, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(n.id)
    .bind(n.user_id)
    .bind(n.branch_id)
    .bind(&n.title)
    .bind(&n.message)
    .bind(&n.notification_type)
    .bind(Json(&n.data))
    .bind(n.is_read)
    .bind(n.created_at)
    .bind(n.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Notification>> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notification WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// `user_id = ?` rows, plus the branch-wide rows of `branch_id` when given
fn push_visibility(qb: &mut QueryBuilder<'_, Sqlite>, user_id: i64, branch_id: Option<i64>) {
    qb.push(" WHERE (user_id = ");
    qb.push_bind(user_id);
    if let Some(branch_id) = branch_id {
        qb.push(" OR (user_id IS NULL AND branch_id = ");
        qb.push_bind(branch_id);
        qb.push(")");
    }
    qb.push(")");
}

pub async fn list_visible(
    pool: &SqlitePool,
    user_id: i64,
    branch_id: Option<i64>,
    unread_only: bool,
) -> RepoResult<Vec<Notification>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {COLUMNS} FROM notification"));
    push_visibility(&mut qb, user_id, branch_id);
    if unread_only {
        qb.push(" AND is_read = 0");
    }
    qb.push(" ORDER BY created_at DESC, id DESC");
    let rows = qb.build_query_as::<Notification>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn count_unread(pool: &SqlitePool, user_id: i64, branch_id: Option<i64>) -> RepoResult<i64> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM notification");
    push_visibility(&mut qb, user_id, branch_id);
    qb.push(" AND is_read = 0");
    let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

/// Mark one row read. Users may mark their own rows and branch-wide rows.
pub async fn mark_read(pool: &SqlitePool, id: i64, user_id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE notification SET is_read = 1, updated_at = ? WHERE id = ? AND (user_id = ? OR user_id IS NULL)",
    )
    .bind(now)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Mark every personal row of the user read; returns affected rows
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64, now: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE notification SET is_read = 1, updated_at = ? WHERE user_id = ? AND is_read = 0",
    )
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Branch-wide rows, newest first (warms the in-process replay buffer)
pub async fn recent_branch_wide(pool: &SqlitePool, branch_id: i64, limit: i64) -> RepoResult<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notification WHERE user_id IS NULL AND branch_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(branch_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
