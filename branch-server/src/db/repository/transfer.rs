//! Transfer Request Repository
//!
//! Status changes are conditional on the current status; `false` means
//! another writer got there first.

use super::RepoResult;
use shared::models::{TransferQuery, TransferRequest, TransferStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, transfer_type, product_id, source_branch_id, target_branch_id, quantity, status, notes, reject_reason, created_by, approved_by, resent_from, created_at, updated_at";

pub async fn find_by_id<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<TransferRequest>> {
    let request = sqlx::query_as::<_, TransferRequest>(&format!(
        "SELECT {COLUMNS} FROM transfer_request WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(request)
}

/// List newest first. `branch_id` matches either side.
pub async fn list(pool: &SqlitePool, query: &TransferQuery) -> RepoResult<Vec<TransferRequest>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM transfer_request WHERE 1 = 1"));
    if let Some(branch_id) = query.branch_id {
        qb.push(" AND (source_branch_id = ");
        qb.push_bind(branch_id);
        qb.push(" OR target_branch_id = ");
        qb.push_bind(branch_id);
        qb.push(")");
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    let rows = qb
        .build_query_as::<TransferRequest>()
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn insert<'e>(executor: impl SqliteExecutor<'e>, request: &TransferRequest) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO transfer_request (id, transfer_type, product_id, source_branch_id, target_branch_id, quantity, status, notes, reject_reason, created_by, approved_by, resent_from, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(request.id)
    .bind(request.transfer_type)
    .bind(request.product_id)
    .bind(request.source_branch_id)
    .bind(request.target_branch_id)
    .bind(request.quantity)
    .bind(request.status)
    .bind(&request.notes)
    .bind(&request.reject_reason)
    .bind(request.created_by)
    .bind(request.approved_by)
    .bind(request.resent_from)
    .bind(request.created_at)
    .bind(request.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// pending → approved_completed
pub async fn mark_approved<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    approved_by: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE transfer_request SET status = ?, approved_by = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(TransferStatus::ApprovedCompleted)
    .bind(approved_by)
    .bind(now)
    .bind(id)
    .bind(TransferStatus::Pending)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// pending → rejected
pub async fn mark_rejected<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    reason: Option<&str>,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE transfer_request SET status = ?, reject_reason = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(TransferStatus::Rejected)
    .bind(reason)
    .bind(now)
    .bind(id)
    .bind(TransferStatus::Pending)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// rejected → resent
pub async fn mark_resent<'e>(executor: impl SqliteExecutor<'e>, id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE transfer_request SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(TransferStatus::Resent)
    .bind(now)
    .bind(id)
    .bind(TransferStatus::Rejected)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
