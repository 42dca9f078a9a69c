//! User ↔ Branch assignment Repository

use super::RepoResult;
use shared::models::{AssignmentCreate, Role, UserBranchAssignment};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, user_id, branch_id, role, is_main_admin, is_active";

/// First active assignment of a user (lowest id). This row alone governs
/// authorization.
pub async fn find_primary_active<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> RepoResult<Option<UserBranchAssignment>> {
    let row = sqlx::query_as::<_, UserBranchAssignment>(&format!(
        "SELECT {COLUMNS} FROM user_branch_assignment WHERE user_id = ? AND is_active = 1 ORDER BY id LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Active assignments at `branch_id` whose role is in `roles`. May contain
/// several rows for one user.
pub async fn find_active_by_branch_roles(
    pool: &SqlitePool,
    branch_id: i64,
    roles: &[Role],
) -> RepoResult<Vec<UserBranchAssignment>> {
    if roles.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM user_branch_assignment WHERE is_active = 1 AND branch_id = "
    ));
    qb.push_bind(branch_id);
    qb.push(" AND role IN (");
    let mut separated = qb.separated(", ");
    for role in roles {
        separated.push_bind(*role);
    }
    separated.push_unseparated(") ORDER BY id");

    let rows = qb
        .build_query_as::<UserBranchAssignment>()
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Ids are assigned by SQLite (monotonic rowid) so "lowest id" means
/// "assigned first".
pub async fn create(pool: &SqlitePool, data: AssignmentCreate) -> RepoResult<UserBranchAssignment> {
    let row = sqlx::query_as::<_, UserBranchAssignment>(&format!(
        "INSERT INTO user_branch_assignment (user_id, branch_id, role, is_main_admin, is_active) VALUES (?, ?, ?, ?, 1) RETURNING {COLUMNS}"
    ))
    .bind(data.user_id)
    .bind(data.branch_id)
    .bind(data.role)
    .bind(data.is_main_admin)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE user_branch_assignment SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
