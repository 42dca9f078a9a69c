//! Branch Repository (read access + seeding)

use super::{RepoError, RepoResult};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use shared::models::{Branch, BranchCreate};
use sqlx::{SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, name, branch_type, created_at";

pub async fn find_by_id<'e>(executor: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Branch>> {
    let branch = sqlx::query_as::<_, Branch>(&format!("SELECT {COLUMNS} FROM branch WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(branch)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Branch>> {
    let branches = sqlx::query_as::<_, Branch>(&format!("SELECT {COLUMNS} FROM branch ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(branches)
}

pub async fn create(pool: &SqlitePool, data: BranchCreate) -> RepoResult<Branch> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN).map_err(RepoError::Validation)?;

    let branch = Branch {
        id: shared::util::snowflake_id(),
        name: data.name,
        branch_type: data.branch_type,
        created_at: shared::util::now_millis(),
    };
    sqlx::query("INSERT INTO branch (id, name, branch_type, created_at) VALUES (?, ?, ?, ?)")
        .bind(branch.id)
        .bind(&branch.name)
        .bind(branch.branch_type)
        .bind(branch.created_at)
        .execute(pool)
        .await?;
    Ok(branch)
}
