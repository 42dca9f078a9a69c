//! Inventory Repository
//!
//! Every write is a single conditional statement with `RETURNING`, so a
//! transaction that starts with one of these takes the SQLite write lock
//! immediately and the non-negativity guard holds across processes.

use super::{RepoError, RepoResult};
use shared::models::InventoryRecord;
use sqlx::{SqliteConnection, SqliteExecutor};

const COLUMNS: &str = "product_id, branch_id, quantity, min_stock, updated_at";

pub async fn find<'e>(
    executor: impl SqliteExecutor<'e>,
    product_id: i64,
    branch_id: i64,
) -> RepoResult<Option<InventoryRecord>> {
    let record = sqlx::query_as::<_, InventoryRecord>(&format!(
        "SELECT {COLUMNS} FROM inventory WHERE product_id = ? AND branch_id = ?"
    ))
    .bind(product_id)
    .bind(branch_id)
    .fetch_optional(executor)
    .await?;
    Ok(record)
}

/// Existing record, or a freshly inserted zero-quantity one
pub async fn insert_if_missing(
    conn: &mut SqliteConnection,
    product_id: i64,
    branch_id: i64,
    now: i64,
) -> RepoResult<InventoryRecord> {
    sqlx::query(
        "INSERT INTO inventory (product_id, branch_id, quantity, min_stock, updated_at) VALUES (?, ?, 0, 0, ?) ON CONFLICT(product_id, branch_id) DO NOTHING",
    )
    .bind(product_id)
    .bind(branch_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find(&mut *conn, product_id, branch_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create inventory record".into()))
}

/// Guarded decrement. Returns `(quantity, min_stock)` after the write, or
/// `None` when the row is missing or holds less than `amount`.
pub async fn decrement(
    conn: &mut SqliteConnection,
    product_id: i64,
    branch_id: i64,
    amount: i64,
    now: i64,
) -> RepoResult<Option<(i64, i64)>> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "UPDATE inventory SET quantity = quantity - ?1, updated_at = ?2 WHERE product_id = ?3 AND branch_id = ?4 AND quantity >= ?1 RETURNING quantity, min_stock",
    )
    .bind(amount)
    .bind(now)
    .bind(product_id)
    .bind(branch_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Upserting increment. Returns `(quantity, min_stock)` after the write.
pub async fn increment(
    conn: &mut SqliteConnection,
    product_id: i64,
    branch_id: i64,
    amount: i64,
    now: i64,
) -> RepoResult<(i64, i64)> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "INSERT INTO inventory (product_id, branch_id, quantity, min_stock, updated_at) VALUES (?1, ?2, ?3, 0, ?4) \
         ON CONFLICT(product_id, branch_id) DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at \
         RETURNING quantity, min_stock",
    )
    .bind(product_id)
    .bind(branch_id)
    .bind(amount)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Upserting min stock write (creates the record with quantity 0 if absent)
pub async fn set_min_stock<'e>(
    executor: impl SqliteExecutor<'e>,
    product_id: i64,
    branch_id: i64,
    min_stock: i64,
    now: i64,
) -> RepoResult<InventoryRecord> {
    let record = sqlx::query_as::<_, InventoryRecord>(&format!(
        "INSERT INTO inventory (product_id, branch_id, quantity, min_stock, updated_at) VALUES (?1, ?2, 0, ?3, ?4) \
         ON CONFLICT(product_id, branch_id) DO UPDATE SET min_stock = excluded.min_stock, updated_at = excluded.updated_at \
         RETURNING {COLUMNS}"
    ))
    .bind(product_id)
    .bind(branch_id)
    .bind(min_stock)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(record)
}
