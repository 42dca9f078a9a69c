//! Sale Repository

use super::RepoResult;
use shared::models::{Sale, SaleLine};
use sqlx::SqliteConnection;

pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> RepoResult<()> {
    sqlx::query("INSERT INTO sale (id, branch_id, created_by, created_at) VALUES (?, ?, ?, ?)")
        .bind(sale.id)
        .bind(sale.branch_id)
        .bind(sale.created_by)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO sale_line (id, sale_id, product_id, quantity, remaining) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(line.id)
    .bind(line.sale_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.remaining)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
