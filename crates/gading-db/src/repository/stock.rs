//! Stock rows: base-unit lines of a transaction and locked counters.

use gading_core::{StockLevel, StockLine};
use sqlx::PgConnection;

use crate::error::{DbError, DbResult};
use crate::repository::rows::{StockLevelRow, StockLineRow};

/// Items of a transaction with the stock-tracked product each one draws on.
pub(crate) async fn stock_lines(
    conn: &mut PgConnection,
    transaction_id: &str,
) -> DbResult<Vec<StockLine>> {
    let rows: Vec<StockLineRow> = sqlx::query_as(
        r#"
        SELECT ti.product_id::text AS product_id,
               COALESCE(p.base_product_id, p.id)::text AS stock_product_id,
               ti.qty,
               p.pack_size
        FROM transaction_items ti
        JOIN products p ON p.id = ti.product_id
        WHERE ti.transaction_id = $1::uuid
        ORDER BY ti.seq
        "#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// `SELECT ... FOR UPDATE` on one product row.
pub(crate) async fn lock_stock(
    conn: &mut PgConnection,
    product_id: &str,
) -> DbResult<Option<StockLevel>> {
    let row: Option<StockLevelRow> = sqlx::query_as(
        r#"
        SELECT id::text AS product_id, stock_on_hand, stock_reserved
        FROM products
        WHERE id = $1::uuid
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(StockLevel::try_from).transpose()
}

pub(crate) async fn write_stock(conn: &mut PgConnection, level: &StockLevel) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_on_hand = $2,
            stock_reserved = $3,
            updated_at = now()
        WHERE id = $1::uuid
        "#,
    )
    .bind(&level.product_id)
    .bind(level.on_hand)
    .bind(level.reserved)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", level.product_id.clone()));
    }
    Ok(())
}
