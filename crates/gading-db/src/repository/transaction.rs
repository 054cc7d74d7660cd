//! # Transaction Queries
//!
//! Headers, items, listing and the composite view.
//!
//! ## View
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions t ── JOIN customers c      → header + customer_name      │
//! │  transaction_items ti ── JOIN products p → items with sku / name       │
//! │  payments                                → newest paid_at first        │
//! │                                                                         │
//! │  balance_due = total_amount - paid_amount (exact decimal)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use gading_core::{
    ListTransactionsInput, Transaction, TransactionItem, TransactionStatus, TransactionView,
    TransactionViewItem,
};
use sqlx::PgConnection;

use crate::error::{DbError, DbResult};
use crate::repository::payment;
use crate::repository::rows::{ItemRow, TransactionRow, ViewHeaderRow, ViewItemRow};

const SELECT_TRANSACTION: &str = r#"
    SELECT id::text AS id, customer_id::text AS customer_id, status, currency,
           total_amount, paid_amount, payment_status, notes, created_at, updated_at
    FROM transactions
"#;

const SELECT_ITEMS: &str = r#"
    SELECT id::text AS id, transaction_id::text AS transaction_id,
           product_id::text AS product_id, qty, unit_amount, line_total, created_at
    FROM transaction_items
    WHERE transaction_id = $1::uuid
    ORDER BY seq
"#;

pub(crate) async fn insert_transaction(conn: &mut PgConnection, tx: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, customer_id, status, currency,
            total_amount, paid_amount, payment_status, notes,
            created_at, updated_at
        ) VALUES (
            $1::uuid, $2::uuid, $3, $4,
            $5, $6, $7, $8,
            $9, $10
        )
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.customer_id)
    .bind(tx.status.as_str())
    .bind(&tx.currency)
    .bind(tx.total_amount)
    .bind(tx.paid_amount)
    .bind(tx.payment_status.as_str())
    .bind(&tx.notes)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn insert_item(conn: &mut PgConnection, item: &TransactionItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_items (
            id, transaction_id, product_id, qty, unit_amount, line_total, created_at
        ) VALUES ($1::uuid, $2::uuid, $3::uuid, $4, $5, $6, $7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.transaction_id)
    .bind(&item.product_id)
    .bind(item.qty)
    .bind(item.unit_amount)
    .bind(item.line_total)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Reads a header, optionally taking its row lock.
pub(crate) async fn fetch_transaction(
    conn: &mut PgConnection,
    id: &str,
    for_update: bool,
) -> DbResult<Option<Transaction>> {
    let sql = if for_update {
        format!("{SELECT_TRANSACTION} WHERE id = $1::uuid FOR UPDATE")
    } else {
        format!("{SELECT_TRANSACTION} WHERE id = $1::uuid")
    };

    let row: Option<TransactionRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Transaction::try_from).transpose()
}

pub(crate) async fn write_status(
    conn: &mut PgConnection,
    id: &str,
    status: TransactionStatus,
    at: DateTime<Utc>,
) -> DbResult<Transaction> {
    let row: Option<TransactionRow> = sqlx::query_as(
        r#"
        UPDATE transactions
        SET status = $2,
            updated_at = $3
        WHERE id = $1::uuid
        RETURNING id::text AS id, customer_id::text AS customer_id, status, currency,
                  total_amount, paid_amount, payment_status, notes, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(at)
    .fetch_optional(&mut *conn)
    .await?;

    row.ok_or_else(|| DbError::not_found("Transaction", id))?
        .try_into()
}

pub(crate) async fn items(conn: &mut PgConnection, id: &str) -> DbResult<Vec<TransactionItem>> {
    let rows: Vec<ItemRow> = sqlx::query_as(SELECT_ITEMS)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Newest first. `input` is expected to be normalized already.
pub(crate) async fn list(
    conn: &mut PgConnection,
    input: ListTransactionsInput,
) -> DbResult<Vec<Transaction>> {
    let sql = format!(
        "{SELECT_TRANSACTION} WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    );

    let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.limit)
        .bind(input.offset)
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(Transaction::try_from).collect()
}

pub(crate) async fn view(conn: &mut PgConnection, id: &str) -> DbResult<Option<TransactionView>> {
    let header: Option<ViewHeaderRow> = sqlx::query_as(
        r#"
        SELECT t.id::text AS id, t.customer_id::text AS customer_id, t.status, t.currency,
               t.total_amount, t.paid_amount, t.payment_status, t.notes,
               t.created_at, t.updated_at,
               TRIM(c.first_name || ' ' || c.last_name) AS customer_name,
               c.category_id::text AS category_id
        FROM transactions t
        JOIN customers c ON c.id = t.customer_id
        WHERE t.id = $1::uuid
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let items: Vec<ViewItemRow> = sqlx::query_as(
        r#"
        SELECT ti.product_id::text AS product_id, p.sku, p.name AS product_name,
               ti.qty, ti.unit_amount, ti.line_total
        FROM transaction_items ti
        JOIN products p ON p.id = ti.product_id
        WHERE ti.transaction_id = $1::uuid
        ORDER BY ti.seq
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let payments = payment::list_for(conn, id).await?;
    let items = items.into_iter().map(TransactionViewItem::from).collect();

    header.into_view(items, payments).map(Some)
}
