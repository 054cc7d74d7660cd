//! Payment rows and the transaction's payment aggregate.

use chrono::{DateTime, Utc};
use gading_core::{Money, Payment, PaymentRecordStatus, PaymentStatus};
use sqlx::PgConnection;

use crate::error::{DbError, DbResult};
use crate::repository::rows::PaymentRow;

pub(crate) async fn insert_payment(conn: &mut PgConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, transaction_id, method, amount, currency, paid_at,
            sender_name, reference, note, status, created_at
        ) VALUES (
            $1::uuid, $2::uuid, $3, $4, $5, $6,
            $7, $8, $9, $10, $11
        )
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.transaction_id)
    .bind(payment.method.as_str())
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.paid_at)
    .bind(&payment.sender_name)
    .bind(&payment.reference)
    .bind(&payment.note)
    .bind(payment.status.as_str())
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn posted_amounts(
    conn: &mut PgConnection,
    transaction_id: &str,
) -> DbResult<Vec<Money>> {
    let amounts = sqlx::query_scalar(
        "SELECT amount FROM payments WHERE transaction_id = $1::uuid AND status = $2",
    )
    .bind(transaction_id)
    .bind(PaymentRecordStatus::Posted.as_str())
    .fetch_all(&mut *conn)
    .await?;
    Ok(amounts)
}

pub(crate) async fn write_payment_state(
    conn: &mut PgConnection,
    transaction_id: &str,
    paid_amount: Money,
    payment_status: PaymentStatus,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET paid_amount = $2,
            payment_status = $3,
            updated_at = $4
        WHERE id = $1::uuid
        "#,
    )
    .bind(transaction_id)
    .bind(paid_amount)
    .bind(payment_status.as_str())
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Transaction", transaction_id));
    }
    Ok(())
}

/// Newest `paid_at` first, then newest insert.
pub(crate) async fn list_for(conn: &mut PgConnection, transaction_id: &str) -> DbResult<Vec<Payment>> {
    let rows: Vec<PaymentRow> = sqlx::query_as(
        r#"
        SELECT id::text AS id, transaction_id::text AS transaction_id, method, amount,
               currency, paid_at, sender_name, reference, note, status, created_at
        FROM payments
        WHERE transaction_id = $1::uuid
        ORDER BY paid_at DESC, created_at DESC, seq DESC
        "#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Payment::try_from).collect()
}
