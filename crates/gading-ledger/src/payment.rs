//! # Payment Ledger
//!
//! Appends payments and recomputes the transaction's paid amount and
//! payment status in the same unit of work.
//!
//! ```text
//! post(tx, method, amount)
//!   │
//!   ├─► lock transaction row ──────────── missing? TransactionMissing
//!   ├─► insert payment (status posted, currency = transaction currency)
//!   ├─► paid = Σ posted payment amounts   (exact decimal, from the rows)
//!   ├─► status = PaymentStatus::derive(paid, total)
//!   └─► write paid_amount + payment_status ─► commit
//! ```
//!
//! `paid_amount` is always recomputed from the rows, never incremented, so
//! the result does not depend on the order payments arrive in.

use std::sync::Arc;

use gading_core::validation::{
    validate_amount_limit, validate_id, validate_notes, validate_payment_amount,
    validate_payment_method,
};
use gading_core::{
    Money, Payment, PaymentRecordStatus, PaymentStatus, PostPaymentInput, TransactionPaymentState,
    ValidationError,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{PaymentError, PaymentResult};
use crate::store::{PaymentRows, Store, TransactionRows, UnitOfWork};

/// Payment posting and listing over a [`Store`].
pub struct PaymentService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> PaymentService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Posts a payment and returns it with the refreshed aggregate.
    ///
    /// `paid_at` defaults to now. A client-supplied currency is ignored.
    pub async fn post(
        &self,
        input: PostPaymentInput,
    ) -> PaymentResult<(Payment, TransactionPaymentState)> {
        let transaction_id = validate_id("transaction_id", &input.transaction_id)?;
        let method = validate_payment_method(&input.method)?;
        let amount = validate_payment_amount(&input.amount)?;
        let sender_name = validate_notes("sender_name", input.sender_name.as_deref())?;
        let reference = validate_notes("reference", input.reference.as_deref())?;
        let note = validate_notes("note", input.note.as_deref())?;

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;

        let transaction = unit
            .lock_transaction(&transaction_id)
            .await?
            .ok_or_else(|| PaymentError::TransactionMissing(transaction_id.clone()))?;

        if let Some(requested) = input.currency.as_deref() {
            if requested.trim() != transaction.currency {
                debug!(
                    transaction_id = %transaction_id,
                    requested = %requested,
                    currency = %transaction.currency,
                    "Ignoring payment currency; using transaction currency"
                );
            }
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.clone(),
            method,
            amount,
            currency: transaction.currency.clone(),
            paid_at: input.paid_at.unwrap_or(now),
            sender_name,
            reference,
            note,
            status: PaymentRecordStatus::Posted,
            created_at: now,
        };
        unit.insert_payment(&payment).await?;

        let paid = unit
            .posted_payment_amounts(&transaction_id)
            .await?
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
            .ok_or_else(|| {
                PaymentError::InvalidInput(ValidationError::InvalidFormat {
                    field: "amount".to_string(),
                    reason: "paid total overflows".to_string(),
                })
            })?;
        let paid = validate_amount_limit("paid_amount", paid)?;
        let payment_status = PaymentStatus::derive(paid, transaction.total_amount);

        unit.write_payment_state(&transaction_id, paid, payment_status, now)
            .await?;
        unit.commit().await?;

        let state = TransactionPaymentState::new(
            transaction_id,
            transaction.currency,
            transaction.total_amount,
            paid,
        );

        info!(
            transaction_id = %state.transaction_id,
            payment_id = %payment.id,
            method = %payment.method,
            amount = %payment.amount,
            paid = %state.paid_amount,
            total = %state.total_amount,
            payment_status = %state.payment_status,
            "Payment posted"
        );

        Ok((payment, state))
    }

    /// Payments of a transaction, newest `paid_at` first.
    pub async fn list(&self, transaction_id: &str) -> PaymentResult<Vec<Payment>> {
        let transaction_id = validate_id("transaction_id", transaction_id)?;
        self.store
            .payments_for(&transaction_id)
            .await?
            .ok_or(PaymentError::TransactionMissing(transaction_id))
    }
}
