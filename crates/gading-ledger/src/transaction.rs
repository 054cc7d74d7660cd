//! # Transaction State Machine
//!
//! Creates transactions and moves them through their lifecycle, invoking the
//! Stock Ledger for every edge that needs it.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create        validate ─► customer ─► price each line ─► one currency │
//! │                ─► insert header + items ─► reserve [─► commit]         │
//! │                                                                         │
//! │  update_status lock tx ─► legal edge? ─► reserve|release|commit|none   │
//! │                ─► write status                                          │
//! │                                                                         │
//! │  fulfill       lock tx ─► must be pending ─► commit ─► completed       │
//! │                                                                         │
//! │  each of the above is ONE unit of work: all of it persists or none     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock order inside a unit is always the transaction row first, then stock
//! rows in ascending product id.

use std::sync::Arc;

use gading_core::validation::{
    normalize_list_input, validate_amount_limit, validate_create_input, validate_id,
};
use gading_core::{
    CreateTransactionInput, ListTransactionsInput, Money, PaymentStatus, StockEffect, Transaction,
    TransactionDetail, TransactionItem, TransactionStatus, TransactionView, ValidationError,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{TransactionError, TransactionResult};
use crate::store::{CatalogReader, Store, TransactionRows, UnitOfWork};
use crate::{pricing, stock_ledger};

/// Parses status text, reporting unknown values as `InvalidStatus`.
pub fn parse_status(value: &str) -> TransactionResult<TransactionStatus> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "status".to_string(),
        }
        .into());
    }
    value
        .parse()
        .map_err(|_| TransactionError::InvalidStatus(value.trim().to_string()))
}

fn amount_overflow(index: usize) -> TransactionError {
    TransactionError::InvalidInput(ValidationError::InvalidFormat {
        field: format!("items[{index}].qty"),
        reason: "line total overflows".to_string(),
    })
}

// =============================================================================
// Transaction Service
// =============================================================================

/// Transaction lifecycle operations over a [`Store`].
pub struct TransactionService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> TransactionService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a transaction in `input.status` (default draft).
    ///
    /// Prices every line at the current instant using the customer's
    /// category. A `pending` transaction reserves stock; a `completed` one
    /// reserves and then commits.
    pub async fn create(&self, input: CreateTransactionInput) -> TransactionResult<TransactionDetail> {
        let input = validate_create_input(&input)?;
        let status = input.status.unwrap_or_default();
        if !status.is_valid_initial() {
            return Err(TransactionError::InvalidStatus(status.to_string()));
        }

        let now = self.clock.now();
        let transaction_id = Uuid::new_v4().to_string();
        let mut unit = self.store.begin().await?;

        let customer = unit
            .customer(&input.customer_id)
            .await?
            .ok_or_else(|| TransactionError::CustomerMissing(input.customer_id.clone()))?;

        let mut currency: Option<String> = None;
        let mut total = Money::zero();
        let mut items = Vec::with_capacity(input.items.len());

        for (index, line) in input.items.iter().enumerate() {
            if !unit.product_exists(&line.product_id).await? {
                return Err(TransactionError::ProductMissing(line.product_id.clone()));
            }

            let price = pricing::resolve(
                &mut unit,
                &line.product_id,
                customer.category_id.as_deref(),
                now,
            )
            .await?;

            let expected = currency.get_or_insert_with(|| price.currency.clone());
            if *expected != price.currency {
                warn!(
                    customer_id = %customer.id,
                    expected = %expected,
                    found = %price.currency,
                    "Mixed currencies rejected"
                );
                return Err(TransactionError::MultiCurrency {
                    expected: expected.clone(),
                    found: price.currency,
                });
            }

            let line_total = price
                .unit_amount
                .checked_mul_qty(line.qty)
                .ok_or_else(|| amount_overflow(index))?;
            validate_amount_limit(&format!("items[{index}].line_total"), line_total)?;
            total = total.checked_add(line_total).ok_or_else(|| amount_overflow(index))?;
            validate_amount_limit("total_amount", total)?;

            items.push(TransactionItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.clone(),
                product_id: line.product_id.clone(),
                qty: line.qty,
                unit_amount: price.unit_amount,
                line_total,
                created_at: now,
            });
        }

        let currency = currency.ok_or_else(|| {
            TransactionError::InvalidInput(ValidationError::Required {
                field: "items".to_string(),
            })
        })?;

        let transaction = Transaction {
            id: transaction_id.clone(),
            customer_id: customer.id.clone(),
            status,
            currency,
            total_amount: total,
            paid_amount: Money::zero(),
            payment_status: PaymentStatus::Unpaid,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        unit.insert_transaction(&transaction).await?;
        for item in &items {
            unit.insert_item(item).await?;
        }

        for effect in StockEffect::on_create(status) {
            stock_ledger::apply(&mut unit, &transaction_id, *effect).await?;
        }

        unit.commit().await?;

        info!(
            transaction_id = %transaction.id,
            customer_id = %transaction.customer_id,
            status = %transaction.status,
            total = %transaction.total_amount,
            currency = %transaction.currency,
            items = items.len(),
            "Transaction created"
        );

        Ok(TransactionDetail { transaction, items })
    }

    // =========================================================================
    // Status Changes
    // =========================================================================

    /// Moves a transaction along one edge of the status graph, applying the
    /// edge's stock operation in the same unit.
    pub async fn update_status(&self, id: &str, to: TransactionStatus) -> TransactionResult<Transaction> {
        let id = validate_id("id", id)?;
        let mut unit = self.store.begin().await?;

        let current = Self::lock(&mut unit, &id).await?;
        let effect = StockEffect::for_transition(current.status, to).ok_or_else(|| {
            warn!(
                transaction_id = %id,
                from = %current.status,
                to = %to,
                "Illegal status transition"
            );
            TransactionError::InvalidTransition {
                from: current.status,
                to,
            }
        })?;

        stock_ledger::apply(&mut unit, &id, effect).await?;
        let updated = unit.write_status(&id, to, self.clock.now()).await?;
        unit.commit().await?;

        info!(
            transaction_id = %id,
            from = %current.status,
            to = %to,
            stock = ?effect,
            "Transaction status changed"
        );

        Ok(updated)
    }

    /// Commits the stock of a pending transaction and marks it completed.
    ///
    /// Sufficiency is re-checked under lock even though the stock was
    /// reserved earlier.
    pub async fn fulfill(&self, id: &str) -> TransactionResult<Transaction> {
        let id = validate_id("id", id)?;
        let mut unit = self.store.begin().await?;

        let current = Self::lock(&mut unit, &id).await?;
        match current.status {
            TransactionStatus::Completed => {
                return Err(TransactionError::AlreadyFulfilled(id));
            }
            TransactionStatus::Cancelled => {
                return Err(TransactionError::TransactionCanceled(id));
            }
            TransactionStatus::Draft => {
                warn!(transaction_id = %id, "Fulfill requested for draft transaction");
                return Err(TransactionError::InvalidTransition {
                    from: TransactionStatus::Draft,
                    to: TransactionStatus::Completed,
                });
            }
            TransactionStatus::Pending => {}
        }

        stock_ledger::commit(&mut unit, &id).await?;
        let updated = unit
            .write_status(&id, TransactionStatus::Completed, self.clock.now())
            .await?;
        unit.commit().await?;

        info!(transaction_id = %id, "Transaction fulfilled");

        Ok(updated)
    }

    async fn lock(unit: &mut S::Unit, id: &str) -> TransactionResult<Transaction> {
        unit.lock_transaction(id)
            .await?
            .ok_or_else(|| TransactionError::TransactionMissing(id.to_string()))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Header and items.
    pub async fn get(&self, id: &str) -> TransactionResult<TransactionDetail> {
        let id = validate_id("id", id)?;
        self.store
            .find_transaction(&id)
            .await?
            .ok_or(TransactionError::TransactionMissing(id))
    }

    /// Newest first. Out-of-range paging is clamped rather than rejected.
    pub async fn list(&self, input: ListTransactionsInput) -> TransactionResult<Vec<Transaction>> {
        let input = normalize_list_input(input);
        Ok(self.store.list_transactions(input).await?)
    }

    /// Header with customer name, items with product details, payments and
    /// balance due.
    pub async fn view(&self, id: &str) -> TransactionResult<TransactionView> {
        let id = validate_id("id", id)?;
        self.store
            .transaction_view(&id)
            .await?
            .ok_or(TransactionError::TransactionMissing(id))
    }
}
