//! # Stock Ledger
//!
//! Reserve, commit and release a transaction's base-unit stock.
//!
//! ## Shared shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. stock_lines(tx)      items ⋈ stock rules                            │
//! │  2. StockPlan            qty × pack_size, summed per base product       │
//! │  3. for each base product in ascending id order:                        │
//! │       lock_stock ──► check ──► write_stock                              │
//! │                                                                         │
//! │  reserve: on_hand - reserved >= required   reserved += required         │
//! │  commit:  reserved >= required,            on_hand  -= required         │
//! │           on_hand  >= required             reserved -= required         │
//! │  release: reserved >= required             reserved -= required         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These functions only ever run inside a unit of work opened by a service,
//! together with the status write that triggered them. A failure on any
//! product leaves earlier writes to be discarded with the unit.

use gading_core::{StockEffect, StockPlan};
use tracing::{debug, warn};

use crate::error::{TransactionError, TransactionResult};
use crate::store::StockRows;

/// Holds stock for every line of the transaction.
pub async fn reserve<U>(unit: &mut U, transaction_id: &str) -> TransactionResult<StockPlan>
where
    U: StockRows + ?Sized,
{
    apply(unit, transaction_id, StockEffect::Reserve).await
}

/// Deducts reserved stock from on-hand.
pub async fn commit<U>(unit: &mut U, transaction_id: &str) -> TransactionResult<StockPlan>
where
    U: StockRows + ?Sized,
{
    apply(unit, transaction_id, StockEffect::Commit).await
}

/// Returns reserved stock to available.
pub async fn release<U>(unit: &mut U, transaction_id: &str) -> TransactionResult<StockPlan>
where
    U: StockRows + ?Sized,
{
    apply(unit, transaction_id, StockEffect::Release).await
}

/// Runs the stock operation for `effect`. `StockEffect::None` touches nothing.
pub async fn apply<U>(
    unit: &mut U,
    transaction_id: &str,
    effect: StockEffect,
) -> TransactionResult<StockPlan>
where
    U: StockRows + ?Sized,
{
    if effect == StockEffect::None {
        return Ok(StockPlan::default());
    }

    let lines = unit.stock_lines(transaction_id).await?;
    let plan = StockPlan::from_lines(&lines).map_err(|e| {
        warn!(transaction_id = %transaction_id, error = %e, "Stock plan rejected");
        TransactionError::from(e)
    })?;

    for (stock_product_id, required) in plan.iter() {
        let level = unit
            .lock_stock(stock_product_id)
            .await?
            .ok_or_else(|| TransactionError::ProductMissing(stock_product_id.to_string()))?;

        let next = match effect {
            StockEffect::Reserve => level.reserve(required),
            StockEffect::Commit => level.commit(required),
            StockEffect::Release => level.release(required),
            StockEffect::None => Ok(level.clone()),
        }
        .map_err(|e| {
            warn!(
                transaction_id = %transaction_id,
                product_id = %stock_product_id,
                on_hand = level.on_hand,
                reserved = level.reserved,
                required,
                operation = ?effect,
                "Stock operation rejected"
            );
            TransactionError::from(e)
        })?;

        unit.write_stock(&next).await?;

        debug!(
            transaction_id = %transaction_id,
            product_id = %stock_product_id,
            operation = ?effect,
            required,
            on_hand = next.on_hand,
            reserved = next.reserved,
            "Stock updated"
        );
    }

    Ok(plan)
}
