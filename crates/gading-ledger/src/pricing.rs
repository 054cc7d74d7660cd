//! Pricing Resolver.
//!
//! Runs inside the caller's unit of work so the price read belongs to the
//! same atomic operation as the rows priced with it.

use chrono::{DateTime, Utc};
use gading_core::pricing::select_effective_price;
use gading_core::Money;
use tracing::debug;

use crate::error::{TransactionError, TransactionResult};
use crate::store::CatalogReader;

/// The price that applies to one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub price_id: String,
    pub currency: String,
    pub unit_amount: Money,
}

/// Resolves `(currency, unit_amount)` for a product and optional customer
/// category at `now`.
///
/// Fails with `PriceMissing` when neither the category tier nor the default
/// tier has a row valid at `now`.
pub async fn resolve<U>(
    unit: &mut U,
    product_id: &str,
    category_id: Option<&str>,
    now: DateTime<Utc>,
) -> TransactionResult<ResolvedPrice>
where
    U: CatalogReader + ?Sized,
{
    let candidates = unit.price_candidates(product_id, category_id, now).await?;

    let price = select_effective_price(&candidates, category_id, now).ok_or_else(|| {
        TransactionError::PriceMissing {
            product_id: product_id.to_string(),
        }
    })?;

    debug!(
        product_id = %product_id,
        price_id = %price.id,
        category_id = ?price.category_id,
        amount = %price.amount,
        "Resolved price"
    );

    Ok(ResolvedPrice {
        price_id: price.id.clone(),
        currency: price.currency.clone(),
        unit_amount: price.amount,
    })
}
