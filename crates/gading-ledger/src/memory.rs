//! # In-Memory Store
//!
//! A complete [`Store`] held in process memory, used by the engine's tests
//! and for demos without a database.
//!
//! ## Isolation model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryStore ── Arc<Mutex<State>>                                       │
//! │                                                                         │
//! │  begin()  ──► lock_owned() ──► MemoryUnit { guard, working: clone }     │
//! │                  │                    │                                 │
//! │                  │ other units wait   ├─ writes go to `working`         │
//! │                  ▼                    │                                 │
//! │             commit(self)  ──────────► *guard = working                  │
//! │             drop(self)    ──────────► working discarded (rollback)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A unit holds the whole store, which linearizes every unit. That is a
//! coarser lock than the per-row locks of the PostgreSQL store, and it gives
//! the same guarantees for operations on shared rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gading_core::{
    Customer, Decimal, ListTransactionsInput, Money, Payment, PaymentRecordStatus, PaymentStatus,
    ProductPrice, ProductStock, StockLevel, StockLine, StockRule, Transaction, TransactionDetail,
    TransactionItem, TransactionStatus, TransactionView, TransactionViewItem, TransactionViewPayment,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{CatalogReader, PaymentRows, StockRows, Store, TransactionRows, UnitOfWork};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Default)]
struct State {
    customers: HashMap<String, Customer>,
    products: BTreeMap<String, ProductStock>,
    prices: Vec<ProductPrice>,
    transactions: HashMap<String, Transaction>,
    items: Vec<TransactionItem>,
    payments: Vec<Payment>,
}

impl State {
    fn items_of(&self, transaction_id: &str) -> Vec<TransactionItem> {
        self.items
            .iter()
            .filter(|i| i.transaction_id == transaction_id)
            .cloned()
            .collect()
    }

    fn payments_of(&self, transaction_id: &str) -> Vec<Payment> {
        // Newest insert first on equal timestamps
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .rev()
            .filter(|p| p.transaction_id == transaction_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| {
            b.paid_at
                .cmp(&a.paid_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        payments
    }

    fn stock_rule(&self, product_id: &str) -> Option<StockRule> {
        self.products.get(product_id).map(|p| StockRule {
            product_id: p.id.clone(),
            stock_product_id: p.stock_product_id().to_string(),
            pack_size: p.pack_size,
        })
    }

    fn view(&self, id: &str) -> Option<TransactionView> {
        let tx = self.transactions.get(id)?;
        let customer = self.customers.get(&tx.customer_id);

        let items = self
            .items_of(id)
            .into_iter()
            .map(|item| {
                let product = self.products.get(&item.product_id);
                TransactionViewItem {
                    product_id: item.product_id,
                    sku: product.and_then(|p| p.sku.clone()),
                    product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                    qty: item.qty,
                    unit_amount: item.unit_amount,
                    line_total: item.line_total,
                }
            })
            .collect();

        Some(TransactionView {
            id: tx.id.clone(),
            customer_id: tx.customer_id.clone(),
            customer_name: customer.map(Customer::display_name).unwrap_or_default(),
            category_id: customer.and_then(|c| c.category_id.clone()),
            status: tx.status,
            currency: tx.currency.clone(),
            total_amount: tx.total_amount,
            paid_amount: tx.paid_amount,
            payment_status: tx.payment_status,
            balance_due: tx.balance_due(),
            notes: tx.notes.clone(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            items,
            payments: self
                .payments_of(id)
                .into_iter()
                .map(TransactionViewPayment::from)
                .collect(),
        })
    }
}

fn missing(entity: &str, id: &str) -> StoreError {
    StoreError::Internal(format!("{entity} {id} does not exist"))
}

// =============================================================================
// Memory Store
// =============================================================================

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Seeding helpers
    // -------------------------------------------------------------------------

    pub async fn insert_customer(
        &self,
        first_name: &str,
        last_name: &str,
        category_id: Option<&str>,
    ) -> Customer {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            category_id: category_id.map(String::from),
        };
        self.state
            .lock()
            .await
            .customers
            .insert(customer.id.clone(), customer.clone());
        customer
    }

    /// A stock-tracked product with `on_hand` base units and nothing reserved.
    pub async fn insert_product(&self, sku: &str, name: &str, on_hand: i64) -> ProductStock {
        let product = ProductStock {
            id: Uuid::new_v4().to_string(),
            sku: Some(sku.to_string()),
            name: name.to_string(),
            is_active: true,
            stock_on_hand: on_hand.max(0),
            stock_reserved: 0,
            base_product_id: None,
            pack_size: Decimal::ONE,
        };
        self.put_product(product).await
    }

    /// A sellable variant whose stock lives on `base_product_id`.
    pub async fn insert_pack_product(
        &self,
        sku: &str,
        name: &str,
        base_product_id: &str,
        pack_size: Decimal,
    ) -> ProductStock {
        let product = ProductStock {
            id: Uuid::new_v4().to_string(),
            sku: Some(sku.to_string()),
            name: name.to_string(),
            is_active: true,
            stock_on_hand: 0,
            stock_reserved: 0,
            base_product_id: Some(base_product_id.to_string()),
            pack_size,
        };
        self.put_product(product).await
    }

    async fn put_product(&self, product: ProductStock) -> ProductStock {
        self.state
            .lock()
            .await
            .products
            .insert(product.id.clone(), product.clone());
        product
    }

    pub async fn set_product_active(&self, product_id: &str, active: bool) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| missing("product", product_id))?;
        product.is_active = active;
        Ok(())
    }

    pub async fn insert_price(
        &self,
        product_id: &str,
        category_id: Option<&str>,
        currency: &str,
        amount: Money,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> ProductPrice {
        let price = ProductPrice {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            category_id: category_id.map(String::from),
            currency: currency.to_string(),
            amount,
            valid_from,
            valid_to,
            created_at: valid_from,
        };
        self.state.lock().await.prices.push(price.clone());
        price
    }

    /// Admin edit of on-hand stock. Refuses to go below what is reserved.
    pub async fn set_on_hand(&self, product_id: &str, on_hand: i64) -> StoreResult<StockLevel> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| missing("product", product_id))?;
        let level = StockLevel::new(product_id, on_hand, product.stock_reserved)
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        product.stock_on_hand = level.on_hand;
        Ok(level)
    }

    /// Current counters of a product.
    pub async fn stock_of(&self, product_id: &str) -> Option<StockLevel> {
        let state = self.state.lock().await;
        state.products.get(product_id).map(|p| StockLevel {
            product_id: p.id.clone(),
            on_hand: p.stock_on_hand,
            reserved: p.stock_reserved,
        })
    }

    /// `(transactions, items, payments)` row counts.
    pub async fn row_counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().await;
        (
            state.transactions.len(),
            state.items.len(),
            state.payments.len(),
        )
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> StoreResult<MemoryUnit> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit { guard, working })
    }

    async fn find_transaction(&self, id: &str) -> StoreResult<Option<TransactionDetail>> {
        let state = self.state.lock().await;
        Ok(state.transactions.get(id).map(|tx| TransactionDetail {
            transaction: tx.clone(),
            items: state.items_of(id),
        }))
    }

    async fn list_transactions(&self, input: ListTransactionsInput) -> StoreResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|tx| input.status.map_or(true, |s| tx.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(input.offset).unwrap_or(0))
            .take(usize::try_from(input.limit).unwrap_or(0))
            .collect())
    }

    async fn transaction_view(&self, id: &str) -> StoreResult<Option<TransactionView>> {
        Ok(self.state.lock().await.view(id))
    }

    async fn payments_for(&self, transaction_id: &str) -> StoreResult<Option<Vec<Payment>>> {
        let state = self.state.lock().await;
        if !state.transactions.contains_key(transaction_id) {
            return Ok(None);
        }
        Ok(Some(state.payments_of(transaction_id)))
    }
}

// =============================================================================
// Memory Unit
// =============================================================================

/// Unit of work over a private copy of the store.
pub struct MemoryUnit {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn commit(self) -> StoreResult<()> {
        let MemoryUnit { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl CatalogReader for MemoryUnit {
    async fn customer(&mut self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(self.working.customers.get(id).cloned())
    }

    async fn product_exists(&mut self, id: &str) -> StoreResult<bool> {
        Ok(self.working.products.get(id).is_some_and(|p| p.is_active))
    }

    async fn price_candidates(
        &mut self,
        product_id: &str,
        category_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ProductPrice>> {
        Ok(self
            .working
            .prices
            .iter()
            .filter(|p| p.product_id == product_id)
            .filter(|p| p.category_id.is_none() || p.category_id.as_deref() == category_id)
            .filter(|p| p.is_valid_at(now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StockRows for MemoryUnit {
    async fn stock_lines(&mut self, transaction_id: &str) -> StoreResult<Vec<StockLine>> {
        self.working
            .items_of(transaction_id)
            .into_iter()
            .map(|item| {
                let rule = self
                    .working
                    .stock_rule(&item.product_id)
                    .ok_or_else(|| missing("product", &item.product_id))?;
                Ok(StockLine::new(&rule, item.qty))
            })
            .collect()
    }

    async fn lock_stock(&mut self, stock_product_id: &str) -> StoreResult<Option<StockLevel>> {
        self.working
            .products
            .get(stock_product_id)
            .map(|p| StockLevel::new(p.id.clone(), p.stock_on_hand, p.stock_reserved))
            .transpose()
            .map_err(|e| StoreError::Internal(e.to_string()))
    }

    async fn write_stock(&mut self, level: &StockLevel) -> StoreResult<()> {
        let product = self
            .working
            .products
            .get_mut(&level.product_id)
            .ok_or_else(|| missing("product", &level.product_id))?;
        product.stock_on_hand = level.on_hand;
        product.stock_reserved = level.reserved;
        Ok(())
    }
}

#[async_trait]
impl TransactionRows for MemoryUnit {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        if !self.working.customers.contains_key(&transaction.customer_id) {
            return Err(missing("customer", &transaction.customer_id));
        }
        if self.working.transactions.contains_key(&transaction.id) {
            return Err(StoreError::Internal(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.working
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn insert_item(&mut self, item: &TransactionItem) -> StoreResult<()> {
        if !self.working.transactions.contains_key(&item.transaction_id) {
            return Err(missing("transaction", &item.transaction_id));
        }
        if !self.working.products.contains_key(&item.product_id) {
            return Err(missing("product", &item.product_id));
        }
        self.working.items.push(item.clone());
        Ok(())
    }

    async fn lock_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>> {
        Ok(self.working.transactions.get(id).cloned())
    }

    async fn write_status(
        &mut self,
        id: &str,
        status: TransactionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Transaction> {
        let tx = self
            .working
            .transactions
            .get_mut(id)
            .ok_or_else(|| missing("transaction", id))?;
        tx.status = status;
        tx.updated_at = at;
        Ok(tx.clone())
    }
}

#[async_trait]
impl PaymentRows for MemoryUnit {
    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        if !self.working.transactions.contains_key(&payment.transaction_id) {
            return Err(missing("transaction", &payment.transaction_id));
        }
        self.working.payments.push(payment.clone());
        Ok(())
    }

    async fn posted_payment_amounts(&mut self, transaction_id: &str) -> StoreResult<Vec<Money>> {
        Ok(self
            .working
            .payments
            .iter()
            .filter(|p| p.transaction_id == transaction_id && p.status == PaymentRecordStatus::Posted)
            .map(|p| p.amount)
            .collect())
    }

    async fn write_payment_state(
        &mut self,
        transaction_id: &str,
        paid_amount: Money,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let tx = self
            .working
            .transactions
            .get_mut(transaction_id)
            .ok_or_else(|| missing("transaction", transaction_id))?;
        tx.paid_amount = paid_amount;
        tx.payment_status = payment_status;
        tx.updated_at = at;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
