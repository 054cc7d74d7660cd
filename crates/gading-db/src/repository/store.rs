//! # PostgreSQL Store
//!
//! [`PgStore`] hands the engine one sqlx transaction per unit of work.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PgStore::begin() ──► pool.begin() ──► PgUnitOfWork { tx }              │
//! │                                                                         │
//! │  lock_transaction  SELECT ... FROM transactions WHERE id = $1 FOR UPDATE│
//! │  lock_stock        SELECT ... FROM products     WHERE id = $1 FOR UPDATE│
//! │                    (called in ascending product id order)               │
//! │                                                                         │
//! │  commit(self)  ──► COMMIT                                               │
//! │  drop(self)    ──► ROLLBACK (sqlx issues it when the tx is dropped)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gading_core::{
    Customer, ListTransactionsInput, Money, Payment, PaymentStatus, ProductPrice, StockLevel,
    StockLine, Transaction, TransactionDetail, TransactionItem, TransactionStatus,
    TransactionView,
};
use gading_ledger::{
    CatalogReader, PaymentRows, StockRows, Store, StoreResult, TransactionRows, UnitOfWork,
};
use sqlx::{PgPool, Postgres};

use crate::repository::{catalog, payment, stock, transaction};

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Unit = PgUnitOfWork;

    async fn begin(&self) -> StoreResult<PgUnitOfWork> {
        let tx = self.pool.begin().await.map_err(crate::DbError::from)?;
        Ok(PgUnitOfWork { tx })
    }

    async fn find_transaction(&self, id: &str) -> StoreResult<Option<TransactionDetail>> {
        let mut conn = self.pool.acquire().await.map_err(crate::DbError::from)?;

        let Some(transaction) = transaction::fetch_transaction(&mut conn, id, false).await? else {
            return Ok(None);
        };
        let items = transaction::items(&mut conn, id).await?;
        Ok(Some(TransactionDetail { transaction, items }))
    }

    async fn list_transactions(&self, input: ListTransactionsInput) -> StoreResult<Vec<Transaction>> {
        let mut conn = self.pool.acquire().await.map_err(crate::DbError::from)?;
        Ok(transaction::list(&mut conn, input).await?)
    }

    async fn transaction_view(&self, id: &str) -> StoreResult<Option<TransactionView>> {
        let mut conn = self.pool.acquire().await.map_err(crate::DbError::from)?;
        Ok(transaction::view(&mut conn, id).await?)
    }

    async fn payments_for(&self, transaction_id: &str) -> StoreResult<Option<Vec<Payment>>> {
        let mut conn = self.pool.acquire().await.map_err(crate::DbError::from)?;

        if transaction::fetch_transaction(&mut conn, transaction_id, false)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        Ok(Some(payment::list_for(&mut conn, transaction_id).await?))
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// One open PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(crate::DbError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogReader for PgUnitOfWork {
    async fn customer(&mut self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(catalog::customer(&mut self.tx, id).await?)
    }

    async fn product_exists(&mut self, id: &str) -> StoreResult<bool> {
        Ok(catalog::product_exists(&mut self.tx, id).await?)
    }

    async fn price_candidates(
        &mut self,
        product_id: &str,
        category_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ProductPrice>> {
        Ok(catalog::price_candidates(&mut self.tx, product_id, category_id, now).await?)
    }
}

#[async_trait]
impl StockRows for PgUnitOfWork {
    async fn stock_lines(&mut self, transaction_id: &str) -> StoreResult<Vec<StockLine>> {
        Ok(stock::stock_lines(&mut self.tx, transaction_id).await?)
    }

    async fn lock_stock(&mut self, stock_product_id: &str) -> StoreResult<Option<StockLevel>> {
        Ok(stock::lock_stock(&mut self.tx, stock_product_id).await?)
    }

    async fn write_stock(&mut self, level: &StockLevel) -> StoreResult<()> {
        Ok(stock::write_stock(&mut self.tx, level).await?)
    }
}

#[async_trait]
impl TransactionRows for PgUnitOfWork {
    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        Ok(transaction::insert_transaction(&mut self.tx, tx).await?)
    }

    async fn insert_item(&mut self, item: &TransactionItem) -> StoreResult<()> {
        Ok(transaction::insert_item(&mut self.tx, item).await?)
    }

    async fn lock_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>> {
        Ok(transaction::fetch_transaction(&mut self.tx, id, true).await?)
    }

    async fn write_status(
        &mut self,
        id: &str,
        status: TransactionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Transaction> {
        Ok(transaction::write_status(&mut self.tx, id, status, at).await?)
    }
}

#[async_trait]
impl PaymentRows for PgUnitOfWork {
    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        Ok(payment::insert_payment(&mut self.tx, payment).await?)
    }

    async fn posted_payment_amounts(&mut self, transaction_id: &str) -> StoreResult<Vec<Money>> {
        Ok(payment::posted_amounts(&mut self.tx, transaction_id).await?)
    }

    async fn write_payment_state(
        &mut self,
        transaction_id: &str,
        paid_amount: Money,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(
            payment::write_payment_state(&mut self.tx, transaction_id, paid_amount, payment_status, at)
                .await?,
        )
    }
}
