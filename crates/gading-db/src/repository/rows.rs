//! Row shapes as selected from PostgreSQL, and their conversion into domain
//! types.
//!
//! Ids are selected as `id::text`, status columns as plain text, money as
//! NUMERIC decoded straight into [`Money`].

use chrono::{DateTime, Utc};
use gading_core::{
    Customer, Decimal, Money, Payment, ProductPrice, ProductStock, StockLevel, StockLine,
    Transaction, TransactionItem, TransactionView, TransactionViewItem,
};
use sqlx::FromRow;

use crate::error::{DbError, DbResult};

fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> DbResult<T> {
    value
        .parse()
        .map_err(|_| DbError::corrupt(format!("{column} has unknown value '{value}'")))
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct CustomerRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub category_id: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            category_id: row.category_id,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub sku: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub stock_on_hand: i64,
    pub stock_reserved: i64,
    pub base_product_id: Option<String>,
    pub pack_size: Decimal,
}

impl From<ProductRow> for ProductStock {
    fn from(row: ProductRow) -> Self {
        ProductStock {
            id: row.id,
            sku: row.sku,
            name: row.name,
            is_active: row.is_active,
            stock_on_hand: row.stock_on_hand,
            stock_reserved: row.stock_reserved,
            base_product_id: row.base_product_id,
            pack_size: row.pack_size,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StockLineRow {
    pub product_id: String,
    pub stock_product_id: String,
    pub qty: i64,
    pub pack_size: Decimal,
}

impl From<StockLineRow> for StockLine {
    fn from(row: StockLineRow) -> Self {
        StockLine {
            product_id: row.product_id,
            stock_product_id: row.stock_product_id,
            qty: row.qty,
            pack_size: row.pack_size,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StockLevelRow {
    pub product_id: String,
    pub stock_on_hand: i64,
    pub stock_reserved: i64,
}

impl TryFrom<StockLevelRow> for StockLevel {
    type Error = DbError;

    fn try_from(row: StockLevelRow) -> DbResult<Self> {
        StockLevel::new(row.product_id, row.stock_on_hand, row.stock_reserved)
            .map_err(DbError::corrupt)
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PriceRow {
    pub id: String,
    pub product_id: String,
    pub category_id: Option<String>,
    pub currency: String,
    pub amount: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PriceRow> for ProductPrice {
    fn from(row: PriceRow) -> Self {
        ProductPrice {
            id: row.id,
            product_id: row.product_id,
            category_id: row.category_id,
            currency: row.currency,
            amount: row.amount,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub currency: String,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        Ok(Transaction {
            status: parse_column("transactions.status", &row.status)?,
            payment_status: parse_column("transactions.payment_status", &row.payment_status)?,
            id: row.id,
            customer_id: row.customer_id,
            currency: row.currency,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub qty: i64,
    pub unit_amount: Money,
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
}

impl From<ItemRow> for TransactionItem {
    fn from(row: ItemRow) -> Self {
        TransactionItem {
            id: row.id,
            transaction_id: row.transaction_id,
            product_id: row.product_id,
            qty: row.qty,
            unit_amount: row.unit_amount,
            line_total: row.line_total,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRow {
    pub id: String,
    pub transaction_id: String,
    pub method: String,
    pub amount: Money,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
    pub sender_name: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> DbResult<Self> {
        Ok(Payment {
            method: parse_column("payments.method", &row.method)?,
            status: parse_column("payments.status", &row.status)?,
            id: row.id,
            transaction_id: row.transaction_id,
            amount: row.amount,
            currency: row.currency,
            paid_at: row.paid_at,
            sender_name: row.sender_name,
            reference: row.reference,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// View
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct ViewHeaderRow {
    #[sqlx(flatten)]
    pub transaction: TransactionRow,
    pub customer_name: String,
    pub category_id: Option<String>,
}

impl ViewHeaderRow {
    pub fn into_view(
        self,
        items: Vec<TransactionViewItem>,
        payments: Vec<Payment>,
    ) -> DbResult<TransactionView> {
        let tx = Transaction::try_from(self.transaction)?;
        Ok(TransactionView {
            balance_due: tx.balance_due(),
            id: tx.id,
            customer_id: tx.customer_id,
            customer_name: self.customer_name,
            category_id: self.category_id,
            status: tx.status,
            currency: tx.currency,
            total_amount: tx.total_amount,
            paid_amount: tx.paid_amount,
            payment_status: tx.payment_status,
            notes: tx.notes,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            items,
            payments: payments.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ViewItemRow {
    pub product_id: String,
    pub sku: Option<String>,
    pub product_name: String,
    pub qty: i64,
    pub unit_amount: Money,
    pub line_total: Money,
}

impl From<ViewItemRow> for TransactionViewItem {
    fn from(row: ViewItemRow) -> Self {
        TransactionViewItem {
            product_id: row.product_id,
            sku: row.sku,
            product_name: row.product_name,
            qty: row.qty,
            unit_amount: row.unit_amount,
            line_total: row.line_total,
        }
    }
}
