//! # Domain Types
//!
//! Core domain types used throughout the Gading transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Transaction    │   │ TransactionItem │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  transaction_id │   │  transaction_id │──►    │
//! │  │  status         │   │  product_id     │   │  method         │       │
//! │  │  total_amount   │   │  qty            │   │  amount         │       │
//! │  │  paid_amount    │   │  unit_amount    │   │  currency       │       │
//! │  │  payment_status │   │  line_total     │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │TransactionStatus│   │  PaymentStatus  │   │ PaymentMethod   │       │
//! │  │  Draft          │   │  Unpaid         │   │  Cash           │       │
//! │  │  Pending        │   │  Partial        │   │  Transfer       │       │
//! │  │  Completed      │   │  Paid           │   └─────────────────┘       │
//! │  │  Cancelled      │   │  Overpaid       │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are UUID strings. Every timestamp is UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of a transaction.
///
/// `Completed` and `Cancelled` are terminal. The legal edges live in
/// [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created, no stock held.
    #[default]
    Draft,
    /// Stock reserved.
    Pending,
    /// Stock committed (deducted from on-hand).
    Completed,
    /// Abandoned; any reservation was released.
    Cancelled,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Draft,
        TransactionStatus::Pending,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "draft",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions are possible.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Cancelled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(TransactionStatus::Draft),
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(not_allowed(
                "status",
                &["draft", "pending", "completed", "cancelled"],
            )),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// How much of a transaction's total has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
    Overpaid,
}

impl PaymentStatus {
    /// Classifies `paid` against `total`.
    ///
    /// ```text
    ///   paid == 0        → Unpaid
    ///   0 < paid < total → Partial
    ///   paid == total    → Paid
    ///   paid > total     → Overpaid
    /// ```
    ///
    /// ```rust
    /// use gading_core::{Money, PaymentStatus};
    ///
    /// let total = Money::from_major(10000);
    /// assert_eq!(PaymentStatus::derive(Money::from_major(5000), total), PaymentStatus::Partial);
    /// assert_eq!(PaymentStatus::derive(total, total), PaymentStatus::Paid);
    /// ```
    pub fn derive(paid: Money, total: Money) -> Self {
        if !paid.is_positive() {
            PaymentStatus::Unpaid
        } else if paid < total {
            PaymentStatus::Partial
        } else if paid == total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Overpaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overpaid => "overpaid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            "overpaid" => Ok(PaymentStatus::Overpaid),
            _ => Err(not_allowed(
                "payment_status",
                &["unpaid", "partial", "paid", "overpaid"],
            )),
        }
    }
}

// =============================================================================
// Payment Method / Record Status
// =============================================================================

/// How money was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            _ => Err(not_allowed("method", &["cash", "transfer"])),
        }
    }
}

/// State of a single payment row. Only `Posted` rows count toward
/// `paid_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    #[default]
    Posted,
    Voided,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Posted => "posted",
            PaymentRecordStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentRecordStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "posted" => Ok(PaymentRecordStatus::Posted),
            "voided" => Ok(PaymentRecordStatus::Voided),
            _ => Err(not_allowed("payment.status", &["posted", "voided"])),
        }
    }
}

// =============================================================================
// Catalog (read-only to the engine)
// =============================================================================

/// A customer as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Selects category-specific prices. `None` means default prices only.
    pub category_id: Option<String>,
}

impl Customer {
    /// "First Last", trimmed when either part is empty.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A product row with its stock counters.
///
/// When `base_product_id` is set, stock lives on that product and this row's
/// counters are unused; one unit of this product consumes `pack_size` base
/// units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductStock {
    pub id: String,
    pub sku: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub stock_on_hand: i64,
    pub stock_reserved: i64,
    pub base_product_id: Option<String>,
    #[ts(type = "string")]
    pub pack_size: Decimal,
}

impl ProductStock {
    /// Unreserved stock in base units.
    #[inline]
    pub fn available(&self) -> i64 {
        self.stock_on_hand - self.stock_reserved
    }

    /// The product that actually carries the stock counters.
    pub fn stock_product_id(&self) -> &str {
        self.base_product_id.as_deref().unwrap_or(&self.id)
    }
}

/// One price row for a product.
///
/// Valid on the half-open window `[valid_from, valid_to)`; an open
/// `valid_to` never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPrice {
    pub id: String,
    pub product_id: String,
    /// `None` is the default tier used when no category price applies.
    pub category_id: Option<String>,
    pub currency: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub valid_to: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ProductPrice {
    /// Whether `now` falls inside the validity window.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.valid_to.map_or(true, |to| now < to)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A sales transaction header.
///
/// `currency` and `total_amount` are fixed at creation. `status`,
/// `paid_amount` and `payment_status` change over its life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub customer_id: String,
    pub status: TransactionStatus,
    pub currency: String,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// `total_amount - paid_amount`; negative when overpaid.
    #[inline]
    pub fn balance_due(&self) -> Money {
        self.total_amount - self.paid_amount
    }
}

/// A line item. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Sellable units (not base units).
    pub qty: i64,
    pub unit_amount: Money,
    pub line_total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Header plus items, as returned by create / get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment appended to a transaction. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    /// Always the transaction's currency.
    pub currency: String,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub sender_name: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub status: PaymentRecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// The payment aggregate of a transaction right after a payment was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionPaymentState {
    pub transaction_id: String,
    pub currency: String,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub payment_status: PaymentStatus,
    pub balance_due: Money,
}

impl TransactionPaymentState {
    pub fn new(transaction_id: String, currency: String, total: Money, paid: Money) -> Self {
        TransactionPaymentState {
            transaction_id,
            currency,
            total_amount: total,
            paid_amount: paid,
            payment_status: PaymentStatus::derive(paid, total),
            balance_due: total - paid,
        }
    }
}

// =============================================================================
// Transaction View (read projection)
// =============================================================================

/// Composite read model: header, items, payments and balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionView {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub category_id: Option<String>,
    pub status: TransactionStatus,
    pub currency: String,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub payment_status: PaymentStatus,
    pub balance_due: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<TransactionViewItem>,
    /// Newest `paid_at` first.
    pub payments: Vec<TransactionViewPayment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionViewItem {
    pub product_id: String,
    pub sku: Option<String>,
    pub product_name: String,
    pub qty: i64,
    pub unit_amount: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionViewPayment {
    pub id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub currency: String,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub sender_name: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub status: PaymentRecordStatus,
}

impl From<Payment> for TransactionViewPayment {
    fn from(p: Payment) -> Self {
        TransactionViewPayment {
            id: p.id,
            method: p.method,
            amount: p.amount,
            currency: p.currency,
            paid_at: p.paid_at,
            sender_name: p.sender_name,
            reference: p.reference,
            note: p.note,
            status: p.status,
        }
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Request to create a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateTransactionInput {
    pub customer_id: String,
    pub notes: Option<String>,
    pub items: Vec<CreateItemInput>,
    /// Initial status; `None` means draft.
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateItemInput {
    pub product_id: String,
    pub qty: i64,
}

/// Request to post a payment.
///
/// `amount` stays text until validated so malformed input is reported as a
/// field error rather than a deserialization failure. `currency` is accepted
/// for compatibility and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PostPaymentInput {
    pub transaction_id: String,
    pub method: String,
    pub amount: String,
    pub currency: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub sender_name: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Paging and filtering for transaction lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListTransactionsInput {
    pub status: Option<TransactionStatus>,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
