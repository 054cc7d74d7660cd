//! Shared fixtures for the engine tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gading_core::{
    CreateItemInput, CreateTransactionInput, Customer, Money, PostPaymentInput, ProductStock,
    TransactionStatus,
};
use gading_ledger::{FixedClock, MemoryStore, PaymentService, TransactionService};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn money(value: &str) -> Money {
    value.parse().unwrap()
}

/// A store with one customer and one product ("Teh Botol", 10 on hand,
/// default price IDR 5000.00).
pub struct Fixture {
    pub store: MemoryStore,
    pub transactions: TransactionService<MemoryStore>,
    pub payments: PaymentService<MemoryStore>,
    pub customer: Customer,
    pub product: ProductStock,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(now()));

        let customer = store.insert_customer("Rio", "Test", None).await;
        let product = store.insert_product("SKU-TX-001", "Teh Botol", 10).await;
        store
            .insert_price(
                &product.id,
                None,
                "IDR",
                money("5000.00"),
                now() - Duration::days(30),
                None,
            )
            .await;

        Self {
            transactions: TransactionService::with_clock(store.clone(), clock.clone()),
            payments: PaymentService::with_clock(store.clone(), clock),
            store,
            customer,
            product,
        }
    }

    pub fn create_input(&self, qty: i64, status: Option<TransactionStatus>) -> CreateTransactionInput {
        CreateTransactionInput {
            customer_id: self.customer.id.clone(),
            notes: None,
            items: vec![CreateItemInput {
                product_id: self.product.id.clone(),
                qty,
            }],
            status,
        }
    }

    pub async fn stock(&self) -> (i64, i64) {
        let level = self.store.stock_of(&self.product.id).await.unwrap();
        (level.on_hand, level.reserved)
    }
}

pub fn payment_input(transaction_id: &str, amount: &str) -> PostPaymentInput {
    PostPaymentInput {
        transaction_id: transaction_id.to_string(),
        method: "cash".to_string(),
        amount: amount.to_string(),
        ..Default::default()
    }
}
