//! PostgreSQL integration tests.
//!
//! Run only when `DATABASE_URL` points at a scratch database; otherwise
//! every test returns early.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use gading_core::{
    CreateItemInput, CreateTransactionInput, Decimal, Money, PaymentStatus, PostPaymentInput,
    ProductStock, TransactionStatus,
};
use gading_db::{CatalogRepository, Database, DbConfig, NewCustomer, NewPrice, NewProduct, PgStore};
use gading_ledger::{PaymentService, TransactionError, TransactionService};
use uuid::Uuid;

async fn connect() -> Option<Database> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL test");
        return None;
    };
    let config = DbConfig::new(url).max_connections(8).run_migrations(true);
    Some(Database::new(config).await.expect("connect to DATABASE_URL"))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

struct World {
    db: Database,
    catalog: CatalogRepository,
    transactions: TransactionService<PgStore>,
    payments: PaymentService<PgStore>,
    customer_id: String,
    product: ProductStock,
}

impl World {
    async fn new(on_hand: i64) -> Option<Self> {
        let db = connect().await?;
        let catalog = db.catalog();

        let customer = catalog
            .create_customer(NewCustomer {
                first_name: "Rio".into(),
                last_name: "Test".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let product = catalog
            .create_product(NewProduct::base(unique("SKU-TX"), "Teh Botol", on_hand))
            .await
            .unwrap();
        catalog
            .create_price(price(&product.id, None, 5_000))
            .await
            .unwrap();

        Some(World {
            transactions: TransactionService::new(db.store()),
            payments: PaymentService::new(db.store()),
            customer_id: customer.id,
            product,
            catalog,
            db,
        })
    }

    fn input(&self, qty: i64, status: Option<TransactionStatus>) -> CreateTransactionInput {
        CreateTransactionInput {
            customer_id: self.customer_id.clone(),
            notes: None,
            items: vec![CreateItemInput {
                product_id: self.product.id.clone(),
                qty,
            }],
            status,
        }
    }

    async fn stock(&self, product_id: &str) -> (i64, i64) {
        let p = self.catalog.get_product(product_id).await.unwrap().unwrap();
        (p.stock_on_hand, p.stock_reserved)
    }

    async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql)
            .bind(&self.customer_id)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

fn price(product_id: &str, category_id: Option<&str>, major: i64) -> NewPrice {
    NewPrice {
        product_id: product_id.to_string(),
        category_id: category_id.map(String::from),
        currency: "IDR".into(),
        amount: Money::from_major(major),
        valid_from: Utc::now() - Duration::minutes(5),
        valid_to: None,
    }
}

#[tokio::test]
async fn test_draft_create() {
    let Some(w) = World::new(10).await else { return };

    let detail = w.transactions.create(w.input(2, None)).await.unwrap();

    assert_eq!(detail.transaction.total_amount.to_string(), "10000.00");
    assert_eq!(detail.transaction.currency, "IDR");
    assert_eq!(w.stock(&w.product.id).await, (10, 0));

    let stored = w.transactions.get(&detail.transaction.id).await.unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.transaction.status, TransactionStatus::Draft);
}

#[tokio::test]
async fn test_reserve_then_fulfill() {
    let Some(w) = World::new(10).await else { return };
    let id = w.transactions.create(w.input(3, None)).await.unwrap().transaction.id;

    w.transactions
        .update_status(&id, TransactionStatus::Pending)
        .await
        .unwrap();
    assert_eq!(w.stock(&w.product.id).await, (10, 3));

    let done = w.transactions.fulfill(&id).await.unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(w.stock(&w.product.id).await, (7, 0));
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let Some(w) = World::new(10).await else { return };

    let err = w
        .transactions
        .create(w.input(999, Some(TransactionStatus::Pending)))
        .await
        .unwrap_err();

    assert!(matches!(err, TransactionError::InsufficientStock { available: 10, required: 999, .. }));
    assert_eq!(
        w.count("SELECT COUNT(*) FROM transactions WHERE customer_id = $1::uuid").await,
        0
    );
    assert_eq!(
        w.count(
            "SELECT COUNT(*) FROM transaction_items ti JOIN transactions t ON t.id = ti.transaction_id \
             WHERE t.customer_id = $1::uuid"
        )
        .await,
        0
    );
    assert_eq!(w.stock(&w.product.id).await, (10, 0));
}

#[tokio::test]
async fn test_payments_partial_then_paid() {
    let Some(w) = World::new(10).await else { return };
    let id = w.transactions.create(w.input(2, None)).await.unwrap().transaction.id;

    let post = |amount: &str| PostPaymentInput {
        transaction_id: id.clone(),
        method: "transfer".into(),
        amount: amount.into(),
        ..Default::default()
    };

    let (_, state) = w.payments.post(post("5000.00")).await.unwrap();
    assert_eq!(state.payment_status, PaymentStatus::Partial);

    let (_, state) = w.payments.post(post("5000.00")).await.unwrap();
    assert_eq!(state.payment_status, PaymentStatus::Paid);
    assert_eq!(state.paid_amount.to_string(), "10000.00");

    let view = w.transactions.view(&id).await.unwrap();
    assert_eq!(view.customer_name, "Rio Test");
    assert_eq!(view.payments.len(), 2);
    assert!(view.balance_due.is_zero());
}

#[tokio::test]
async fn test_pack_variant_and_category_price() {
    let Some(w) = World::new(0).await else { return };
    let category = w
        .catalog
        .create_category(&unique("WHOLESALE"), "Wholesale")
        .await
        .unwrap();
    let customer = w
        .catalog
        .create_customer(NewCustomer {
            first_name: "Ayu".into(),
            last_name: "Grosir".into(),
            category_id: Some(category.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    let base = w
        .catalog
        .create_product(NewProduct::base(unique("AIR"), "Air", 30))
        .await
        .unwrap();
    let dozen = w
        .catalog
        .create_product(NewProduct::pack(unique("AIR-12"), "Air x12", base.id.clone(), Decimal::from(12)))
        .await
        .unwrap();
    w.catalog.create_price(price(&dozen.id, None, 34_000)).await.unwrap();
    w.catalog
        .create_price(price(&dozen.id, Some(&category), 32_000))
        .await
        .unwrap();

    let input = CreateTransactionInput {
        customer_id: customer.id,
        notes: None,
        items: vec![CreateItemInput {
            product_id: dozen.id.clone(),
            qty: 2,
        }],
        status: Some(TransactionStatus::Pending),
    };
    let detail = w.transactions.create(input).await.unwrap();

    assert_eq!(detail.transaction.total_amount, Money::from_major(64_000));
    assert_eq!(w.stock(&base.id).await, (30, 24));
    assert_eq!(w.stock(&dozen.id).await, (0, 0));
}

#[tokio::test]
async fn test_concurrent_reserves_use_row_locks() {
    let Some(w) = World::new(5).await else { return };
    let w = Arc::new(w);

    let results = join_all((0..8).map(|_| {
        let w = w.clone();
        async move {
            w.transactions
                .create(w.input(1, Some(TransactionStatus::Pending)))
                .await
        }
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    let (on_hand, reserved) = w.stock(&w.product.id).await;
    assert_eq!((on_hand, reserved), (5, 5));
}

#[tokio::test]
async fn test_admin_stock_edit_floors_at_reserved() {
    let Some(w) = World::new(10).await else { return };
    w.transactions
        .create(w.input(4, Some(TransactionStatus::Pending)))
        .await
        .unwrap();

    assert!(w.catalog.set_stock_on_hand(&w.product.id, 3).await.is_err());
    let level = w.catalog.set_stock_on_hand(&w.product.id, 4).await.unwrap();
    assert_eq!((level.on_hand, level.reserved), (4, 4));
}
