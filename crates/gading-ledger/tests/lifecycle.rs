//! Transaction lifecycle against the in-memory store.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{money, now, Fixture};
use gading_core::{
    CreateItemInput, CreateTransactionInput, Decimal, ListTransactionsInput, Money,
    TransactionStatus, ValidationError,
};
use gading_ledger::{ErrorKind, FixedClock, MemoryStore, TransactionError, TransactionService};

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_draft_create_prices_lines_and_leaves_stock() {
    let fx = Fixture::new().await;

    let detail = fx.transactions.create(fx.create_input(2, None)).await.unwrap();

    assert_eq!(detail.transaction.status, TransactionStatus::Draft);
    assert_eq!(detail.transaction.total_amount.to_string(), "10000.00");
    assert_eq!(detail.transaction.currency, "IDR");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].unit_amount, money("5000"));
    assert_eq!(detail.items[0].line_total, money("10000"));
    assert_eq!(fx.stock().await, (10, 0));
}

#[tokio::test]
async fn test_pending_then_fulfill_moves_stock() {
    let fx = Fixture::new().await;
    let detail = fx.transactions.create(fx.create_input(3, None)).await.unwrap();
    let id = detail.transaction.id;

    let pending = fx
        .transactions
        .update_status(&id, TransactionStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.status, TransactionStatus::Pending);
    assert_eq!(fx.stock().await, (10, 3));

    let completed = fx.transactions.fulfill(&id).await.unwrap();
    assert_eq!(completed.status, TransactionStatus::Completed);
    assert_eq!(fx.stock().await, (7, 0));
}

#[tokio::test]
async fn test_insufficient_stock_on_create_persists_nothing() {
    let fx = Fixture::new().await;

    let err = fx
        .transactions
        .create(fx.create_input(999, Some(TransactionStatus::Pending)))
        .await
        .unwrap_err();

    match err {
        TransactionError::InsufficientStock {
            product_id,
            available,
            required,
        } => {
            assert_eq!(product_id, fx.product.id);
            assert_eq!(available, 10);
            assert_eq!(required, 999);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
    assert_eq!(fx.stock().await, (10, 0));
}

#[tokio::test]
async fn test_create_completed_reserves_then_commits() {
    let fx = Fixture::new().await;

    let detail = fx
        .transactions
        .create(fx.create_input(4, Some(TransactionStatus::Completed)))
        .await
        .unwrap();

    assert_eq!(detail.transaction.status, TransactionStatus::Completed);
    assert_eq!(fx.stock().await, (6, 0));
}

#[tokio::test]
async fn test_create_completed_checks_availability() {
    let fx = Fixture::new().await;
    fx.transactions
        .create(fx.create_input(8, Some(TransactionStatus::Pending)))
        .await
        .unwrap();

    // 10 on hand, 8 reserved: only 2 available
    let err = fx
        .transactions
        .create(fx.create_input(3, Some(TransactionStatus::Completed)))
        .await
        .unwrap_err();

    assert!(matches!(err, TransactionError::InsufficientStock { available: 2, .. }));
    assert_eq!(fx.stock().await, (10, 8));
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
async fn test_cancel_pending_releases() {
    let fx = Fixture::new().await;
    let id = fx
        .transactions
        .create(fx.create_input(5, Some(TransactionStatus::Pending)))
        .await
        .unwrap()
        .transaction
        .id;
    assert_eq!(fx.stock().await, (10, 5));

    fx.transactions
        .update_status(&id, TransactionStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(fx.stock().await, (10, 0));
}

#[tokio::test]
async fn test_cancel_draft_has_no_stock_effect() {
    let fx = Fixture::new().await;
    let id = fx.transactions.create(fx.create_input(5, None)).await.unwrap().transaction.id;

    let cancelled = fx
        .transactions
        .update_status(&id, TransactionStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert_eq!(fx.stock().await, (10, 0));
}

#[tokio::test]
async fn test_terminal_states_reject_every_transition() {
    let fx = Fixture::new().await;

    let completed = fx
        .transactions
        .create(fx.create_input(2, Some(TransactionStatus::Completed)))
        .await
        .unwrap()
        .transaction;
    let cancelled = {
        let id = fx
            .transactions
            .create(fx.create_input(1, Some(TransactionStatus::Pending)))
            .await
            .unwrap()
            .transaction
            .id;
        fx.transactions
            .update_status(&id, TransactionStatus::Cancelled)
            .await
            .unwrap()
    };
    let before = fx.stock().await;

    for tx in [&completed, &cancelled] {
        for to in TransactionStatus::ALL {
            let err = fx.transactions.update_status(&tx.id, to).await.unwrap_err();
            assert_eq!(
                err,
                TransactionError::InvalidTransition { from: tx.status, to }
            );
        }
        let stored = fx.transactions.get(&tx.id).await.unwrap().transaction;
        assert_eq!(stored.status, tx.status);
        assert_eq!(stored.updated_at, tx.updated_at);
    }
    assert_eq!(fx.stock().await, before);
}

#[tokio::test]
async fn test_skipping_pending_is_rejected() {
    let fx = Fixture::new().await;
    let id = fx.transactions.create(fx.create_input(2, None)).await.unwrap().transaction.id;

    let err = fx
        .transactions
        .update_status(&id, TransactionStatus::Completed)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransactionError::InvalidTransition {
            from: TransactionStatus::Draft,
            to: TransactionStatus::Completed,
        }
    );
    assert_eq!(fx.stock().await, (10, 0));
}

#[tokio::test]
async fn test_fulfill_errors() {
    let fx = Fixture::new().await;

    let draft = fx.transactions.create(fx.create_input(1, None)).await.unwrap().transaction.id;
    assert!(matches!(
        fx.transactions.fulfill(&draft).await,
        Err(TransactionError::InvalidTransition { .. })
    ));

    let completed = fx
        .transactions
        .create(fx.create_input(1, Some(TransactionStatus::Completed)))
        .await
        .unwrap()
        .transaction
        .id;
    assert_eq!(
        fx.transactions.fulfill(&completed).await,
        Err(TransactionError::AlreadyFulfilled(completed.clone()))
    );

    fx.transactions
        .update_status(&draft, TransactionStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(
        fx.transactions.fulfill(&draft).await,
        Err(TransactionError::TransactionCanceled(draft.clone()))
    );

    let missing = "7d4f3a4e-0000-4000-8000-000000000000";
    assert_eq!(
        fx.transactions.fulfill(missing).await,
        Err(TransactionError::TransactionMissing(missing.to_string()))
    );
}

#[tokio::test]
async fn test_fulfill_after_stock_edit() {
    let fx = Fixture::new().await;
    let id = fx
        .transactions
        .create(fx.create_input(6, Some(TransactionStatus::Pending)))
        .await
        .unwrap()
        .transaction
        .id;

    // Admin edits are floored at the reserved count
    assert!(fx.store.set_on_hand(&fx.product.id, 5).await.is_err());
    fx.store.set_on_hand(&fx.product.id, 6).await.unwrap();
    assert_eq!(fx.stock().await, (6, 6));

    let done = fx.transactions.fulfill(&id).await.unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(fx.stock().await, (0, 0));
}

#[tokio::test]
async fn test_create_rejects_cancelled_initial_status() {
    let fx = Fixture::new().await;

    let err = fx
        .transactions
        .create(fx.create_input(1, Some(TransactionStatus::Cancelled)))
        .await
        .unwrap_err();

    assert_eq!(err, TransactionError::InvalidStatus("cancelled".into()));
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

// =============================================================================
// Validation & References
// =============================================================================

#[tokio::test]
async fn test_create_validation() {
    let fx = Fixture::new().await;

    let empty = CreateTransactionInput {
        customer_id: fx.customer.id.clone(),
        ..Default::default()
    };
    let err = fx.transactions.create(empty).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = fx.transactions.create(fx.create_input(0, None)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let mut unknown_customer = fx.create_input(1, None);
    unknown_customer.customer_id = "7d4f3a4e-0000-4000-8000-000000000001".into();
    assert!(matches!(
        fx.transactions.create(unknown_customer).await,
        Err(TransactionError::CustomerMissing(_))
    ));

    let mut unknown_product = fx.create_input(1, None);
    unknown_product.items[0].product_id = "7d4f3a4e-0000-4000-8000-000000000002".into();
    assert!(matches!(
        fx.transactions.create(unknown_product).await,
        Err(TransactionError::ProductMissing(_))
    ));

    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_inactive_product_is_missing() {
    let fx = Fixture::new().await;
    fx.store.set_product_active(&fx.product.id, false).await.unwrap();

    assert_eq!(
        fx.transactions.create(fx.create_input(1, None)).await,
        Err(TransactionError::ProductMissing(fx.product.id.clone()))
    );
}

#[tokio::test]
async fn test_unknown_id_is_missing() {
    let fx = Fixture::new().await;
    let id = "7d4f3a4e-0000-4000-8000-000000000003";

    assert_eq!(
        fx.transactions.update_status(id, TransactionStatus::Pending).await,
        Err(TransactionError::TransactionMissing(id.into()))
    );
    assert!(matches!(
        fx.transactions.view(id).await,
        Err(TransactionError::TransactionMissing(_))
    ));
    assert!(matches!(
        fx.transactions.get("not-a-uuid").await,
        Err(TransactionError::InvalidInput(_))
    ));
}

// =============================================================================
// Pricing
// =============================================================================

#[tokio::test]
async fn test_category_price_preferred_over_default() {
    let fx = Fixture::new().await;
    let wholesale = "0b7d5a8e-1111-4000-8000-000000000000";
    let customer = fx.store.insert_customer("Ayu", "Grosir", Some(wholesale)).await;
    fx.store
        .insert_price(
            &fx.product.id,
            Some(wholesale),
            "IDR",
            money("4500"),
            now() - Duration::days(1),
            None,
        )
        .await;

    let mut input = fx.create_input(2, None);
    input.customer_id = customer.id;
    let detail = fx.transactions.create(input).await.unwrap();
    assert_eq!(detail.transaction.total_amount, money("9000.00"));

    // Regular customer still gets the default tier
    let detail = fx.transactions.create(fx.create_input(2, None)).await.unwrap();
    assert_eq!(detail.transaction.total_amount, money("10000.00"));
}

#[tokio::test]
async fn test_expired_category_price_falls_back_to_default() {
    let fx = Fixture::new().await;
    let vip = "0b7d5a8e-2222-4000-8000-000000000000";
    let customer = fx.store.insert_customer("Budi", "Vip", Some(vip)).await;
    fx.store
        .insert_price(
            &fx.product.id,
            Some(vip),
            "IDR",
            money("4000"),
            now() - Duration::days(10),
            Some(now()),
        )
        .await;

    let mut input = fx.create_input(1, None);
    input.customer_id = customer.id;
    let detail = fx.transactions.create(input).await.unwrap();

    assert_eq!(detail.items[0].unit_amount, money("5000"));
}

#[tokio::test]
async fn test_newest_valid_price_wins() {
    let fx = Fixture::new().await;
    fx.store
        .insert_price(
            &fx.product.id,
            None,
            "IDR",
            money("5500"),
            now() - Duration::days(2),
            None,
        )
        .await;
    // Not valid yet
    fx.store
        .insert_price(
            &fx.product.id,
            None,
            "IDR",
            money("9999"),
            now() + Duration::days(1),
            None,
        )
        .await;

    let detail = fx.transactions.create(fx.create_input(1, None)).await.unwrap();

    assert_eq!(detail.items[0].unit_amount, money("5500"));
}

#[tokio::test]
async fn test_price_missing() {
    let fx = Fixture::new().await;
    let unpriced = fx.store.insert_product("SKU-NOPRICE", "Kopi", 10).await;

    let mut input = fx.create_input(1, None);
    input.items[0].product_id = unpriced.id.clone();

    assert_eq!(
        fx.transactions.create(input).await,
        Err(TransactionError::PriceMissing {
            product_id: unpriced.id
        })
    );
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_line_total_above_ceiling_rejected() {
    let fx = Fixture::new().await;
    let luxury = fx.store.insert_product("SKU-MAX", "Berlian", 10).await;
    fx.store
        .insert_price(&luxury.id, None, "IDR", Money::max_amount(), now() - Duration::days(1), None)
        .await;

    let mut input = fx.create_input(2, None);
    input.items[0].product_id = luxury.id.clone();

    let err = fx.transactions.create(input).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::InvalidInput(ValidationError::TooLarge { ref field, .. })
            if field == "items[0].line_total"
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_total_above_ceiling_rejected() {
    let fx = Fixture::new().await;
    let luxury = fx.store.insert_product("SKU-MAX", "Berlian", 10).await;
    fx.store
        .insert_price(&luxury.id, None, "IDR", Money::max_amount(), now() - Duration::days(1), None)
        .await;

    let mut input = fx.create_input(1, None);
    input.items.push(CreateItemInput {
        product_id: luxury.id,
        qty: 1,
    });

    let err = fx.transactions.create(input).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::InvalidInput(ValidationError::TooLarge { ref field, .. })
            if field == "total_amount"
    ));
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_mixed_currencies_rejected() {
    let fx = Fixture::new().await;
    let imported = fx.store.insert_product("SKU-USD", "Imported", 10).await;
    fx.store
        .insert_price(
            &imported.id,
            None,
            "USD",
            money("1.25"),
            now() - Duration::days(1),
            None,
        )
        .await;

    let mut input = fx.create_input(1, None);
    input.items.push(CreateItemInput {
        product_id: imported.id,
        qty: 1,
    });

    assert_eq!(
        fx.transactions.create(input).await,
        Err(TransactionError::MultiCurrency {
            expected: "IDR".into(),
            found: "USD".into(),
        })
    );
}

// =============================================================================
// Pack Sizes
// =============================================================================

#[tokio::test]
async fn test_pack_variants_aggregate_on_base_product() {
    let fx = Fixture::new().await;
    let base = fx.store.insert_product("AIR", "Air Mineral", 30).await;
    let dozen = fx
        .store
        .insert_pack_product("AIR-12", "Air Mineral x12", &base.id, Decimal::from(12))
        .await;
    for id in [&base.id, &dozen.id] {
        fx.store
            .insert_price(id, None, "IDR", money("3000"), now() - Duration::days(1), None)
            .await;
    }

    let input = CreateTransactionInput {
        customer_id: fx.customer.id.clone(),
        notes: Some("  grosir  ".into()),
        items: vec![
            CreateItemInput {
                product_id: dozen.id.clone(),
                qty: 2,
            },
            CreateItemInput {
                product_id: base.id.clone(),
                qty: 5,
            },
        ],
        status: Some(TransactionStatus::Pending),
    };
    let detail = fx.transactions.create(input).await.unwrap();
    assert_eq!(detail.transaction.notes.as_deref(), Some("grosir"));

    let level = fx.store.stock_of(&base.id).await.unwrap();
    assert_eq!((level.on_hand, level.reserved), (30, 29));
    let pack = fx.store.stock_of(&dozen.id).await.unwrap();
    assert_eq!((pack.on_hand, pack.reserved), (0, 0));

    fx.transactions.fulfill(&detail.transaction.id).await.unwrap();
    let level = fx.store.stock_of(&base.id).await.unwrap();
    assert_eq!((level.on_hand, level.reserved), (1, 0));
}

#[tokio::test]
async fn test_fractional_pack_size_is_configuration_error() {
    let fx = Fixture::new().await;
    let base = fx.store.insert_product("GULA", "Gula", 10).await;
    let half = fx
        .store
        .insert_pack_product("GULA-HALF", "Gula 1/2", &base.id, Decimal::new(5, 1))
        .await;
    fx.store
        .insert_price(&half.id, None, "IDR", money("8000"), now() - Duration::days(1), None)
        .await;

    let mut input = fx.create_input(1, Some(TransactionStatus::Pending));
    input.items[0].product_id = half.id.clone();
    let err = fx.transactions.create(input).await.unwrap_err();

    assert!(matches!(err, TransactionError::InvalidPackSize { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!err.is_caller_error());
    assert_eq!(fx.store.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_multi_product_failure_rolls_back_earlier_reservations() {
    let fx = Fixture::new().await;
    let scarce = fx.store.insert_product("SKU-SCARCE", "Langka", 1).await;
    fx.store
        .insert_price(&scarce.id, None, "IDR", money("100"), now() - Duration::days(1), None)
        .await;

    let mut input = fx.create_input(3, Some(TransactionStatus::Pending));
    input.items.push(CreateItemInput {
        product_id: scarce.id.clone(),
        qty: 2,
    });

    assert!(matches!(
        fx.transactions.create(input).await,
        Err(TransactionError::InsufficientStock { .. })
    ));
    assert_eq!(fx.stock().await, (10, 0));
    let level = fx.store.stock_of(&scarce.id).await.unwrap();
    assert_eq!((level.on_hand, level.reserved), (1, 0));
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_list_newest_first_with_filter() {
    let store = MemoryStore::new();
    let customer = store.insert_customer("Rio", "Test", None).await;
    let product = store.insert_product("SKU-1", "Teh", 100).await;
    store
        .insert_price(&product.id, None, "IDR", money("10"), now() - Duration::days(1), None)
        .await;

    let mut ids = Vec::new();
    for minutes in 0..3 {
        let clock = Arc::new(FixedClock::new(now() + Duration::minutes(minutes)));
        let service = TransactionService::with_clock(store.clone(), clock);
        let input = CreateTransactionInput {
            customer_id: customer.id.clone(),
            notes: None,
            items: vec![CreateItemInput {
                product_id: product.id.clone(),
                qty: 1,
            }],
            status: (minutes == 1).then_some(TransactionStatus::Pending),
        };
        ids.push(service.create(input).await.unwrap().transaction.id);
    }

    let service = TransactionService::new(store);
    let all = service.list(ListTransactionsInput::default()).await.unwrap();
    let listed: Vec<_> = all.iter().map(|t| t.id.clone()).collect();
    assert_eq!(listed, vec![ids[2].clone(), ids[1].clone(), ids[0].clone()]);

    let pending = service
        .list(ListTransactionsInput {
            status: Some(TransactionStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, ids[1]);

    let page = service
        .list(ListTransactionsInput {
            status: None,
            limit: 1,
            offset: 1,
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ids[1]);
}

#[tokio::test]
async fn test_view_joins_customer_and_products() {
    let fx = Fixture::new().await;
    let id = fx.transactions.create(fx.create_input(2, None)).await.unwrap().transaction.id;

    let view = fx.transactions.view(&id).await.unwrap();

    assert_eq!(view.customer_name, "Rio Test");
    assert_eq!(view.category_id, None);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].sku.as_deref(), Some("SKU-TX-001"));
    assert_eq!(view.items[0].product_name, "Teh Botol");
    assert_eq!(view.balance_due.to_string(), "10000.00");
    assert!(view.payments.is_empty());
}
