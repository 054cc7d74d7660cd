//! # Catalog Repository
//!
//! Master data the engine reads but does not own: customer categories,
//! customers, products with their stock rules, and price rows.
//!
//! ## Stock-tracked products
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │                                                                         │
//! │  AIR       base_product_id NULL    pack_size 1   on_hand 240  ◄──┐      │
//! │  AIR-12    base_product_id AIR     pack_size 12  (unused)    ────┤      │
//! │  AIR-24    base_product_id AIR     pack_size 24  (unused)    ────┘      │
//! │                                                                         │
//! │  stock_product_id = COALESCE(base_product_id, id)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use gading_core::{Customer, Decimal, Money, ProductPrice, ProductStock, StockLevel};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::rows::{CustomerRow, PriceRow, ProductRow};
use crate::repository::stock;

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub stock_on_hand: i64,
    /// Set for pack variants; stock then lives on the base product.
    pub base_product_id: Option<String>,
    pub pack_size: Decimal,
}

impl NewProduct {
    /// A stock-tracked product.
    pub fn base(sku: impl Into<String>, name: impl Into<String>, stock_on_hand: i64) -> Self {
        NewProduct {
            sku: Some(sku.into()),
            name: name.into(),
            description: None,
            stock_on_hand,
            base_product_id: None,
            pack_size: Decimal::ONE,
        }
    }

    /// A variant selling `pack_size` units of `base_product_id`.
    pub fn pack(
        sku: impl Into<String>,
        name: impl Into<String>,
        base_product_id: impl Into<String>,
        pack_size: Decimal,
    ) -> Self {
        NewProduct {
            sku: Some(sku.into()),
            name: name.into(),
            description: None,
            stock_on_hand: 0,
            base_product_id: Some(base_product_id.into()),
            pack_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPrice {
    pub product_id: String,
    pub category_id: Option<String>,
    pub currency: String,
    pub amount: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

const PRODUCT_COLUMNS: &str = r#"
    id::text AS id, sku, name, is_active, stock_on_hand, stock_reserved,
    base_product_id::text AS base_product_id, pack_size
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog administration.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: PgPool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts a customer category and returns its id.
    pub async fn create_category(&self, code: &str, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO customer_categories (id, code, name) VALUES ($1::uuid, $2, $3)")
            .bind(&id)
            .bind(code)
            .bind(name)
            .execute(&self.pool)
            .await?;

        debug!(id = %id, code = %code, "Created customer category");
        Ok(id)
    }

    /// Looks up a category id by its code.
    pub async fn category_by_code(&self, code: &str) -> DbResult<Option<String>> {
        let id = sqlx::query_scalar("SELECT id::text FROM customer_categories WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn create_customer(&self, input: NewCustomer) -> DbResult<Customer> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, email, category_id)
            VALUES ($1::uuid, $2, $3, $4, $5::uuid)
            "#,
        )
        .bind(&id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.category_id)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, "Created customer");
        Ok(Customer {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            category_id: input.category_id,
        })
    }

    pub async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        customer(&mut conn, id).await
    }

    pub async fn create_product(&self, input: NewProduct) -> DbResult<ProductStock> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, description, stock_on_hand, base_product_id, pack_size)
            VALUES ($1::uuid, $2, $3, $4, $5, $6::uuid, $7)
            "#,
        )
        .bind(&id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.stock_on_hand)
        .bind(&input.base_product_id)
        .bind(input.pack_size)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, sku = ?input.sku, "Created product");
        self.get_product(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<ProductStock>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1::uuid");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn set_product_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = $2, updated_at = now() WHERE id = $1::uuid",
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn create_price(&self, input: NewPrice) -> DbResult<ProductPrice> {
        let id = Uuid::new_v4().to_string();

        let row: PriceRow = sqlx::query_as(
            r#"
            INSERT INTO product_prices (id, product_id, category_id, currency, amount, valid_from, valid_to)
            VALUES ($1::uuid, $2::uuid, $3::uuid, $4, $5, $6, $7)
            RETURNING id::text AS id, product_id::text AS product_id,
                      category_id::text AS category_id, currency, amount,
                      valid_from, valid_to, created_at
            "#,
        )
        .bind(&id)
        .bind(&input.product_id)
        .bind(&input.category_id)
        .bind(&input.currency)
        .bind(input.amount)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %id, product_id = %input.product_id, amount = %input.amount, "Created price");
        Ok(row.into())
    }

    /// Admin stock edit. Locks the row and refuses to go below the reserved
    /// count.
    pub async fn set_stock_on_hand(&self, product_id: &str, on_hand: i64) -> DbResult<StockLevel> {
        let mut tx = self.pool.begin().await?;

        let current = stock::lock_stock(&mut *tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let next = StockLevel::new(product_id, on_hand, current.reserved).map_err(|e| {
            DbError::CheckViolation {
                constraint: e.to_string(),
            }
        })?;
        stock::write_stock(&mut *tx, &next).await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            from = current.on_hand,
            to = next.on_hand,
            reserved = next.reserved,
            "Stock on hand adjusted"
        );
        Ok(next)
    }
}

// =============================================================================
// Engine Reads
// =============================================================================

pub(crate) async fn customer(conn: &mut PgConnection, id: &str) -> DbResult<Option<Customer>> {
    let row: Option<CustomerRow> = sqlx::query_as(
        r#"
        SELECT id::text AS id, first_name, last_name, category_id::text AS category_id
        FROM customers
        WHERE id = $1::uuid
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(Into::into))
}

/// Only active products can be sold.
pub(crate) async fn product_exists(conn: &mut PgConnection, id: &str) -> DbResult<bool> {
    let exists = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1::uuid AND is_active)",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Category-tier and default-tier rows valid at `now`, best first.
pub(crate) async fn price_candidates(
    conn: &mut PgConnection,
    product_id: &str,
    category_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<Vec<ProductPrice>> {
    let rows: Vec<PriceRow> = sqlx::query_as(
        r#"
        SELECT id::text AS id, product_id::text AS product_id,
               category_id::text AS category_id, currency, amount,
               valid_from, valid_to, created_at
        FROM product_prices
        WHERE product_id = $1::uuid
          AND (
            ($2::uuid IS NOT NULL AND category_id = $2::uuid)
            OR category_id IS NULL
          )
          AND valid_from <= $3
          AND (valid_to IS NULL OR $3 < valid_to)
        ORDER BY (category_id IS NULL) ASC, valid_from DESC, created_at DESC
        "#,
    )
    .bind(product_id)
    .bind(category_id)
    .bind(now)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}
