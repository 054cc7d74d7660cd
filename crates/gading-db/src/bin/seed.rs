//! # Seed Data Generator
//!
//! Populates a PostgreSQL database with demo master data.
//!
//! ## Usage
//! ```bash
//! # Uses DATABASE_URL
//! cargo run -p gading-db --bin seed
//!
//! # Explicit URL, apply migrations first
//! cargo run -p gading-db --bin seed -- --url postgres://localhost/gading --migrate
//! ```
//!
//! ## Generated Data
//! - Categories: REGULAR, WHOLESALE
//! - Customers: one per category
//! - Products: "Teh Botol" (10 on hand), "Air Mineral" (240 on hand) with
//!   12- and 24-pack variants drawing on its stock
//! - Prices: IDR default prices for everything, cheaper WHOLESALE prices for
//!   the pack variants

use chrono::Utc;
use gading_core::{Decimal, Money};
use gading_db::{Database, DbConfig, NewCustomer, NewPrice, NewProduct};
use std::env;
use tracing_subscriber::EnvFilter;

const CURRENCY: &str = "IDR";

/// (sku, name, on_hand, default price)
const BASE_PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("SKU-TX-001", "Teh Botol", 10, 5_000),
    ("AIR-001", "Air Mineral 600ml", 240, 3_000),
];

/// (sku, name, pack size, default price, wholesale price)
const PACKS: &[(&str, &str, i64, i64, i64)] = &[
    ("AIR-001-12", "Air Mineral 600ml x12", 12, 34_000, 32_000),
    ("AIR-001-24", "Air Mineral 600ml x24", 24, 66_000, 62_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut url = env::var("DATABASE_URL").ok();
    let mut migrate = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" | "-u" => {
                if i + 1 < args.len() {
                    url = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--migrate" | "-m" => migrate = true,
            "--help" | "-h" => {
                println!("Gading Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --url <URL>    PostgreSQL URL (default: $DATABASE_URL)");
                println!("  -m, --migrate      Apply migrations before seeding");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(url) = url else {
        eprintln!("DATABASE_URL is not set and --url was not given");
        std::process::exit(2);
    };

    println!("🌱 Gading Seed Data Generator");
    println!("=============================");
    println!();

    let db = Database::new(DbConfig::new(url).max_connections(2).run_migrations(migrate)).await?;
    println!("✓ Connected to database");
    if migrate {
        println!("✓ Migrations applied");
    }

    let catalog = db.catalog();
    if catalog.category_by_code("REGULAR").await?.is_some() {
        println!("⚠ Database is already seeded");
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let regular = catalog.create_category("REGULAR", "Regular").await?;
    let wholesale = catalog.create_category("WHOLESALE", "Wholesale").await?;
    println!("✓ Created 2 customer categories");

    for (first, last, category) in [("Rio", "Test", &regular), ("Ayu", "Grosir", &wholesale)] {
        let customer = catalog
            .create_customer(NewCustomer {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: Some(format!("{}.{}@example.com", first, last).to_lowercase()),
                category_id: Some(category.clone()),
            })
            .await?;
        println!("  customer {} {}", customer.id, customer.display_name());
    }

    let valid_from = Utc::now();
    let mut base_ids = Vec::new();
    for (sku, name, on_hand, price) in BASE_PRODUCTS {
        let product = catalog.create_product(NewProduct::base(*sku, *name, *on_hand)).await?;
        catalog
            .create_price(NewPrice {
                product_id: product.id.clone(),
                category_id: None,
                currency: CURRENCY.to_string(),
                amount: Money::from_major(*price),
                valid_from,
                valid_to: None,
            })
            .await?;
        println!("  product  {} {} ({} on hand)", product.id, name, on_hand);
        base_ids.push(product.id);
    }

    // Packs draw on the last base product
    let Some(water) = base_ids.last() else {
        return Ok(());
    };
    for (sku, name, pack_size, price, wholesale_price) in PACKS {
        let product = catalog
            .create_product(NewProduct::pack(*sku, *name, water.clone(), Decimal::from(*pack_size)))
            .await?;
        for (category, amount) in [(None, *price), (Some(wholesale.clone()), *wholesale_price)] {
            catalog
                .create_price(NewPrice {
                    product_id: product.id.clone(),
                    category_id: category,
                    currency: CURRENCY.to_string(),
                    amount: Money::from_major(amount),
                    valid_from,
                    valid_to: None,
                })
                .await?;
        }
        println!("  product  {} {} (pack of {})", product.id, name, pack_size);
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
