//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p shopkeep-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p shopkeep-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p shopkeep-db --bin seed -- --db ./data/shopkeep.db
//! ```
//!
//! Each product gets a unique SKU (`{CATEGORY}-{NAME}-{INDEX}`), a price,
//! a cost at 60-80% of price, reorder thresholds and an opening stock
//! level. Opening stock goes through the product insert path, which writes
//! a seed `stock_in` ledger entry, so a seeded database already satisfies
//! the movement-log accounting invariant.

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use shopkeep_core::Product;
use shopkeep_db::{Database, DbConfig};

/// Product categories for realistic test data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Cola", "Lemonade", "Orange Juice", "Apple Juice", "Iced Tea", "Sparkling Water",
            "Still Water", "Energy Drink", "Cold Brew", "Ginger Beer",
        ],
    ),
    (
        "SNK",
        &[
            "Salted Crisps", "Tortilla Chips", "Chocolate Bar", "Gummy Bears", "Trail Mix",
            "Oat Cookies", "Pretzels", "Popcorn", "Granola Bar", "Rice Cakes",
        ],
    ),
    (
        "DRY",
        &[
            "Whole Milk", "Skim Milk", "Oat Milk", "Cheddar", "Mozzarella", "Butter",
            "Greek Yogurt", "Sour Cream", "Eggs Dozen", "Cream Cheese",
        ],
    ),
    (
        "GRO",
        &[
            "White Bread", "Wheat Bread", "Spaghetti", "Penne", "White Rice", "Brown Rice",
            "Canned Beans", "Canned Tomatoes", "Peanut Butter", "Honey",
        ],
    ),
];

/// Pack size variants with price add-ons in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("6-Pack", 300),
    ("12-Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./shopkeep_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopkeep Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopkeep_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shopkeep Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category_code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(
                    category_code,
                    name,
                    size_name,
                    *price_addon,
                    category_idx * 1000 + name_idx * 20 + size_idx,
                );

                if let Err(e) = db.products().insert(&product, "seed").await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let movements = db.movements().count().await?;
    println!("  Opening-stock ledger entries: {}", movements);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let short: String = name
        .replace(' ', "")
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:03}", category, short, seed);

    // Base price 1.99-9.99 plus the size add-on
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Cost at 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_cents = Some(price_cents * cost_pct / 100);

    // Opening stock 0-100, reorder threshold 5-15
    let current_stock = (seed % 101) as i64;
    let min_stock = 5 + (seed % 11) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        name: format!("{} {}", name, size),
        description: None,
        price_cents,
        cost_cents,
        min_stock,
        max_stock: Some(200),
        current_stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
