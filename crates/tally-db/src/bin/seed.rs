//! # Seed Data Generator
//!
//! Populates the database with the sample catalog for development, and
//! optionally records demo sales through the ledger so insights have data.
//!
//! ## Usage
//! ```bash
//! # Sample catalog only
//! cargo run -p tally-db --bin seed
//!
//! # Catalog plus 25 demo sales
//! cargo run -p tally-db --bin seed -- --sales 25
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```

use std::env;

use tally_core::{Cashier, NewCustomer, NewProduct, NewSale, NewSaleItem, PaymentMethod, Product};
use tally_db::{Database, DbConfig, EngineConfig};

/// (name, description, price, cost, stock, category, barcode)
const SAMPLE_PRODUCTS: &[(&str, &str, i64, i64, i64, &str, &str)] = &[
    ("Laptop", "High-performance laptop", 99_999, 70_000, 15, "Electronics", "1234567890123"),
    ("Wireless Mouse", "Ergonomic wireless mouse", 2_999, 1_500, 50, "Electronics", "1234567890124"),
    ("Keyboard", "Mechanical keyboard", 7_999, 4_500, 30, "Electronics", "1234567890125"),
    ("Monitor", "24-inch LED monitor", 19_999, 15_000, 20, "Electronics", "1234567890126"),
];

const PAYMENT_METHODS: &[PaymentMethod] =
    &[PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Transfer];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 0;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(0);
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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Demo sales to record (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut catalog: Vec<Product> = Vec::with_capacity(SAMPLE_PRODUCTS.len());
    for (name, description, price, cost, stock, category, barcode) in SAMPLE_PRODUCTS {
        let product = db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                description: Some(description.to_string()),
                price_cents: *price,
                cost_cents: *cost,
                stock: *stock,
                category: Some(category.to_string()),
                barcode: Some(barcode.to_string()),
                image: None,
            })
            .await?;
        println!("  + {} ({}, stock {})", product.name, product.price(), product.stock);
        catalog.push(product);
    }

    let customer = db
        .customers()
        .create(NewCustomer {
            name: "Walk-in Regular".to_string(),
            email: Some("regular@example.com".to_string()),
            phone: None,
            address: None,
        })
        .await?;
    println!("  + customer {}", customer.name);

    if sales > 0 {
        println!();
        println!("Recording {} demo sales...", sales);

        let ledger = db.ledger(EngineConfig::default());
        let cashier = Cashier::new("seed", "Cashier User");
        let mut recorded = 0;

        for n in 0..sales {
            let product = &catalog[n % catalog.len()];
            let request = NewSale {
                items: vec![NewSaleItem {
                    product_id: product.id.clone(),
                    quantity: 1 + (n % 3) as i64,
                    unit_price_cents: product.price_cents,
                    discount_cents: 0,
                }],
                customer_id: (n % 4 == 0).then(|| customer.id.clone()),
                discount_cents: 0,
                payment_method: PAYMENT_METHODS[n % PAYMENT_METHODS.len()],
            };

            match ledger.create_sale(request, &cashier).await {
                Ok(sale) => {
                    recorded += 1;
                    println!("  {} {}", sale.invoice_number, sale.total());
                }
                // Small catalog: running out of a product is expected.
                Err(e) => eprintln!("  skipped: {}", e),
            }
        }

        println!("✓ Recorded {} sales", recorded);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
