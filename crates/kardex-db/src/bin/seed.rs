//! # Seed Data Generator
//!
//! Populates a ledger database with sample warehouses, products and a few
//! weeks of movements for development.
//!
//! ## Usage
//! ```bash
//! # Seed using kardex.toml / KARDEX_* settings
//! cargo run -p kardex-db --bin seed
//!
//! # Specify config file or database path
//! cargo run -p kardex-db --bin seed -- --config ./kardex.toml
//! cargo run -p kardex-db --bin seed -- --db ./data/kardex.db
//! ```
//!
//! ## Generated Data
//! - Warehouses `MAIN` and `NORTH`
//! - One product per entry in `PRODUCTS`
//! - Two purchase invoices per product, ten days apart
//! - A sale, a transfer to `NORTH` and an entry adjustment for each product

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use kardex_core::{PurchaseLine, TransferLine, UnitCost};
use kardex_db::{CatalogStore, Database, LedgerConfig, LoggingObserver};
use tracing_subscriber::EnvFilter;

const WAREHOUSES: &[(&str, &str)] = &[("MAIN", "Main plant"), ("NORTH", "North depot")];

/// (id, name, base unit cost in cents)
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("RAW-STEEL-01", "Steel sheet 1mm", 2450),
    ("RAW-STEEL-02", "Steel sheet 2mm", 3875),
    ("RAW-ALU-01", "Aluminium bar", 1920),
    ("FAS-BOLT-M8", "Bolt M8", 35),
    ("FAS-NUT-M8", "Nut M8", 12),
    ("FAS-WASH-M8", "Washer M8", 7),
    ("PKG-BOX-S", "Cardboard box small", 95),
    ("PKG-BOX-L", "Cardboard box large", 180),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path = PathBuf::from("./kardex.toml");
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kardex Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: ./kardex.toml)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(Some(&config_path))?;
    if let Some(path) = db_path {
        config.database.path = PathBuf::from(path);
    }

    println!("🌱 Kardex Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");

    let existing = {
        let mut conn = db.pool().acquire().await?;
        CatalogStore::count_products(&mut conn).await?
    };
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name) in WAREHOUSES {
        db.add_warehouse(id, name).await?;
    }
    for (id, name, _) in PRODUCTS {
        db.add_product(id, name).await?;
    }
    println!("✓ {} warehouses, {} products", WAREHOUSES.len(), PRODUCTS.len());

    let ledger = db.ledger_with_observer(Arc::new(LoggingObserver));
    let (main, north) = (WAREHOUSES[0].0, WAREHOUSES[1].0);
    let start = Utc::now() - Duration::days(30);
    let timer = std::time::Instant::now();

    for (idx, (product_id, _, base_cents)) in PRODUCTS.iter().enumerate() {
        let seed = idx as i64;

        let first = ledger
            .receive_purchase_line(&PurchaseLine {
                warehouse_id: main.to_string(),
                product_id: product_id.to_string(),
                supplier_id: format!("SUP-{:02}", idx % 3 + 1),
                invoice_id: format!("INV-{:04}", 1000 + seed * 2),
                quantity: 100 + seed * 10,
                unit_cost_after_tax: UnitCost::from_cents(*base_cents),
                received_at: start,
            })
            .await?;
        // Ten days later at a slightly higher cost
        ledger
            .receive_purchase_line(&PurchaseLine {
                warehouse_id: main.to_string(),
                product_id: product_id.to_string(),
                supplier_id: format!("SUP-{:02}", idx % 3 + 1),
                invoice_id: format!("INV-{:04}", 1001 + seed * 2),
                quantity: 50,
                unit_cost_after_tax: UnitCost::from_cents(base_cents + base_cents / 20),
                received_at: start + Duration::days(10),
            })
            .await?;

        // Leaves 30 units in the first lot for the transfer
        ledger
            .deplete_for_sale(main, product_id, first.quantity - 30)
            .await?;

        ledger
            .transfer_between_warehouses(
                main,
                north,
                &[TransferLine {
                    lot_id: first.id.clone(),
                    product_id: product_id.to_string(),
                    invoice_id: first.source_invoice_id.clone(),
                    quantity: 20,
                }],
            )
            .await?;

        ledger
            .adjust_entry(north, product_id, 5, UnitCost::from_cents(*base_cents))
            .await?;
    }

    println!("✓ Movements written in {:?}", timer.elapsed());
    println!();

    for (warehouse_id, _) in WAREHOUSES {
        println!("Valuation {}:", warehouse_id);
        for position in ledger.valuation(warehouse_id).await? {
            println!(
                "  {:<14} {:>6} units  {:>12}  avg {}",
                position.product_id,
                position.quantity,
                position.total_cost.to_string(),
                position.average_unit_cost
            );
        }
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
