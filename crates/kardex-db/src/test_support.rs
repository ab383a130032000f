//! Shared fixtures for the storage tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use kardex_core::{PurchaseLine, UnitCost};

use crate::pool::{Database, DbConfig};

/// In-memory database with warehouses W1, W2 and products P1, P2.
pub async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed_catalog(&db).await;
    db
}

pub async fn seed_catalog(db: &Database) {
    db.add_warehouse("W1", "Main").await.unwrap();
    db.add_warehouse("W2", "Branch").await.unwrap();
    db.add_product("P1", "Steel bolt").await.unwrap();
    db.add_product("P2", "Hex nut").await.unwrap();
}

/// Midnight UTC, `n` days after 2026-01-01.
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn purchase(
    warehouse_id: &str,
    product_id: &str,
    invoice_id: &str,
    quantity: i64,
    unit_cents: i64,
    received_day: i64,
) -> PurchaseLine {
    PurchaseLine {
        warehouse_id: warehouse_id.to_string(),
        product_id: product_id.to_string(),
        supplier_id: "S1".to_string(),
        invoice_id: invoice_id.to_string(),
        quantity,
        unit_cost_after_tax: UnitCost::from_cents(unit_cents),
        received_at: day(received_day),
    }
}
