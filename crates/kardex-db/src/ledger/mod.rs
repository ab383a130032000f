//! # Inventory Ledger
//!
//! The four entry operations and the stock queries.
//!
//! ## Entry Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate input (no transaction yet)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  StockGuard::lock_all(keys)          ← first statement, sorted keys     │
//! │  CatalogStore::require_*             ← NotFound                         │
//! │  read lots, plan with kardex-core    ← InsufficientStock, Validation    │
//! │  LotStore changes + KardexLedger rows                                   │
//! │  COMMIT                              (any error above: ROLLBACK)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  observer.stock_changed(..) per touched pair                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Stock Figures
//! [`InventoryLedger::current_stock`] is the sum of live lots and backs
//! intake, sales and transfers. [`InventoryLedger::adjusted_available_stock`]
//! also subtracts every recorded exit adjustment, because exit adjustments
//! only write the ledger and never reduce a lot. Only `adjust_exit` checks
//! against the second figure.

mod adjustment;
mod depletion;
mod intake;
mod transfer;

use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::warn;

use kardex_core::cost::weighted_average_unit_cost;
use kardex_core::report::{running_balance, KardexLine, StockPosition};
use kardex_core::validation::validate_id;
use kardex_core::{InventoryLot, KardexMovement, MovementKind, StockChange, StockKey, UnitCost};

use crate::error::DbResult;
use crate::observer::{LoggingObserver, StockObserver};
use crate::repository::kardex::KardexLedger;
use crate::repository::lot::LotStore;

/// Entry point for every stock mutation and query.
///
/// Cheap to clone; clones share the pool and the observer.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
    observer: Arc<dyn StockObserver>,
}

impl InventoryLedger {
    /// Creates a ledger that logs stock changes.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger {
            pool,
            observer: Arc::new(LoggingObserver),
        }
    }

    /// Replaces the stock observer.
    pub fn with_observer(mut self, observer: Arc<dyn StockObserver>) -> Self {
        self.observer = observer;
        self
    }

    // =========================================================================
    // Stock Queries
    // =========================================================================

    /// Σ quantity of the live lots: the authoritative stock figure.
    pub async fn current_stock(&self, warehouse_id: &str, product_id: &str) -> DbResult<i64> {
        let key = stock_key(warehouse_id, product_id)?;
        let mut conn = self.pool.acquire().await?;
        LotStore::total_quantity(&mut conn, &key).await
    }

    /// Live lots minus every recorded exit adjustment.
    ///
    /// The figure exit adjustments are checked against. It differs from
    /// [`current_stock`](Self::current_stock) as soon as one was recorded.
    pub async fn adjusted_available_stock(
        &self,
        warehouse_id: &str,
        product_id: &str,
    ) -> DbResult<i64> {
        let key = stock_key(warehouse_id, product_id)?;
        let mut conn = self.pool.acquire().await?;
        adjusted_available(&mut conn, &key).await
    }

    /// Live lots of a pair, oldest first.
    pub async fn lots(&self, warehouse_id: &str, product_id: &str) -> DbResult<Vec<InventoryLot>> {
        let key = stock_key(warehouse_id, product_id)?;
        let mut conn = self.pool.acquire().await?;
        LotStore::list_ordered_by_age(&mut conn, &key).await
    }

    /// `Σ total_cost / Σ quantity` over the live lots; zero with no lots.
    pub async fn weighted_average_unit_cost(
        &self,
        warehouse_id: &str,
        product_id: &str,
    ) -> DbResult<UnitCost> {
        let lots = self.lots(warehouse_id, product_id).await?;
        Ok(weighted_average_unit_cost(&lots)?)
    }

    /// Movement history of a pair with running quantity and value.
    pub async fn kardex(&self, warehouse_id: &str, product_id: &str) -> DbResult<Vec<KardexLine>> {
        let key = stock_key(warehouse_id, product_id)?;
        let mut conn = self.pool.acquire().await?;
        let movements = KardexLedger::history(&mut conn, &key).await?;
        Ok(running_balance(movements)?)
    }

    /// Every movement written under one reference: the rows of a purchase
    /// invoice, or both sides of a transfer.
    pub async fn movements_by_reference(&self, reference: &str) -> DbResult<Vec<KardexMovement>> {
        validate_id("reference", reference)?;
        let mut conn = self.pool.acquire().await?;
        KardexLedger::by_reference(&mut conn, reference).await
    }

    /// Per-product stock position of one warehouse.
    pub async fn valuation(&self, warehouse_id: &str) -> DbResult<Vec<StockPosition>> {
        validate_id("warehouse_id", warehouse_id)?;
        let mut conn = self.pool.acquire().await?;
        LotStore::positions(&mut conn, warehouse_id).await
    }

    // =========================================================================
    // Notification
    // =========================================================================

    /// Tells the observer about each pair, once, after a commit.
    ///
    /// The operation has already committed, so a failed read only logs.
    async fn notify(&self, keys: &[StockKey]) {
        let mut ordered = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        for key in &ordered {
            match self.stock_change(key).await {
                Ok(change) => self.observer.stock_changed(&change),
                Err(e) => warn!(key = %key, error = %e, "Stock observer not notified"),
            }
        }
    }

    async fn stock_change(&self, key: &StockKey) -> DbResult<StockChange> {
        let mut conn = self.pool.acquire().await?;
        let on_hand = LotStore::total_quantity(&mut conn, key).await?;
        let product_on_hand = LotStore::product_total_quantity(&mut conn, &key.product_id).await?;

        Ok(StockChange {
            warehouse_id: key.warehouse_id.clone(),
            product_id: key.product_id.clone(),
            on_hand,
            product_on_hand,
        })
    }
}

/// Live lots minus recorded exit adjustments, on the caller's connection.
pub(crate) async fn adjusted_available(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<i64> {
    let on_hand = LotStore::total_quantity(conn, key).await?;
    let adjusted_out =
        KardexLedger::sum_quantity_by_kind(conn, key, MovementKind::AdjustmentExit).await?;
    Ok(on_hand - adjusted_out)
}

fn stock_key(warehouse_id: &str, product_id: &str) -> DbResult<StockKey> {
    validate_id("warehouse_id", warehouse_id)?;
    validate_id("product_id", product_id)?;
    Ok(StockKey::new(warehouse_id, product_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::observer::testing::RecordingObserver;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{purchase, seed_catalog, seeded_db};
    use kardex_core::{ErrorKind, TransferLine};
    use std::time::Duration;

    #[tokio::test]
    async fn test_queries_on_empty_pair() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        assert_eq!(ledger.current_stock("W1", "P1").await.unwrap(), 0);
        assert_eq!(ledger.adjusted_available_stock("W1", "P1").await.unwrap(), 0);
        assert!(ledger.lots("W1", "P1").await.unwrap().is_empty());
        assert!(ledger.kardex("W1", "P1").await.unwrap().is_empty());
        assert_eq!(
            ledger.weighted_average_unit_cost("W1", "P1").await.unwrap(),
            UnitCost::zero()
        );
    }

    #[tokio::test]
    async fn test_blank_ids_are_validation_errors() {
        let db = seeded_db().await;
        let err = db.ledger().current_stock("", "P1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_kardex_running_balance_and_valuation() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        ledger.receive_purchase_line(&purchase("W1", "P1", "INV-1", 10, 1000, 1)).await.unwrap();
        ledger.receive_purchase_line(&purchase("W1", "P1", "INV-2", 5, 1200, 5)).await.unwrap();
        ledger.receive_purchase_line(&purchase("W1", "P2", "INV-2", 4, 250, 5)).await.unwrap();
        ledger.deplete_for_sale("W1", "P1", 12).await.unwrap();

        let lines = ledger.kardex("W1", "P1").await.unwrap();
        let balances: Vec<(i64, i64)> = lines
            .iter()
            .map(|l| (l.balance_quantity, l.balance_value.cents()))
            .collect();
        assert_eq!(
            balances,
            vec![(10, 10000), (15, 16000), (5, 6000), (3, 3600)]
        );

        let positions = ledger.valuation("W1").await.unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].product_id, "P1");
        assert_eq!(positions[0].quantity, 3);
        assert_eq!(positions[0].total_cost.cents(), 3600);
        assert_eq!(positions[0].average_unit_cost, UnitCost::from_cents(1200));
        assert_eq!(positions[1].product_id, "P2");
        assert_eq!(positions[1].total_cost.cents(), 1000);
    }

    #[tokio::test]
    async fn test_movements_by_reference() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        let lot = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 8, 1000, 1))
            .await
            .unwrap();
        ledger.receive_purchase_line(&purchase("W1", "P2", "INV-1", 2, 300, 1)).await.unwrap();
        let transfer = ledger
            .transfer_between_warehouses(
                "W1",
                "W2",
                &[TransferLine {
                    lot_id: lot.id.clone(),
                    product_id: "P1".to_string(),
                    invoice_id: Some("INV-1".to_string()),
                    quantity: 5,
                }],
            )
            .await
            .unwrap();

        let invoice_rows = ledger.movements_by_reference("INV-1").await.unwrap();
        assert_eq!(invoice_rows.len(), 2);
        assert!(invoice_rows
            .iter()
            .all(|m| m.movement_kind == MovementKind::PurchaseEntry));

        let transfer_rows = ledger
            .movements_by_reference(&transfer.transfer_id)
            .await
            .unwrap();
        let ids: Vec<&str> = transfer_rows.iter().map(|m| m.id.as_str()).collect();
        let expected: Vec<&str> = transfer.movements.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, expected);
        let kinds: Vec<MovementKind> = transfer_rows.iter().map(|m| m.movement_kind).collect();
        assert_eq!(kinds, vec![MovementKind::TransferOut, MovementKind::TransferIn]);

        assert!(ledger.movements_by_reference("T-none").await.unwrap().is_empty());
        let err = ledger.movements_by_reference(" ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_kardex_of_pair_past_money_range_is_an_error() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        let half = i64::MAX / 2 + 1;
        ledger.adjust_entry("W1", "P1", 1, UnitCost::from_cents(half)).await.unwrap();
        ledger.adjust_entry("W1", "P1", 1, UnitCost::from_cents(half)).await.unwrap();

        let err = ledger.kardex("W1", "P1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            ledger.weighted_average_unit_cost("W1", "P1").await.unwrap(),
            UnitCost::from_cents(half)
        );
    }

    #[tokio::test]
    async fn test_observer_sees_every_touched_pair_after_commit() {
        let db = seeded_db().await;
        let observer = Arc::new(RecordingObserver::default());
        let ledger = db.ledger_with_observer(observer.clone());

        let lot = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 8, 1000, 1))
            .await
            .unwrap();
        ledger
            .transfer_between_warehouses(
                "W1",
                "W2",
                &[TransferLine {
                    lot_id: lot.id.clone(),
                    product_id: "P1".to_string(),
                    invoice_id: None,
                    quantity: 5,
                }],
            )
            .await
            .unwrap();

        let changes = observer.changes();
        assert_eq!(changes.len(), 3);

        assert_eq!(changes[0].warehouse_id, "W1");
        assert_eq!(changes[0].on_hand, 8);

        // Transfer: sorted keys, product-wide total unchanged
        assert_eq!(changes[1].warehouse_id, "W1");
        assert_eq!(changes[1].on_hand, 3);
        assert_eq!(changes[1].product_on_hand, 8);
        assert_eq!(changes[2].warehouse_id, "W2");
        assert_eq!(changes[2].on_hand, 5);
        assert_eq!(changes[2].product_on_hand, 8);
    }

    #[tokio::test]
    async fn test_failed_operation_does_not_notify() {
        let db = seeded_db().await;
        let observer = Arc::new(RecordingObserver::default());
        let ledger = db.ledger_with_observer(observer.clone());

        let err = ledger.deplete_for_sale("W1", "P1", 1).await.unwrap_err();
        assert!(err.is_insufficient_stock());
        assert!(observer.changes().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("kardex.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(30));
        let db = Database::new(config).await.unwrap();
        seed_catalog(&db).await;

        let ledger = db.ledger();
        ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 10, 1000, 1))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.deplete_for_sale("W1", "P1", 3).await
            }));
        }

        let mut sold = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(records) => sold += records.iter().map(|r| r.quantity_taken).sum::<i64>(),
                Err(DbError::Domain(e)) if e.kind() == ErrorKind::InsufficientStock => {
                    rejected += 1
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(sold, 9);
        assert_eq!(rejected, 5);
        assert_eq!(ledger.current_stock("W1", "P1").await.unwrap(), 1);

        let sale_rows: i64 = ledger
            .kardex("W1", "P1")
            .await
            .unwrap()
            .iter()
            .filter(|l| l.movement.movement_kind == MovementKind::SaleExit)
            .map(|l| l.movement.quantity)
            .sum();
        assert_eq!(sale_rows, 9);

        db.close().await;
    }
}
