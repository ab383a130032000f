//! Manual stock corrections.
//!
//! Entry and exit are separate operations with different rules. An entry
//! creates a lot at the given cost. An exit writes a single ledger row at
//! the weighted-average cost and leaves every lot as it is, so it is checked
//! against [`InventoryLedger::adjusted_available_stock`] rather than the
//! live-lot total.

use chrono::Utc;
use tracing::info;

use kardex_core::cost::weighted_average_unit_cost;
use kardex_core::validation::{
    extended_cost, validate_id, validate_quantity, validate_unit_cost,
};
use kardex_core::{
    CoreError, InventoryLot, KardexMovement, MovementKind, NewLot, StockKey, UnitCost,
};

use super::{adjusted_available, InventoryLedger};
use crate::error::DbResult;
use crate::repository::catalog::CatalogStore;
use crate::repository::guard::StockGuard;
use crate::repository::kardex::KardexLedger;
use crate::repository::lot::LotStore;

impl InventoryLedger {
    /// Adds `quantity` units at `unit_cost` as a new lot with no supplier
    /// and no invoice, and writes one `AdjustmentEntry` row.
    pub async fn adjust_entry(
        &self,
        warehouse_id: &str,
        product_id: &str,
        quantity: i64,
        unit_cost: UnitCost,
    ) -> DbResult<InventoryLot> {
        validate_id("warehouse_id", warehouse_id)?;
        validate_id("product_id", product_id)?;
        validate_quantity(quantity)?;
        validate_unit_cost(&unit_cost)?;
        let total_cost = extended_cost(&unit_cost, quantity)?;
        let key = StockKey::new(warehouse_id, product_id);

        let mut tx = self.pool.begin().await?;
        StockGuard::lock(&mut tx, &key).await?;
        CatalogStore::require_warehouse(&mut tx, warehouse_id).await?;
        CatalogStore::require_product(&mut tx, product_id).await?;

        let now = Utc::now();
        let lot = LotStore::create(
            &mut tx,
            &NewLot {
                warehouse_id: warehouse_id.to_string(),
                product_id: product_id.to_string(),
                supplier_id: None,
                source_invoice_id: None,
                quantity,
                total_cost,
                entry_timestamp: now,
            },
        )
        .await?;

        let movement = KardexMovement::new(
            MovementKind::AdjustmentEntry,
            &key,
            quantity,
            unit_cost,
            lot.total_cost(),
            now,
        )
        .with_lot(&lot.id);
        KardexLedger::append(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            lot_id = %lot.id,
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity,
            unit_cost = %unit_cost,
            "Entry adjustment recorded"
        );

        self.notify(&[key]).await;
        Ok(lot)
    }

    /// Records an exit of `quantity` units at the weighted-average cost of
    /// the live lots (zero when there are none).
    ///
    /// Only the ledger is written; no lot changes.
    ///
    /// ## Errors
    /// - `InsufficientStock` if `quantity` exceeds the adjusted available stock
    pub async fn adjust_exit(
        &self,
        warehouse_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<KardexMovement> {
        validate_id("warehouse_id", warehouse_id)?;
        validate_id("product_id", product_id)?;
        validate_quantity(quantity)?;
        let key = StockKey::new(warehouse_id, product_id);

        let mut tx = self.pool.begin().await?;
        StockGuard::lock(&mut tx, &key).await?;
        CatalogStore::require_warehouse(&mut tx, warehouse_id).await?;
        CatalogStore::require_product(&mut tx, product_id).await?;

        let available = adjusted_available(&mut tx, &key).await?;
        if available < quantity {
            return Err(
                CoreError::insufficient(warehouse_id, product_id, available, quantity).into(),
            );
        }

        let lots = LotStore::list_ordered_by_age(&mut tx, &key).await?;
        let average = weighted_average_unit_cost(&lots)?;
        let total_cost = extended_cost(&average, quantity)?;

        let movement = KardexMovement::new(
            MovementKind::AdjustmentExit,
            &key,
            quantity,
            average,
            total_cost,
            Utc::now(),
        );
        KardexLedger::append(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity,
            unit_cost = %average,
            remaining = available - quantity,
            "Exit adjustment recorded"
        );

        self.notify(&[key]).await;
        Ok(movement)
    }
}
