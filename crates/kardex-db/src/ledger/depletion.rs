//! FIFO depletion: sales draw the oldest lots first.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use kardex_core::fifo::plan_depletion;
use kardex_core::validation::{validate_id, validate_quantity};
use kardex_core::{ConsumptionRecord, KardexMovement, MovementKind, StockKey};

use super::InventoryLedger;
use crate::error::DbResult;
use crate::repository::catalog::CatalogStore;
use crate::repository::guard::StockGuard;
use crate::repository::kardex::KardexLedger;
use crate::repository::lot::LotStore;

impl InventoryLedger {
    /// Consumes `quantity` units for a sale, oldest lots first.
    ///
    /// One `SaleExit` row is written per lot touched, each at that lot's own
    /// unit cost.
    ///
    /// ## Errors
    /// - `InsufficientStock` if the live lots hold fewer units (nothing changes)
    /// - `NotFound` for an unknown warehouse or product
    pub async fn deplete_for_sale(
        &self,
        warehouse_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Vec<ConsumptionRecord>> {
        validate_id("warehouse_id", warehouse_id)?;
        validate_id("product_id", product_id)?;
        validate_quantity(quantity)?;
        let key = StockKey::new(warehouse_id, product_id);

        let mut tx = self.pool.begin().await?;
        StockGuard::lock(&mut tx, &key).await?;
        CatalogStore::require_warehouse(&mut tx, warehouse_id).await?;
        CatalogStore::require_product(&mut tx, product_id).await?;

        let records = deplete(&mut tx, &key, quantity, MovementKind::SaleExit).await?;

        tx.commit().await?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity,
            lots = records.len(),
            "Sale depleted stock"
        );

        self.notify(&[key]).await;
        Ok(records)
    }
}

/// Runs a FIFO depletion on the caller's transaction.
///
/// The caller holds the pair's guard. Lots are read, planned, reduced and
/// the exit rows written; on error the caller's transaction rolls it all back.
pub(crate) async fn deplete(
    conn: &mut SqliteConnection,
    key: &StockKey,
    requested: i64,
    exit_kind: MovementKind,
) -> DbResult<Vec<ConsumptionRecord>> {
    let lots = LotStore::list_ordered_by_age(conn, key).await?;
    let plan = plan_depletion(key, &lots, requested)?;
    let now = Utc::now();

    for draw in &plan.draws {
        debug!(
            lot_id = %draw.lot_id,
            quantity = draw.quantity_taken,
            unit_cost = %draw.unit_cost,
            exhausts_lot = draw.exhausts_lot,
            "FIFO draw"
        );

        LotStore::reduce(conn, &draw.lot_id, draw.quantity_taken, draw.cost_taken).await?;

        let movement = KardexMovement::new(
            exit_kind,
            key,
            draw.quantity_taken,
            draw.unit_cost,
            draw.cost_taken,
            now,
        )
        .with_lot(&draw.lot_id);
        KardexLedger::append(conn, &movement).await?;
    }

    Ok(plan.into_records())
}
