//! Warehouse-to-warehouse transfers of specific lots.
//!
//! ## One Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  origin W1                                destination W2               │
//! │  lot L (P, INV-1) 8 @ 10.00                                            │
//! │     │  take 5 → cost 50.00                                             │
//! │     ▼                                                                   │
//! │  L: 3 / 30.00        TransferOut 5 @ 10   ──► find (W2, P, INV-1)      │
//! │                                                 ├─ found: merge +5/+50 │
//! │                                                 └─ none: new lot 5/50  │
//! │                                             TransferIn 5 @ 10          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every line of a request shares one transaction and one transfer id.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use kardex_core::fifo::draw_from_lot;
use kardex_core::validation::{validate_line_against_lot, validate_transfer_request};
use kardex_core::{
    KardexMovement, MovementKind, NewLot, StockKey, TransferLine, TransferResult,
    TransferredLine, ValidationError,
};

use super::InventoryLedger;
use crate::error::{DbError, DbResult};
use crate::repository::catalog::CatalogStore;
use crate::repository::guard::StockGuard;
use crate::repository::kardex::KardexLedger;
use crate::repository::lot::LotStore;

impl InventoryLedger {
    /// Moves specific lots from `origin` to `destination`.
    ///
    /// Each line names the lot that physically moves; FIFO order does not
    /// apply. Incoming stock merges into a destination lot from the same
    /// invoice when one exists.
    ///
    /// ## Errors
    /// - `Validation` for identical or unknown warehouses, an empty request,
    ///   or a line whose lot is in another warehouse, holds another product,
    ///   or came from another invoice
    /// - `NotFound` for an unknown lot
    /// - `InsufficientStock` if a lot holds fewer units than its line asks
    ///
    /// Any failing line rolls back the whole request.
    pub async fn transfer_between_warehouses(
        &self,
        origin: &str,
        destination: &str,
        lines: &[TransferLine],
    ) -> DbResult<TransferResult> {
        validate_transfer_request(origin, destination, lines)?;

        let keys: Vec<StockKey> = lines
            .iter()
            .flat_map(|line| {
                [
                    StockKey::new(origin, &line.product_id),
                    StockKey::new(destination, &line.product_id),
                ]
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        StockGuard::lock_all(&mut tx, &keys).await?;
        for warehouse_id in [origin, destination] {
            if !CatalogStore::warehouse_exists(&mut tx, warehouse_id).await? {
                return Err(ValidationError::UnknownWarehouse {
                    warehouse_id: warehouse_id.to_string(),
                }
                .into());
            }
        }

        let transfer_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut transferred = Vec::with_capacity(lines.len());
        let mut movements = Vec::with_capacity(lines.len() * 2);

        for line in lines {
            let lot = LotStore::get(&mut tx, &line.lot_id)
                .await?
                .ok_or_else(|| DbError::not_found("Lot", line.lot_id.as_str()))?;
            validate_line_against_lot(origin, line, &lot)?;

            let draw = draw_from_lot(&lot, line.quantity)?;
            LotStore::reduce(&mut tx, &lot.id, draw.quantity_taken, draw.cost_taken).await?;

            let outbound = KardexMovement::new(
                MovementKind::TransferOut,
                &lot.key(),
                draw.quantity_taken,
                draw.unit_cost,
                draw.cost_taken,
                now,
            )
            .with_lot(&lot.id)
            .with_reference(Some(transfer_id.clone()));

            let dest_key = StockKey::new(destination, &lot.product_id);
            let target =
                LotStore::find_merge_target(&mut tx, &dest_key, lot.source_invoice_id.as_deref())
                    .await?;
            let merged = target.is_some();

            let dest_lot = match target {
                Some(existing) => {
                    debug!(lot_id = %existing.id, "Merging into destination lot");
                    LotStore::merge(&mut tx, &existing.id, draw.quantity_taken, draw.cost_taken)
                        .await?
                }
                None => {
                    LotStore::create(
                        &mut tx,
                        &NewLot {
                            warehouse_id: dest_key.warehouse_id.clone(),
                            product_id: dest_key.product_id.clone(),
                            supplier_id: lot.supplier_id.clone(),
                            source_invoice_id: lot.source_invoice_id.clone(),
                            quantity: draw.quantity_taken,
                            total_cost: draw.cost_taken,
                            entry_timestamp: now,
                        },
                    )
                    .await?
                }
            };

            let inbound = KardexMovement::new(
                MovementKind::TransferIn,
                &dest_key,
                draw.quantity_taken,
                draw.unit_cost,
                draw.cost_taken,
                now,
            )
            .with_lot(&dest_lot.id)
            .with_reference(Some(transfer_id.clone()));

            transferred.push(TransferredLine {
                source_lot_id: lot.id.clone(),
                destination_lot_id: dest_lot.id.clone(),
                product_id: lot.product_id.clone(),
                quantity: draw.quantity_taken,
                unit_cost: draw.unit_cost,
                total_cost: draw.cost_taken,
                merged,
            });
            movements.push(outbound);
            movements.push(inbound);
        }

        KardexLedger::append_all(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(
            transfer_id = %transfer_id,
            origin = %origin,
            destination = %destination,
            lines = transferred.len(),
            "Transfer committed"
        );

        self.notify(&keys).await;

        Ok(TransferResult {
            transfer_id,
            origin_warehouse_id: origin.to_string(),
            destination_warehouse_id: destination.to_string(),
            lines: transferred,
            movements,
        })
    }
}
