//! Purchase intake: one invoice line becomes one new lot.

use tracing::info;

use kardex_core::validation::{extended_cost, validate_purchase_line};
use kardex_core::{InventoryLot, KardexMovement, MovementKind, NewLot, PurchaseLine, StockKey};

use super::InventoryLedger;
use crate::error::DbResult;
use crate::repository::catalog::CatalogStore;
use crate::repository::guard::StockGuard;
use crate::repository::kardex::KardexLedger;
use crate::repository::lot::LotStore;

impl InventoryLedger {
    /// Receives one purchase invoice line.
    ///
    /// Creates a lot stamped with the line's intake time and costed at
    /// `unit_cost_after_tax × quantity`, and writes one `PurchaseEntry` row
    /// referencing the invoice. Lines are never merged into existing lots.
    pub async fn receive_purchase_line(&self, line: &PurchaseLine) -> DbResult<InventoryLot> {
        validate_purchase_line(line)?;
        let total_cost = extended_cost(&line.unit_cost_after_tax, line.quantity)?;
        let key = StockKey::new(&line.warehouse_id, &line.product_id);

        let mut tx = self.pool.begin().await?;
        StockGuard::lock(&mut tx, &key).await?;
        CatalogStore::require_warehouse(&mut tx, &key.warehouse_id).await?;
        CatalogStore::require_product(&mut tx, &key.product_id).await?;

        let lot = LotStore::create(
            &mut tx,
            &NewLot {
                warehouse_id: key.warehouse_id.clone(),
                product_id: key.product_id.clone(),
                supplier_id: Some(line.supplier_id.clone()),
                source_invoice_id: Some(line.invoice_id.clone()),
                quantity: line.quantity,
                total_cost,
                entry_timestamp: line.received_at,
            },
        )
        .await?;

        let movement = KardexMovement::new(
            MovementKind::PurchaseEntry,
            &key,
            line.quantity,
            line.unit_cost_after_tax,
            lot.total_cost(),
            line.received_at,
        )
        .with_lot(&lot.id)
        .with_reference(Some(line.invoice_id.clone()));
        KardexLedger::append(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            lot_id = %lot.id,
            warehouse_id = %key.warehouse_id,
            product_id = %key.product_id,
            invoice_id = %line.invoice_id,
            quantity = line.quantity,
            "Purchase line received"
        );

        self.notify(&[key]).await;
        Ok(lot)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{day, purchase, seeded_db};
    use kardex_core::{ErrorKind, MovementKind, UnitCost};

    #[tokio::test]
    async fn test_purchase_creates_lot_and_entry() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        let lot = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 10, 1000, 1))
            .await
            .unwrap();
        assert_eq!(lot.quantity, 10);
        assert_eq!(lot.total_cost_cents, 10000);
        assert_eq!(lot.entry_timestamp, day(1));
        assert_eq!(lot.source_invoice_id.as_deref(), Some("INV-1"));
        assert_eq!(lot.supplier_id.as_deref(), Some("S1"));

        let lines = ledger.kardex("W1", "P1").await.unwrap();
        assert_eq!(lines.len(), 1);
        let movement = &lines[0].movement;
        assert_eq!(movement.movement_kind, MovementKind::PurchaseEntry);
        assert_eq!(movement.quantity, 10);
        assert_eq!(movement.unit_cost, UnitCost::from_cents(1000));
        assert_eq!(movement.total_cost.cents(), 10000);
        assert_eq!(movement.lot_id.as_deref(), Some(lot.id.as_str()));
        assert_eq!(movement.reference.as_deref(), Some("INV-1"));
    }

    #[tokio::test]
    async fn test_fractional_after_tax_cost_rounds_half_even() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        // 4 × 0.125 = 0.5 rounds to 0, 12 × 0.125 = 1.5 rounds to 2
        let mut line = purchase("W1", "P1", "INV-1", 4, 0, 1);
        line.unit_cost_after_tax = "0.125".parse().unwrap();
        let lot = ledger.receive_purchase_line(&line).await.unwrap();
        assert_eq!(lot.total_cost_cents, 0);

        let mut line = purchase("W1", "P1", "INV-2", 12, 0, 1);
        line.unit_cost_after_tax = "0.125".parse().unwrap();
        let lot = ledger.receive_purchase_line(&line).await.unwrap();
        assert_eq!(lot.total_cost_cents, 2);
    }

    #[tokio::test]
    async fn test_unknown_warehouse_rolls_back() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        let err = ledger
            .receive_purchase_line(&purchase("W9", "P1", "INV-1", 10, 1000, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(ledger.kardex("W9", "P1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_cost_is_rejected_not_capped() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        // 2 × 5e18 cents does not fit a stored total
        let err = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 2, 5_000_000_000_000_000_000, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.current_stock("W1", "P1").await.unwrap(), 0);
        assert!(ledger.kardex("W1", "P1").await.unwrap().is_empty());

        // The largest single total still goes in exactly
        let lot = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-2", 1, 5_000_000_000_000_000_000, 1))
            .await
            .unwrap();
        assert_eq!(lot.total_cost_cents, 5_000_000_000_000_000_000);
    }

    #[tokio::test]
    async fn test_invalid_line_is_rejected() {
        let db = seeded_db().await;
        let ledger = db.ledger();

        let err = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 0, 1000, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .receive_purchase_line(&purchase("W1", "P1", "INV-1", 1, -5, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.current_stock("W1", "P1").await.unwrap(), 0);
    }
}
