//! # Kardex Ledger
//!
//! The append-only movement table. Rows are inserted and read, never
//! updated or deleted; the schema's triggers reject both.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use kardex_core::{FlowDirection, KardexMovement, Money, MovementKind, StockKey, UnitCost};

use crate::error::{DbError, DbResult};

/// Row shape of `kardex_movements`.
///
/// Unit cost is stored as decimal text so fractional cents survive.
#[derive(Debug, FromRow)]
struct MovementRow {
    id: String,
    warehouse_id: String,
    product_id: String,
    lot_id: Option<String>,
    movement_kind: MovementKind,
    flow_direction: FlowDirection,
    quantity: i64,
    unit_cost_cents: String,
    total_cost_cents: i64,
    reference: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<MovementRow> for KardexMovement {
    type Error = DbError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let unit_cost: UnitCost = row.unit_cost_cents.parse().map_err(|_| DbError::CorruptValue {
            column: "unit_cost_cents".to_string(),
            value: row.unit_cost_cents.clone(),
        })?;

        Ok(KardexMovement {
            id: row.id,
            warehouse_id: row.warehouse_id,
            product_id: row.product_id,
            lot_id: row.lot_id,
            movement_kind: row.movement_kind,
            flow_direction: row.flow_direction,
            quantity: row.quantity,
            unit_cost,
            total_cost: Money::from_cents(row.total_cost_cents),
            reference: row.reference,
            timestamp: row.timestamp,
        })
    }
}

/// Writer and reader of movement rows.
#[derive(Debug, Clone, Copy)]
pub struct KardexLedger;

impl KardexLedger {
    /// Appends one movement. Pure insert.
    pub async fn append(conn: &mut SqliteConnection, movement: &KardexMovement) -> DbResult<()> {
        debug!(
            id = %movement.id,
            warehouse_id = %movement.warehouse_id,
            product_id = %movement.product_id,
            kind = %movement.movement_kind,
            quantity = movement.quantity,
            unit_cost = %movement.unit_cost,
            total_cost = %movement.total_cost,
            "Appending kardex movement"
        );

        sqlx::query(
            r#"
            INSERT INTO kardex_movements (
                id, warehouse_id, product_id, lot_id,
                movement_kind, flow_direction,
                quantity, unit_cost_cents, total_cost_cents,
                reference, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.warehouse_id)
        .bind(&movement.product_id)
        .bind(&movement.lot_id)
        .bind(movement.movement_kind)
        .bind(movement.flow_direction)
        .bind(movement.quantity)
        .bind(movement.unit_cost.to_string())
        .bind(movement.total_cost.cents())
        .bind(&movement.reference)
        .bind(movement.timestamp)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends several movements in order.
    pub async fn append_all(
        conn: &mut SqliteConnection,
        movements: &[KardexMovement],
    ) -> DbResult<()> {
        for movement in movements {
            Self::append(conn, movement).await?;
        }
        Ok(())
    }

    /// Movements of one pair in the order they were written.
    pub async fn history(
        conn: &mut SqliteConnection,
        key: &StockKey,
    ) -> DbResult<Vec<KardexMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT
                id, warehouse_id, product_id, lot_id,
                movement_kind, flow_direction,
                quantity, unit_cost_cents, total_cost_cents,
                reference, timestamp
            FROM kardex_movements
            WHERE warehouse_id = ?1 AND product_id = ?2
            ORDER BY rowid
            "#,
        )
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(KardexMovement::try_from).collect()
    }

    /// Movements sharing a reference (an invoice or a transfer id).
    pub async fn by_reference(
        conn: &mut SqliteConnection,
        reference: &str,
    ) -> DbResult<Vec<KardexMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT
                id, warehouse_id, product_id, lot_id,
                movement_kind, flow_direction,
                quantity, unit_cost_cents, total_cost_cents,
                reference, timestamp
            FROM kardex_movements
            WHERE reference = ?1
            ORDER BY rowid
            "#,
        )
        .bind(reference)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(KardexMovement::try_from).collect()
    }

    /// Σ quantity of one kind of movement for a pair.
    pub async fn sum_quantity_by_kind(
        conn: &mut SqliteConnection,
        key: &StockKey,
        kind: MovementKind,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM kardex_movements
            WHERE warehouse_id = ?1 AND product_id = ?2 AND movement_kind = ?3
            "#,
        )
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .bind(kind)
        .fetch_one(&mut *conn)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;

    #[tokio::test]
    async fn test_append_and_read_back_fractional_cost() {
        let db = seeded_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let key = StockKey::new("W1", "P1");

        // 10.00 over 3 units
        let unit = UnitCost::of(Money::from_cents(1000), 3).unwrap();
        let total = unit.extend(2).unwrap();
        let movement = KardexMovement::new(MovementKind::SaleExit, &key, 2, unit, total, Utc::now())
            .with_lot("L1")
            .with_reference(Some("SALE-1".to_string()));
        KardexLedger::append(&mut conn, &movement).await.unwrap();

        let history = KardexLedger::history(&mut conn, &key).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], movement);
        assert_eq!(history[0].total_cost.cents(), 667);
        assert!(history[0].unit_cost > UnitCost::from_cents(333));
        assert!(history[0].unit_cost < UnitCost::from_cents(334));
    }

    #[tokio::test]
    async fn test_rows_cannot_be_updated_or_deleted() {
        let db = seeded_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let key = StockKey::new("W1", "P1");

        let movement = KardexMovement::new(
            MovementKind::AdjustmentEntry,
            &key,
            1,
            UnitCost::from_cents(100),
            Money::from_cents(100),
            Utc::now(),
        );
        KardexLedger::append(&mut conn, &movement).await.unwrap();

        let update = sqlx::query("UPDATE kardex_movements SET quantity = 2")
            .execute(&mut *conn)
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM kardex_movements")
            .execute(&mut *conn)
            .await;
        assert!(delete.is_err());

        assert_eq!(KardexLedger::history(&mut conn, &key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sum_by_kind_and_reference() {
        let db = seeded_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let key = StockKey::new("W1", "P1");
        let now = Utc::now();
        let free = UnitCost::zero();

        let movements = vec![
            KardexMovement::new(MovementKind::AdjustmentExit, &key, 3, free, Money::zero(), now),
            KardexMovement::new(MovementKind::AdjustmentExit, &key, 4, free, Money::zero(), now),
            KardexMovement::new(MovementKind::SaleExit, &key, 5, free, Money::zero(), now)
                .with_reference(Some("T-1".to_string())),
        ];
        KardexLedger::append_all(&mut conn, &movements).await.unwrap();

        let exits = KardexLedger::sum_quantity_by_kind(&mut conn, &key, MovementKind::AdjustmentExit)
            .await
            .unwrap();
        assert_eq!(exits, 7);

        let none = KardexLedger::sum_quantity_by_kind(&mut conn, &key, MovementKind::TransferIn)
            .await
            .unwrap();
        assert_eq!(none, 0);

        let referenced = KardexLedger::by_reference(&mut conn, "T-1").await.unwrap();
        assert_eq!(referenced.len(), 1);
        assert_eq!(referenced[0].movement_kind, MovementKind::SaleExit);
    }
}
