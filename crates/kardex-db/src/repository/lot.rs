//! # Lot Store
//!
//! Database operations for live inventory lots.
//!
//! ## Lot Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Lot Lifecycle                                     │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create(NewLot) ← purchase intake, entry adjustment, transfer   │
//! │                                                                         │
//! │  2. CHANGE                                                             │
//! │     └── apply(Withdraw) ← sale draw, transfer source                   │
//! │     └── apply(Deposit)  ← transfer merge at the destination            │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── a withdrawal that reaches zero deletes the row                 │
//! │         (the table rejects quantity <= 0)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use kardex_core::fifo::order_by_age;
use kardex_core::report::StockPosition;
use kardex_core::{
    CoreError, InventoryLot, LotChangeset, Money, NewLot, StockKey, ValidationError,
};

use crate::error::{DbError, DbResult};

const LOT_COLUMNS: &str = r#"
    id,
    warehouse_id,
    product_id,
    supplier_id,
    source_invoice_id,
    entry_timestamp,
    quantity,
    total_cost_cents,
    updated_at
"#;

/// Live lots.
#[derive(Debug, Clone, Copy)]
pub struct LotStore;

impl LotStore {
    /// Gets a lot by ID.
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<InventoryLot>> {
        let sql = format!("SELECT {LOT_COLUMNS} FROM inventory_lots WHERE id = ?1");
        let lot = sqlx::query_as::<_, InventoryLot>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(lot)
    }

    /// Lots of one pair, oldest first, ties broken by id.
    ///
    /// The FIFO walk relies on this order.
    pub async fn list_ordered_by_age(
        conn: &mut SqliteConnection,
        key: &StockKey,
    ) -> DbResult<Vec<InventoryLot>> {
        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM inventory_lots \
             WHERE warehouse_id = ?1 AND product_id = ?2 \
             ORDER BY entry_timestamp, id"
        );
        let mut lots = sqlx::query_as::<_, InventoryLot>(&sql)
            .bind(&key.warehouse_id)
            .bind(&key.product_id)
            .fetch_all(&mut *conn)
            .await?;

        // Stored timestamps are text; re-sort on the decoded values
        order_by_age(&mut lots);
        Ok(lots)
    }

    /// Creates a lot.
    pub async fn create(conn: &mut SqliteConnection, new: &NewLot) -> DbResult<InventoryLot> {
        new.validate()?;

        let lot = InventoryLot {
            id: Uuid::new_v4().to_string(),
            warehouse_id: new.warehouse_id.clone(),
            product_id: new.product_id.clone(),
            supplier_id: new.supplier_id.clone(),
            source_invoice_id: new.source_invoice_id.clone(),
            entry_timestamp: new.entry_timestamp,
            quantity: new.quantity,
            total_cost_cents: new.total_cost.cents(),
            updated_at: Utc::now(),
        };

        debug!(
            lot_id = %lot.id,
            warehouse_id = %lot.warehouse_id,
            product_id = %lot.product_id,
            quantity = lot.quantity,
            total_cost = %lot.total_cost(),
            "Creating lot"
        );

        sqlx::query(
            r#"
            INSERT INTO inventory_lots (
                id, warehouse_id, product_id, supplier_id, source_invoice_id,
                entry_timestamp, quantity, total_cost_cents, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.warehouse_id)
        .bind(&lot.product_id)
        .bind(&lot.supplier_id)
        .bind(&lot.source_invoice_id)
        .bind(lot.entry_timestamp)
        .bind(lot.quantity)
        .bind(lot.total_cost_cents)
        .bind(lot.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(lot)
    }

    /// Applies a changeset to one lot.
    ///
    /// Returns the lot after the change, or `None` when a withdrawal emptied
    /// and deleted it.
    ///
    /// ## Errors
    /// - `Validation` if the changeset is invalid or would leave negative cost
    /// - `NotFound` if the lot no longer exists
    /// - `InsufficientStock` if a withdrawal exceeds the lot's quantity
    pub async fn apply(
        conn: &mut SqliteConnection,
        lot_id: &str,
        changeset: &LotChangeset,
    ) -> DbResult<Option<InventoryLot>> {
        changeset.validate()?;

        let lot = Self::get(conn, lot_id)
            .await?
            .ok_or_else(|| DbError::not_found("Lot", lot_id))?;

        let new_quantity = lot
            .quantity
            .checked_add(changeset.quantity_delta())
            .ok_or_else(|| ValidationError::out_of_range("quantity"))?;
        let new_cost = lot
            .total_cost()
            .checked_add(changeset.cost_delta())
            .ok_or_else(|| ValidationError::out_of_range("total_cost"))?;

        if new_quantity < 0 {
            return Err(CoreError::insufficient(
                &lot.warehouse_id,
                &lot.product_id,
                lot.quantity,
                changeset.quantity,
            )
            .into());
        }

        if new_quantity == 0 {
            return Self::delete_exhausted(conn, &lot).await.map(|_| None);
        }

        if new_cost.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "total_cost".to_string(),
            }
            .into());
        }

        debug!(
            lot_id = %lot.id,
            direction = ?changeset.direction,
            quantity = changeset.quantity,
            cost = %changeset.cost,
            "Applying lot changeset"
        );

        let now = Utc::now();

        // The quantity check makes a concurrent writer show up as NotFound
        // instead of a lost update
        let result = sqlx::query(
            r#"
            UPDATE inventory_lots SET
                quantity = ?2,
                total_cost_cents = ?3,
                updated_at = ?4
            WHERE id = ?1 AND quantity = ?5
            "#,
        )
        .bind(&lot.id)
        .bind(new_quantity)
        .bind(new_cost.cents())
        .bind(now)
        .bind(lot.quantity)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lot", lot_id));
        }

        Ok(Some(InventoryLot {
            quantity: new_quantity,
            total_cost_cents: new_cost.cents(),
            updated_at: now,
            ..lot
        }))
    }

    /// Takes `quantity` units carrying `cost` out of a lot, deleting it at zero.
    pub async fn reduce(
        conn: &mut SqliteConnection,
        lot_id: &str,
        quantity: i64,
        cost: Money,
    ) -> DbResult<Option<InventoryLot>> {
        Self::apply(conn, lot_id, &LotChangeset::withdraw(quantity, cost)).await
    }

    /// Adds `quantity` units carrying `cost` to an existing lot.
    pub async fn merge(
        conn: &mut SqliteConnection,
        lot_id: &str,
        quantity: i64,
        cost: Money,
    ) -> DbResult<InventoryLot> {
        Self::apply(conn, lot_id, &LotChangeset::deposit(quantity, cost))
            .await?
            .ok_or_else(|| DbError::not_found("Lot", lot_id))
    }

    async fn delete_exhausted(conn: &mut SqliteConnection, lot: &InventoryLot) -> DbResult<()> {
        debug!(lot_id = %lot.id, "Lot exhausted, deleting");

        let result = sqlx::query("DELETE FROM inventory_lots WHERE id = ?1 AND quantity = ?2")
            .bind(&lot.id)
            .bind(lot.quantity)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lot", lot.id.as_str()));
        }
        Ok(())
    }

    /// The existing lot sharing (warehouse, product, invoice), if any.
    ///
    /// Lots without an invoice never match. When several lots share the
    /// invoice the oldest one is the target.
    pub async fn find_merge_target(
        conn: &mut SqliteConnection,
        key: &StockKey,
        invoice_id: Option<&str>,
    ) -> DbResult<Option<InventoryLot>> {
        let Some(invoice_id) = invoice_id else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM inventory_lots \
             WHERE warehouse_id = ?1 AND product_id = ?2 AND source_invoice_id = ?3 \
             ORDER BY entry_timestamp, id \
             LIMIT 1"
        );
        let lot = sqlx::query_as::<_, InventoryLot>(&sql)
            .bind(&key.warehouse_id)
            .bind(&key.product_id)
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(lot)
    }

    /// Σ quantity of the live lots of one pair: the authoritative stock figure.
    pub async fn total_quantity(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM inventory_lots
            WHERE warehouse_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(total)
    }

    /// Σ quantity of a product's live lots across every warehouse.
    pub async fn product_total_quantity(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_lots WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(total)
    }

    /// Per-product quantity and cost of a warehouse's live lots.
    pub async fn positions(
        conn: &mut SqliteConnection,
        warehouse_id: &str,
    ) -> DbResult<Vec<StockPosition>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT product_id, SUM(quantity), SUM(total_cost_cents)
            FROM inventory_lots
            WHERE warehouse_id = ?1
            GROUP BY product_id
            ORDER BY product_id
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, quantity, cost)| {
                StockPosition::from_totals(warehouse_id, product_id, quantity, Money::from_cents(cost))
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
