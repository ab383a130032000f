//! # Domain Types
//!
//! Core domain types of the inventory ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │  InventoryLot    │   │ KardexMovement   │   │  LotChangeset    │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  id              │   │  movement_kind   │   │  Withdraw/Deposit│    │
//! │  │  warehouse_id    │   │  flow_direction  │   │  quantity        │    │
//! │  │  product_id      │   │  quantity        │   │  cost            │    │
//! │  │  entry_timestamp │   │  unit_cost       │   └──────────────────┘    │
//! │  │  quantity        │   │  total_cost      │                            │
//! │  │  total_cost      │   │  (immutable)     │                            │
//! │  └──────────────────┘   └──────────────────┘                            │
//! │                                                                         │
//! │  Live lots hold physical stock. Movements are the audit trail and are  │
//! │  never updated or deleted.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::{Money, UnitCost};

// =============================================================================
// Stock Key
// =============================================================================

/// A (warehouse, product) pair: the unit of stock accounting and locking.
///
/// Ordered by warehouse then product, which is the order locks are taken in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: String,
    pub product_id: String,
}

impl StockKey {
    pub fn new(warehouse_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        StockKey {
            warehouse_id: warehouse_id.into(),
            product_id: product_id.into(),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.warehouse_id, self.product_id)
    }
}

// =============================================================================
// Inventory Lot
// =============================================================================

/// One physical batch of a product in one warehouse.
///
/// ## Invariants
/// - `quantity > 0` while the lot exists; at zero it is deleted
/// - `warehouse_id`, `product_id` and `entry_timestamp` never change
/// - `total_cost / quantity` is the current unit cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLot {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub warehouse_id: String,
    pub product_id: String,

    /// Supplier the batch was bought from; `None` for manual entries.
    pub supplier_id: Option<String>,

    /// Invoice the batch arrived on; `None` for manual entries.
    pub source_invoice_id: Option<String>,

    /// Defines FIFO order (ties broken by `id`).
    pub entry_timestamp: DateTime<Utc>,

    /// Units currently held.
    pub quantity: i64,

    /// Total cost of the units currently held, in cents.
    pub total_cost_cents: i64,

    /// When the lot row was last changed.
    pub updated_at: DateTime<Utc>,
}

impl InventoryLot {
    /// Returns the total cost as Money.
    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.total_cost_cents)
    }

    /// Returns the (warehouse, product) pair this lot belongs to.
    pub fn key(&self) -> StockKey {
        StockKey::new(&self.warehouse_id, &self.product_id)
    }
}

/// Fields for a lot about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub warehouse_id: String,
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub source_invoice_id: Option<String>,
    pub quantity: i64,
    pub total_cost: Money,
    pub entry_timestamp: DateTime<Utc>,
}

impl NewLot {
    /// Checks the lot would satisfy the lot invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::validation::validate_id("warehouse_id", &self.warehouse_id)?;
        crate::validation::validate_id("product_id", &self.product_id)?;
        crate::validation::validate_quantity(self.quantity)?;
        if self.total_cost.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "total_cost".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Lot Changeset
// =============================================================================

/// Whether a changeset removes from or adds to a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Withdraw,
    Deposit,
}

/// A validated change to one lot's quantity and cost.
///
/// Stores magnitudes; the direction decides the sign. The storage layer
/// only builds its UPDATE from a changeset that passed [`validate`].
///
/// [`validate`]: LotChangeset::validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotChangeset {
    pub direction: ChangeDirection,
    pub quantity: i64,
    pub cost: Money,
}

impl LotChangeset {
    /// Removes `quantity` units carrying `cost` from a lot.
    pub fn withdraw(quantity: i64, cost: Money) -> Self {
        LotChangeset {
            direction: ChangeDirection::Withdraw,
            quantity,
            cost,
        }
    }

    /// Adds `quantity` units carrying `cost` to a lot (transfer merge).
    pub fn deposit(quantity: i64, cost: Money) -> Self {
        LotChangeset {
            direction: ChangeDirection::Deposit,
            quantity,
            cost,
        }
    }

    /// Quantity must be positive, cost must not be negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::validation::validate_quantity(self.quantity)?;
        if self.cost.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "cost".to_string(),
            });
        }
        Ok(())
    }

    /// Signed quantity delta to add to the lot.
    pub fn quantity_delta(&self) -> i64 {
        match self.direction {
            ChangeDirection::Withdraw => -self.quantity,
            ChangeDirection::Deposit => self.quantity,
        }
    }

    /// Signed cost delta to add to the lot.
    pub fn cost_delta(&self) -> Money {
        match self.direction {
            ChangeDirection::Withdraw => -self.cost,
            ChangeDirection::Deposit => self.cost,
        }
    }
}

// =============================================================================
// Movement Kind / Flow Direction
// =============================================================================

/// Direction of stock flow for a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    In,
    Out,
}

/// What caused a kardex movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received on a purchase invoice.
    PurchaseEntry,
    /// Stock leaving a warehouse towards another.
    TransferOut,
    /// Stock arriving from another warehouse.
    TransferIn,
    /// Stock consumed by a sale (FIFO).
    SaleExit,
    /// Manual correction adding stock.
    AdjustmentEntry,
    /// Manual correction removing stock, costed at the weighted average.
    AdjustmentExit,
}

impl MovementKind {
    /// Flow direction implied by the kind.
    pub fn flow_direction(&self) -> FlowDirection {
        match self {
            MovementKind::PurchaseEntry
            | MovementKind::TransferIn
            | MovementKind::AdjustmentEntry => FlowDirection::In,
            MovementKind::TransferOut | MovementKind::SaleExit | MovementKind::AdjustmentExit => {
                FlowDirection::Out
            }
        }
    }

    /// The stored text form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::PurchaseEntry => "purchase_entry",
            MovementKind::TransferOut => "transfer_out",
            MovementKind::TransferIn => "transfer_in",
            MovementKind::SaleExit => "sale_exit",
            MovementKind::AdjustmentEntry => "adjustment_entry",
            MovementKind::AdjustmentExit => "adjustment_exit",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Kardex Movement
// =============================================================================

/// One immutable audit record of a quantity/cost change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KardexMovement {
    /// Opaque unique identifier (UUID v4).
    pub id: String,

    pub warehouse_id: String,
    pub product_id: String,

    /// Lot touched by the movement. `None` for exit adjustments, which
    /// touch no lot.
    pub lot_id: Option<String>,

    pub movement_kind: MovementKind,

    /// Always `movement_kind.flow_direction()`.
    pub flow_direction: FlowDirection,

    pub quantity: i64,
    pub unit_cost: UnitCost,

    /// `unit_cost × quantity`, rounded half to even.
    pub total_cost: Money,

    /// Invoice id for purchases, transfer id for transfers.
    pub reference: Option<String>,

    /// Movement time.
    pub timestamp: DateTime<Utc>,
}

impl KardexMovement {
    /// Builds a movement.
    ///
    /// `total_cost` is the exact figure moved: the extended unit cost, or a
    /// lot's whole remaining total when a draw empties it.
    pub fn new(
        kind: MovementKind,
        key: &StockKey,
        quantity: i64,
        unit_cost: UnitCost,
        total_cost: Money,
        timestamp: DateTime<Utc>,
    ) -> Self {
        KardexMovement {
            id: Uuid::new_v4().to_string(),
            warehouse_id: key.warehouse_id.clone(),
            product_id: key.product_id.clone(),
            lot_id: None,
            movement_kind: kind,
            flow_direction: kind.flow_direction(),
            quantity,
            unit_cost,
            total_cost,
            reference: None,
            timestamp,
        }
    }

    /// Sets the lot this movement touched.
    pub fn with_lot(mut self, lot_id: impl Into<String>) -> Self {
        self.lot_id = Some(lot_id.into());
        self
    }

    /// Sets the document reference.
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Quantity with sign: positive for In, negative for Out.
    pub fn signed_quantity(&self) -> i64 {
        match self.flow_direction {
            FlowDirection::In => self.quantity,
            FlowDirection::Out => -self.quantity,
        }
    }

    /// Total cost with sign: positive for In, negative for Out.
    pub fn signed_total(&self) -> Money {
        match self.flow_direction {
            FlowDirection::In => self.total_cost,
            FlowDirection::Out => -self.total_cost,
        }
    }
}

// =============================================================================
// Operation Inputs / Results
// =============================================================================

/// One received invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub warehouse_id: String,
    pub product_id: String,
    pub supplier_id: String,
    pub invoice_id: String,
    pub quantity: i64,
    /// Unit cost after tax, as supplied by the invoice module.
    pub unit_cost_after_tax: UnitCost,
    /// Intake time; becomes the lot's entry timestamp.
    pub received_at: DateTime<Utc>,
}

/// What one FIFO draw took from one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub lot_id: String,
    pub quantity_taken: i64,
    /// Unit cost of the lot before the draw.
    pub unit_cost: UnitCost,
    /// Cost removed from the lot (and recorded on the ledger).
    pub total_cost: Money,
    /// Whether the draw emptied (and deleted) the lot.
    pub lot_exhausted: bool,
}

/// One line of a transfer request: a specific lot moving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub lot_id: String,
    pub product_id: String,
    /// Invoice of the moving lot, if the caller knows it. Checked against the lot.
    pub invoice_id: Option<String>,
    pub quantity: i64,
}

/// The outcome of one transfer line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredLine {
    pub source_lot_id: String,
    pub destination_lot_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: UnitCost,
    pub total_cost: Money,
    /// True when the quantity merged into an existing destination lot.
    pub merged: bool,
}

/// The outcome of a whole transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Shared by every movement this transfer wrote.
    pub transfer_id: String,
    pub origin_warehouse_id: String,
    pub destination_warehouse_id: String,
    pub lines: Vec<TransferredLine>,
    pub movements: Vec<KardexMovement>,
}

/// Stock notification sent after a committed mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub warehouse_id: String,
    pub product_id: String,
    /// Live lot quantity of this pair.
    pub on_hand: i64,
    /// Live lot quantity of the product across all warehouses.
    pub product_on_hand: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_direction_follows_kind() {
        assert_eq!(MovementKind::PurchaseEntry.flow_direction(), FlowDirection::In);
        assert_eq!(MovementKind::TransferIn.flow_direction(), FlowDirection::In);
        assert_eq!(MovementKind::AdjustmentEntry.flow_direction(), FlowDirection::In);
        assert_eq!(MovementKind::TransferOut.flow_direction(), FlowDirection::Out);
        assert_eq!(MovementKind::SaleExit.flow_direction(), FlowDirection::Out);
        assert_eq!(MovementKind::AdjustmentExit.flow_direction(), FlowDirection::Out);
    }

    #[test]
    fn test_kind_serializes_as_stored_text() {
        let json = serde_json::to_string(&MovementKind::AdjustmentExit).unwrap();
        assert_eq!(json, "\"adjustment_exit\"");
        assert_eq!(MovementKind::SaleExit.to_string(), "sale_exit");
    }

    #[test]
    fn test_movement_signs_follow_flow() {
        let key = StockKey::new("W", "P");
        let movement = KardexMovement::new(
            MovementKind::SaleExit,
            &key,
            2,
            UnitCost::from_cents(1200),
            Money::from_cents(2400),
            Utc::now(),
        );
        assert_eq!(movement.total_cost.cents(), 2400);
        assert_eq!(movement.flow_direction, FlowDirection::Out);
        assert_eq!(movement.signed_quantity(), -2);
        assert_eq!(movement.signed_total().cents(), -2400);
    }

    #[test]
    fn test_changeset_signs_and_validation() {
        let out = LotChangeset::withdraw(2, Money::from_cents(2400));
        assert_eq!(out.quantity_delta(), -2);
        assert_eq!(out.cost_delta().cents(), -2400);
        assert!(out.validate().is_ok());

        let merge = LotChangeset::deposit(5, Money::from_cents(5000));
        assert_eq!(merge.quantity_delta(), 5);
        assert_eq!(merge.cost_delta().cents(), 5000);

        assert!(LotChangeset::withdraw(0, Money::zero()).validate().is_err());
        assert!(LotChangeset::deposit(1, Money::from_cents(-1)).validate().is_err());
    }

    #[test]
    fn test_stock_keys_sort_by_warehouse_then_product() {
        let mut keys = vec![
            StockKey::new("W2", "A"),
            StockKey::new("W1", "B"),
            StockKey::new("W1", "A"),
        ];
        keys.sort();
        assert_eq!(keys[0], StockKey::new("W1", "A"));
        assert_eq!(keys[1], StockKey::new("W1", "B"));
        assert_eq!(keys[2], StockKey::new("W2", "A"));
    }
}
