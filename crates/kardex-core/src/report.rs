//! # Kardex Reports
//!
//! Running balances over the movement history and stock positions over
//! live lots.
//!
//! The running balance is the ledger's own view of a pair. It counts exit
//! adjustments, which never touch lots, so it can differ from the live-lot
//! position of the same pair.

use serde::{Deserialize, Serialize};

use crate::cost;
use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, UnitCost};
use crate::types::KardexMovement;

/// One kardex row with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KardexLine {
    pub movement: KardexMovement,
    pub balance_quantity: i64,
    pub balance_value: Money,
}

/// Accumulates signed quantities and totals in the given order.
///
/// Fails with `OutOfRange` if a running figure leaves the `i64` range.
pub fn running_balance(movements: Vec<KardexMovement>) -> CoreResult<Vec<KardexLine>> {
    let mut quantity = 0i64;
    let mut value = Money::zero();

    movements
        .into_iter()
        .map(|movement| {
            quantity = quantity
                .checked_add(movement.signed_quantity())
                .ok_or_else(|| ValidationError::out_of_range("balance_quantity"))?;
            value = value
                .checked_add(movement.signed_total())
                .ok_or_else(|| ValidationError::out_of_range("balance_value"))?;
            Ok(KardexLine {
                movement,
                balance_quantity: quantity,
                balance_value: value,
            })
        })
        .collect()
}

/// Live-lot stock of one product in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub total_cost: Money,
    pub average_unit_cost: UnitCost,
}

impl StockPosition {
    /// Builds a position from aggregated lot totals.
    pub fn from_totals(
        warehouse_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
        total_cost: Money,
    ) -> Self {
        StockPosition {
            warehouse_id: warehouse_id.into(),
            product_id: product_id.into(),
            quantity,
            total_cost,
            average_unit_cost: cost::average_of_totals(total_cost, quantity),
        }
    }
}
