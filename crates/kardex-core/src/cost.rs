//! # Cost Calculator
//!
//! Per-lot unit cost and weighted-average unit cost of a stock pair.
//!
//! FIFO draws always use [`unit_cost`] of the lot being drawn. Only exit
//! adjustments use [`weighted_average_unit_cost`].

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, UnitCost};
use crate::types::InventoryLot;

/// `lot.total_cost / lot.quantity`.
///
/// Fails with `DivisionUndefined` for a zero-quantity lot.
pub fn unit_cost(lot: &InventoryLot) -> CoreResult<UnitCost> {
    UnitCost::of(lot.total_cost(), lot.quantity).ok_or_else(|| CoreError::DivisionUndefined {
        lot_id: lot.id.clone(),
    })
}

/// `Σ total_cost / Σ quantity` over the given lots; zero when there are none.
///
/// Sums are taken in decimal, so totals past the `Money` range still average.
pub fn weighted_average_unit_cost(lots: &[InventoryLot]) -> CoreResult<UnitCost> {
    let mut quantity = Decimal::ZERO;
    let mut cost = Decimal::ZERO;
    for lot in lots {
        quantity = quantity
            .checked_add(Decimal::from(lot.quantity))
            .ok_or_else(|| ValidationError::out_of_range("quantity"))?;
        cost = cost
            .checked_add(lot.total_cost().as_decimal())
            .ok_or_else(|| ValidationError::out_of_range("total_cost"))?;
    }

    if quantity.is_zero() {
        return Ok(UnitCost::zero());
    }
    cost.checked_div(quantity)
        .map(UnitCost::from_decimal)
        .ok_or_else(|| ValidationError::out_of_range("unit_cost").into())
}

/// Weighted average from already-aggregated totals; zero when `quantity` is zero.
pub fn average_of_totals(total_cost: Money, quantity: i64) -> UnitCost {
    UnitCost::of(total_cost, quantity).unwrap_or_else(UnitCost::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn lot(id: &str, quantity: i64, total_cents: i64) -> InventoryLot {
        InventoryLot {
            id: id.to_string(),
            warehouse_id: "W".to_string(),
            product_id: "P".to_string(),
            supplier_id: None,
            source_invoice_id: None,
            entry_timestamp: Utc::now(),
            quantity,
            total_cost_cents: total_cents,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_cost() {
        assert_eq!(
            unit_cost(&lot("A", 10, 10000)).unwrap(),
            UnitCost::from_cents(1000)
        );
        assert!(matches!(
            unit_cost(&lot("Z", 0, 100)),
            Err(CoreError::DivisionUndefined { lot_id }) if lot_id == "Z"
        ));
    }

    #[test]
    fn test_weighted_average() {
        // (10000 + 6000) / (10 + 5) = 1066.66... cents
        let avg = weighted_average_unit_cost(&[lot("A", 10, 10000), lot("B", 5, 6000)]).unwrap();
        assert_eq!(avg.extend(15).unwrap().cents(), 16000);
        assert_eq!(avg.extend(3).unwrap().cents(), 3200);
    }

    #[test]
    fn test_weighted_average_of_totals_past_money_range() {
        // Together the lots hold more than i64::MAX cents
        let half = i64::MAX / 2 + 1;
        let avg = weighted_average_unit_cost(&[lot("A", 1, half), lot("B", 1, half)]).unwrap();
        assert_eq!(avg, UnitCost::from_cents(half));
        assert_eq!(avg.extend(1).unwrap().cents(), half);
        assert!(avg.extend(2).is_none());
    }

    #[test]
    fn test_weighted_average_without_lots_is_zero() {
        assert_eq!(weighted_average_unit_cost(&[]).unwrap(), UnitCost::zero());
        assert_eq!(average_of_totals(Money::zero(), 0), UnitCost::zero());
    }
}
