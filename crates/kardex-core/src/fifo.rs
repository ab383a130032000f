//! # FIFO Depletion Planning
//!
//! Decides which lots a depletion draws from, how much, and at what cost,
//! without touching storage. The database layer applies the plan inside
//! its transaction.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deplete(W, P, 12)                                                      │
//! │                                                                         │
//! │  Lots oldest-first:  A (day 1) 10 @ 10.00   B (day 5) 5 @ 12.00         │
//! │                                                                         │
//! │  Σ quantity = 15 ≥ 12  ✓   (else InsufficientStock, nothing planned)    │
//! │                                                                         │
//! │  A: take min(10, 12) = 10  → exhausts A, cost = A.total_cost = 100.00   │
//! │  B: take min(5, 2)   = 2   → B keeps 3,   cost = 12.00 × 2   =  24.00   │
//! │                                                                         │
//! │  One draw per lot touched, each at that lot's own unit cost.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::cost;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, UnitCost};
use crate::types::{ConsumptionRecord, InventoryLot, StockKey};
use crate::validation::{extended_cost, validate_quantity};

/// One lot's share of a depletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDraw {
    pub lot_id: String,
    pub quantity_taken: i64,
    /// Unit cost of the lot before the draw.
    pub unit_cost: UnitCost,
    /// Cost to remove from the lot; exactly its total when the lot is exhausted.
    pub cost_taken: Money,
    pub exhausts_lot: bool,
}

/// The full set of draws that satisfies one depletion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepletionPlan {
    pub key: StockKey,
    pub requested: i64,
    pub draws: Vec<PlannedDraw>,
}

impl DepletionPlan {
    /// Units the plan removes; equals `requested`.
    pub fn total_quantity(&self) -> i64 {
        self.draws.iter().map(|d| d.quantity_taken).sum()
    }

    /// Cost the plan removes from lots, `None` if it overflows.
    pub fn total_cost(&self) -> Option<Money> {
        Money::checked_sum(self.draws.iter().map(|d| d.cost_taken))
    }

    /// Converts the draws into the records returned to callers.
    pub fn into_records(self) -> Vec<ConsumptionRecord> {
        self.draws
            .into_iter()
            .map(|d| ConsumptionRecord {
                lot_id: d.lot_id,
                quantity_taken: d.quantity_taken,
                unit_cost: d.unit_cost,
                total_cost: d.cost_taken,
                lot_exhausted: d.exhausts_lot,
            })
            .collect()
    }
}

/// Sorts lots ascending by entry timestamp, ties broken by lot id.
pub fn order_by_age(lots: &mut [InventoryLot]) {
    lots.sort_by(|a, b| {
        a.entry_timestamp
            .cmp(&b.entry_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Prices taking `quantity` units out of one specific lot.
///
/// A draw that empties the lot carries the lot's exact total, so no cents
/// are left behind; a partial draw carries `unit_cost × quantity`.
///
/// ## Errors
/// - `Validation` if `quantity` is not positive
/// - `InsufficientStock` if the lot holds fewer than `quantity` units
/// - `DivisionUndefined` for a zero-quantity lot
pub fn draw_from_lot(lot: &InventoryLot, quantity: i64) -> CoreResult<PlannedDraw> {
    validate_quantity(quantity)?;
    let unit_cost = cost::unit_cost(lot)?;

    if lot.quantity < quantity {
        return Err(CoreError::insufficient(
            &lot.warehouse_id,
            &lot.product_id,
            lot.quantity,
            quantity,
        ));
    }

    let exhausts_lot = quantity == lot.quantity;
    let cost_taken = if exhausts_lot {
        lot.total_cost()
    } else {
        extended_cost(&unit_cost, quantity)?.min(lot.total_cost())
    };

    Ok(PlannedDraw {
        lot_id: lot.id.clone(),
        quantity_taken: quantity,
        unit_cost,
        cost_taken,
        exhausts_lot,
    })
}

/// Plans an oldest-first depletion of `requested` units from `lots`.
///
/// ## Errors
/// - `Validation` if `requested` is not positive
/// - `InsufficientStock` if the lots hold fewer than `requested` units
/// - `DivisionUndefined` if a zero-quantity lot is encountered
pub fn plan_depletion(
    key: &StockKey,
    lots: &[InventoryLot],
    requested: i64,
) -> CoreResult<DepletionPlan> {
    validate_quantity(requested)?;

    let available = lots
        .iter()
        .try_fold(0i64, |acc, l| acc.checked_add(l.quantity))
        .ok_or_else(|| ValidationError::out_of_range("quantity"))?;
    if available < requested {
        return Err(CoreError::insufficient(
            &key.warehouse_id,
            &key.product_id,
            available,
            requested,
        ));
    }

    let mut ordered = lots.to_vec();
    order_by_age(&mut ordered);

    let mut remaining = requested;
    let mut draws = Vec::new();

    for lot in &ordered {
        if remaining == 0 {
            break;
        }

        let draw = draw_from_lot(lot, lot.quantity.min(remaining))?;
        remaining -= draw.quantity_taken;
        draws.push(draw);
    }

    Ok(DepletionPlan {
        key: key.clone(),
        requested,
        draws,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn lot(id: &str, entry: DateTime<Utc>, quantity: i64, total_cents: i64) -> InventoryLot {
        InventoryLot {
            id: id.to_string(),
            warehouse_id: "W".to_string(),
            product_id: "P".to_string(),
            supplier_id: None,
            source_invoice_id: None,
            entry_timestamp: entry,
            quantity,
            total_cost_cents: total_cents,
            updated_at: entry,
        }
    }

    fn key() -> StockKey {
        StockKey::new("W", "P")
    }

    #[test]
    fn test_spans_two_lots_at_their_own_costs() {
        let lots = vec![lot("A", day(1), 10, 10000), lot("B", day(5), 5, 6000)];

        let plan = plan_depletion(&key(), &lots, 12).unwrap();
        assert_eq!(plan.draws.len(), 2);

        let a = &plan.draws[0];
        assert_eq!(a.lot_id, "A");
        assert_eq!(a.quantity_taken, 10);
        assert_eq!(a.unit_cost, UnitCost::from_cents(1000));
        assert_eq!(a.cost_taken.cents(), 10000);
        assert!(a.exhausts_lot);

        let b = &plan.draws[1];
        assert_eq!(b.lot_id, "B");
        assert_eq!(b.quantity_taken, 2);
        assert_eq!(b.unit_cost, UnitCost::from_cents(1200));
        assert_eq!(b.cost_taken.cents(), 2400);
        assert!(!b.exhausts_lot);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let lots = vec![lot("B", day(5), 5, 6000), lot("A", day(1), 10, 10000)];
        let plan = plan_depletion(&key(), &lots, 3).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].lot_id, "A");
    }

    #[test]
    fn test_same_timestamp_breaks_ties_by_id() {
        let lots = vec![lot("L2", day(1), 5, 500), lot("L1", day(1), 5, 700)];
        let plan = plan_depletion(&key(), &lots, 5).unwrap();
        assert_eq!(plan.draws[0].lot_id, "L1");
    }

    #[test]
    fn test_insufficient_stock() {
        let lots = vec![lot("A", day(1), 10, 10000), lot("B", day(5), 5, 6000)];
        match plan_depletion(&key(), &lots, 100) {
            Err(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 15);
                assert_eq!(requested, 100);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_positive_request() {
        let lots = vec![lot("A", day(1), 10, 10000)];
        assert!(matches!(
            plan_depletion(&key(), &lots, 0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_into_records() {
        let lots = vec![lot("A", day(1), 3, 1000)];
        let records = plan_depletion(&key(), &lots, 2).unwrap().into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity_taken, 2);
        assert_eq!(records[0].total_cost.cents(), 667);
        assert!(!records[0].lot_exhausted);
    }

    #[test]
    fn test_draw_from_specific_lot() {
        let source = lot("A", day(1), 8, 8000);

        let draw = draw_from_lot(&source, 5).unwrap();
        assert_eq!(draw.cost_taken.cents(), 5000);
        assert!(!draw.exhausts_lot);

        let all = draw_from_lot(&source, 8).unwrap();
        assert_eq!(all.cost_taken.cents(), 8000);
        assert!(all.exhausts_lot);

        assert!(matches!(
            draw_from_lot(&source, 9),
            Err(CoreError::InsufficientStock { available: 8, requested: 9, .. })
        ));
    }

    #[test]
    fn test_whole_lot_draw_keeps_odd_cents() {
        // 3 units for 10.00: a unit is 3.333..., the whole lot still costs 10.00
        let source = lot("A", day(1), 3, 1000);
        let plan = plan_depletion(&key(), &[source], 3).unwrap();
        assert_eq!(plan.total_cost().unwrap().cents(), 1000);
    }

    fn arb_lots() -> impl Strategy<Value = Vec<InventoryLot>> {
        prop::collection::vec((1i64..50, 0i64..20_000, 0i64..30), 1..8).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (qty, cost, d))| lot(&format!("L{i:02}"), day(d), qty, cost))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_plan_takes_exactly_requested(lots in arb_lots(), pick in 0.0f64..1.0) {
            let available: i64 = lots.iter().map(|l| l.quantity).sum();
            let requested = 1 + ((available - 1) as f64 * pick) as i64;

            let plan = plan_depletion(&key(), &lots, requested).unwrap();
            prop_assert_eq!(plan.total_quantity(), requested);
        }

        #[test]
        fn prop_no_lot_goes_negative(lots in arb_lots(), pick in 0.0f64..1.0) {
            let available: i64 = lots.iter().map(|l| l.quantity).sum();
            let requested = 1 + ((available - 1) as f64 * pick) as i64;

            let plan = plan_depletion(&key(), &lots, requested).unwrap();
            for draw in &plan.draws {
                let source = lots.iter().find(|l| l.id == draw.lot_id).unwrap();
                prop_assert!(draw.quantity_taken <= source.quantity);
                prop_assert!(draw.cost_taken <= source.total_cost());
                prop_assert!(!draw.cost_taken.is_negative());
                prop_assert_eq!(draw.exhausts_lot, draw.quantity_taken == source.quantity);
                if draw.exhausts_lot {
                    prop_assert_eq!(draw.cost_taken, source.total_cost());
                }
            }
        }

        #[test]
        fn prop_older_lots_are_exhausted_first(lots in arb_lots(), pick in 0.0f64..1.0) {
            let available: i64 = lots.iter().map(|l| l.quantity).sum();
            let requested = 1 + ((available - 1) as f64 * pick) as i64;

            let plan = plan_depletion(&key(), &lots, requested).unwrap();
            let mut ordered = lots.clone();
            order_by_age(&mut ordered);

            // Draws are a prefix of the age order; all but the last empty their lot.
            for (i, draw) in plan.draws.iter().enumerate() {
                prop_assert_eq!(&draw.lot_id, &ordered[i].id);
                if i + 1 < plan.draws.len() {
                    prop_assert!(draw.exhausts_lot);
                }
            }
        }

        #[test]
        fn prop_over_request_is_rejected(lots in arb_lots(), extra in 1i64..100) {
            let available: i64 = lots.iter().map(|l| l.quantity).sum();
            let result = plan_depletion(&key(), &lots, available + extra);
            let rejected = matches!(result, Err(CoreError::InsufficientStock { .. }));
            prop_assert!(rejected);
        }
    }
}
