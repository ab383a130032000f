//! # Validation Module
//!
//! Input checks run by every entry operation before a transaction opens.
//!
//! ## Usage
//! ```rust
//! use kardex_core::validation::{validate_quantity, validate_distinct_warehouses};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_distinct_warehouses("W1", "W1").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, UnitCost};
use crate::types::{InventoryLot, PurchaseLine, TransferLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// An identifier must be present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Quantities moved by any operation must be positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Unit costs may be zero (free stock) but never negative.
pub fn validate_unit_cost(cost: &UnitCost) -> ValidationResult<()> {
    if cost.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_cost".to_string(),
        });
    }
    Ok(())
}

/// `unit_cost × quantity` in cents, rejected when it does not fit a [`Money`].
pub fn extended_cost(unit_cost: &UnitCost, quantity: i64) -> ValidationResult<Money> {
    unit_cost
        .extend(quantity)
        .ok_or_else(|| ValidationError::out_of_range("total_cost"))
}

/// A transfer needs two different warehouses.
pub fn validate_distinct_warehouses(origin: &str, destination: &str) -> ValidationResult<()> {
    validate_id("origin_warehouse_id", origin)?;
    validate_id("destination_warehouse_id", destination)?;
    if origin == destination {
        return Err(ValidationError::SameWarehouse {
            warehouse_id: origin.to_string(),
        });
    }
    Ok(())
}

/// Checks a purchase line before intake.
pub fn validate_purchase_line(line: &PurchaseLine) -> ValidationResult<()> {
    validate_id("warehouse_id", &line.warehouse_id)?;
    validate_id("product_id", &line.product_id)?;
    validate_id("supplier_id", &line.supplier_id)?;
    validate_id("invoice_id", &line.invoice_id)?;
    validate_quantity(line.quantity)?;
    validate_unit_cost(&line.unit_cost_after_tax)?;
    extended_cost(&line.unit_cost_after_tax, line.quantity).map(|_| ())
}

/// Checks the shape of a transfer request, without looking at lots.
pub fn validate_transfer_request(
    origin: &str,
    destination: &str,
    lines: &[TransferLine],
) -> ValidationResult<()> {
    validate_distinct_warehouses(origin, destination)?;
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }
    for line in lines {
        validate_id("lot_id", &line.lot_id)?;
        validate_id("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }
    Ok(())
}

/// Checks that the lot a transfer line names is the batch the caller meant.
///
/// The lot must sit in `origin`, hold the line's product, and, when the
/// line names an invoice, come from that invoice.
pub fn validate_line_against_lot(
    origin: &str,
    line: &TransferLine,
    lot: &InventoryLot,
) -> ValidationResult<()> {
    if lot.warehouse_id != origin {
        return Err(ValidationError::LotNotInWarehouse {
            lot_id: lot.id.clone(),
            expected_warehouse_id: origin.to_string(),
            actual_warehouse_id: lot.warehouse_id.clone(),
        });
    }
    if lot.product_id != line.product_id {
        return Err(ValidationError::ProductMismatch {
            lot_id: lot.id.clone(),
            expected_product_id: line.product_id.clone(),
            actual_product_id: lot.product_id.clone(),
        });
    }
    if let Some(invoice_id) = &line.invoice_id {
        if lot.source_invoice_id.as_deref() != Some(invoice_id.as_str()) {
            return Err(ValidationError::InvoiceMismatch {
                lot_id: lot.id.clone(),
                invoice_id: invoice_id.clone(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
