//! # Error Types
//!
//! Domain-specific error types for kardex-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kardex-core errors (this file)                                        │
//! │  ├── CoreError        - Stock and cost rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kardex-db errors (separate crate)                                     │
//! │  └── DbError          - NotFound, storage failures, wraps CoreError    │
//! │                                                                         │
//! │  Every error maps onto one ErrorKind, so callers branch on a tag       │
//! │  instead of on message text.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Closed set of failure categories an entry operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid input.
    Validation,
    /// Warehouse, product or lot absent.
    NotFound,
    /// Requested quantity exceeds what is available.
    InsufficientStock,
    /// Cost computed over a zero quantity.
    DivisionUndefined,
    /// Storage-layer failure (connection, query, transaction).
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Stock and cost rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested quantity exceeds available stock.
    ///
    /// ## When This Occurs
    /// - A sale asks for more than the live lots of the pair hold
    /// - A transfer line asks for more than its source lot holds
    /// - An exit adjustment exceeds the adjustment-available figure
    ///
    /// No state is mutated when this is returned.
    #[error(
        "Insufficient stock of {product_id} in {warehouse_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        warehouse_id: String,
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Unit cost requested for a zero-quantity lot.
    ///
    /// Unreachable while lots are deleted on reaching zero.
    #[error("Unit cost undefined for lot {lot_id}: quantity is zero")]
    DivisionUndefined { lot_id: String },
}

impl CoreError {
    /// Builds an InsufficientStock error for a (warehouse, product) pair.
    pub fn insufficient(
        warehouse_id: impl Into<String>,
        product_id: impl Into<String>,
        available: i64,
        requested: i64,
    ) -> Self {
        CoreError::InsufficientStock {
            warehouse_id: warehouse_id.into(),
            product_id: product_id.into(),
            available,
            requested,
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::DivisionUndefined { .. } => ErrorKind::DivisionUndefined,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any query is built or any lock is taken.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Transfer origin and destination are the same warehouse.
    #[error("Origin and destination warehouse are both {warehouse_id}")]
    SameWarehouse { warehouse_id: String },

    /// A transfer line names a lot held by another warehouse.
    #[error("Lot {lot_id} belongs to {actual_warehouse_id}, not {expected_warehouse_id}")]
    LotNotInWarehouse {
        lot_id: String,
        expected_warehouse_id: String,
        actual_warehouse_id: String,
    },

    /// A transfer line names a product the lot does not hold.
    #[error("Lot {lot_id} holds {actual_product_id}, not {expected_product_id}")]
    ProductMismatch {
        lot_id: String,
        expected_product_id: String,
        actual_product_id: String,
    },

    /// A transfer line names an invoice the lot did not come from.
    #[error("Lot {lot_id} does not originate from invoice {invoice_id}")]
    InvoiceMismatch { lot_id: String, invoice_id: String },

    /// A transfer request without lines.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// A quantity or cost that does not fit the stored integer range.
    #[error("{field} exceeds the storable range")]
    OutOfRange { field: String },

    /// A warehouse the operation names is not in the catalog.
    #[error("Warehouse {warehouse_id} does not exist")]
    UnknownWarehouse { warehouse_id: String },
}

impl ValidationError {
    /// Builds an OutOfRange error for `field`.
    pub fn out_of_range(field: &str) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
