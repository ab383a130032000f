//! # kardex-core: Pure Logic for the Inventory Ledger
//!
//! This crate holds the arithmetic and decision-making of the lot-tracked
//! inventory ledger as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kardex Architecture                              │
//! │                                                                         │
//! │  Purchase intake   Sales   Transfer requests   Manual adjustments      │
//! │        │             │             │                   │                │
//! │  ┌─────▼─────────────▼─────────────▼───────────────────▼───────────┐   │
//! │  │             kardex-db :: InventoryLedger (entry operations)      │   │
//! │  │      one transaction per call, guards, LotStore, KardexLedger    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ plans, costs, validation               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kardex-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   fifo    │  │   cost    │  │   │
//! │  │   │  Lot      │  │  Money    │  │  plan     │  │  unit     │  │   │
//! │  │   │  Movement │  │  UnitCost │  │  draws    │  │  average  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Lots, kardex movements, changesets, transfer lines
//! - [`money`] - `Money` (integer cents) and `UnitCost` (decimal cents per unit)
//! - [`cost`] - Unit cost of a lot and weighted-average cost of a stock pair
//! - [`fifo`] - Oldest-first depletion planning
//! - [`report`] - Kardex running balances and stock positions
//! - [`validation`] - Input validation for the entry operations
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kardex_core::money::{Money, UnitCost};
//!
//! // 3 units that cost $10.00 in total
//! let unit = UnitCost::of(Money::from_cents(1000), 3).unwrap();
//!
//! // Taking 2 of them removes $6.67 (bankers rounding on 666.67 cents)
//! assert_eq!(unit.extend(2).map(|m| m.cents()), Some(667));
//! ```

pub mod cost;
pub mod error;
pub mod fifo;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, UnitCost};
pub use types::*;
