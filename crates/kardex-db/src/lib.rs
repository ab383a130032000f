//! # kardex-db: Storage Layer and Entry Operations
//!
//! SQLite storage for the inventory ledger and the four entry operations
//! that mutate it: purchase intake, sale depletion, warehouse transfer and
//! manual adjustment.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kardex Data Flow                                 │
//! │                                                                         │
//! │  Caller (purchase intake, sale, transfer request, adjustment)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kardex-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │InventoryLedger│    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ one tx per op │───►│ LotStore      │    │ 001_...sql   │  │   │
//! │  │   │ guard first   │    │ KardexLedger  │    │              │  │   │
//! │  │   │ notify after  │    │ StockGuard    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          │                                                      │   │
//! │  │          ▼  plans and costs                                     │   │
//! │  │     kardex-core (FIFO, CostCalculator, validation)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - File and environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Connection-scoped stores (lots, kardex, guards, catalog)
//! - [`ledger`] - The entry operations and stock queries
//! - [`observer`] - Stock change notifications
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kardex_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./kardex.db")).await?;
//! let ledger = db.ledger();
//!
//! let records = ledger.deplete_for_sale("W1", "P1", 12).await?;
//! let on_hand = ledger.current_stock("W1", "P1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod observer;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use ledger::InventoryLedger;
pub use observer::{LoggingObserver, StockObserver};
pub use pool::{Database, DbConfig};

pub use repository::catalog::CatalogStore;
pub use repository::guard::StockGuard;
pub use repository::kardex::KardexLedger;
pub use repository::lot::LotStore;
