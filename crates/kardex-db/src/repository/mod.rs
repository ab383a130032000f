//! # Repository Module
//!
//! Connection-scoped stores over the ledger tables.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stores Take the Caller's Transaction                 │
//! │                                                                         │
//! │  let mut tx = pool.begin().await?;                                     │
//! │       │                                                                 │
//! │       │  StockGuard::lock(&mut tx, &key)      ← always first            │
//! │       │  LotStore::list_ordered_by_age(&mut tx, &key)                  │
//! │       │  LotStore::reduce(&mut tx, lot_id, qty, cost)                  │
//! │       │  KardexLedger::append(&mut tx, &movement)                      │
//! │       ▼                                                                 │
//! │  tx.commit().await?     (dropping tx instead rolls everything back)    │
//! │                                                                         │
//! │  No store owns a pool. Every function runs on the connection it is     │
//! │  handed, so all writes of one entry operation share one transaction.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Stores
//!
//! - [`LotStore`] - Live lots: FIFO listing, changesets, merge lookup
//! - [`KardexLedger`] - Append-only movement rows
//! - [`StockGuard`] - Per-(warehouse, product) write serialization
//! - [`CatalogStore`] - Warehouse/product existence for foreign keys
//!
//! [`LotStore`]: lot::LotStore
//! [`KardexLedger`]: kardex::KardexLedger
//! [`StockGuard`]: guard::StockGuard
//! [`CatalogStore`]: catalog::CatalogStore

pub mod catalog;
pub mod guard;
pub mod kardex;
pub mod lot;
