//! # Stock Observer
//!
//! Hook called after every committed mutating operation, once per touched
//! (warehouse, product) pair. The product module uses it to keep its
//! cached running total in line with the live lots.

use std::fmt::Debug;
use tracing::info;

use kardex_core::StockChange;

/// Receives stock changes after commit.
///
/// Called on the task that ran the operation; implementations should
/// return quickly and must not panic.
pub trait StockObserver: Send + Sync + Debug {
    fn stock_changed(&self, change: &StockChange);
}

/// Default observer: logs every change through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StockObserver for LoggingObserver {
    fn stock_changed(&self, change: &StockChange) {
        info!(
            warehouse_id = %change.warehouse_id,
            product_id = %change.product_id,
            on_hand = change.on_hand,
            product_on_hand = change.product_on_hand,
            "Stock changed"
        );
    }
}
