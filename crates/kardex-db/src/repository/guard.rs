//! # Stock Guards
//!
//! Serializes mutating transactions per (warehouse, product).
//!
//! ## Locking Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two sales of the last 10 units, running at the same time               │
//! │                                                                         │
//! │  tx A: BEGIN                         tx B: BEGIN                        │
//! │  tx A: bump guard (W,P)  ── lock ──► tx B: bump guard (W,P) … waits     │
//! │  tx A: read lots = 10                                                   │
//! │  tx A: take 8, COMMIT   ── release ─► tx B: acquires, reads lots = 2    │
//! │                                      tx B: InsufficientStock, ROLLBACK  │
//! │                                                                         │
//! │  The guard bump is the FIRST statement of the transaction, so nothing  │
//! │  is read before the lock is held and no stale quantity can be acted   │
//! │  on. Multi-key operations lock in sorted StockKey order.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In SQLite the first write takes the database write lock, waiting up to
//! the connection's busy timeout. On a server database the same upsert is
//! a row lock on the guard row.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use kardex_core::StockKey;

use crate::error::DbResult;

/// Per-pair lock rows in `stock_guards`.
#[derive(Debug, Clone, Copy)]
pub struct StockGuard;

impl StockGuard {
    /// Locks one pair for the rest of the transaction.
    ///
    /// Returns the guard version after the bump.
    pub async fn lock(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<i64> {
        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stock_guards (warehouse_id, product_id, version, locked_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET version = version + 1, locked_at = excluded.locked_at
            RETURNING version
            "#,
        )
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        debug!(key = %key, version, "Stock guard acquired");
        Ok(version)
    }

    /// Locks several pairs in sorted order, each once.
    pub async fn lock_all(conn: &mut SqliteConnection, keys: &[StockKey]) -> DbResult<()> {
        let mut ordered = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        for key in &ordered {
            Self::lock(conn, key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_version_increments_per_lock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = StockKey::new("W1", "P1");

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(StockGuard::lock(&mut tx, &key).await.unwrap(), 1);
        assert_eq!(StockGuard::lock(&mut tx, &key).await.unwrap(), 2);
        tx.commit().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(StockGuard::lock(&mut tx, &key).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lock_all_dedups() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = StockKey::new("W1", "P1");
        let b = StockKey::new("W2", "P1");

        let mut tx = db.pool().begin().await.unwrap();
        StockGuard::lock_all(&mut tx, &[b.clone(), a.clone(), b.clone()])
            .await
            .unwrap();
        assert_eq!(StockGuard::lock(&mut tx, &a).await.unwrap(), 2);
        assert_eq!(StockGuard::lock(&mut tx, &b).await.unwrap(), 2);
    }
}
