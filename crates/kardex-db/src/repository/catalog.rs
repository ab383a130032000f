//! # Catalog Store
//!
//! The minimum of warehouse and product master data the ledger needs:
//! existence checks before a mutation, and inserts for setup and tests.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Warehouse and product lookups.
#[derive(Debug, Clone, Copy)]
pub struct CatalogStore;

impl CatalogStore {
    /// True when the warehouse exists.
    pub async fn warehouse_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM warehouses WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(found.is_some())
    }

    /// True when the product exists.
    pub async fn product_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(found.is_some())
    }

    /// Fails with `NotFound` unless the warehouse exists.
    pub async fn require_warehouse(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        if Self::warehouse_exists(conn, id).await? {
            Ok(())
        } else {
            Err(DbError::not_found("Warehouse", id))
        }
    }

    /// Fails with `NotFound` unless the product exists.
    pub async fn require_product(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        if Self::product_exists(conn, id).await? {
            Ok(())
        } else {
            Err(DbError::not_found("Product", id))
        }
    }

    /// Inserts a warehouse.
    pub async fn insert_warehouse(conn: &mut SqliteConnection, id: &str, name: &str) -> DbResult<()> {
        debug!(id = %id, name = %name, "Inserting warehouse");

        sqlx::query("INSERT INTO warehouses (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Inserts a product.
    pub async fn insert_product(conn: &mut SqliteConnection, id: &str, name: &str) -> DbResult<()> {
        debug!(id = %id, name = %name, "Inserting product");

        sqlx::query("INSERT INTO products (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Number of registered products.
    pub async fn count_products(conn: &mut SqliteConnection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }
}
