//! # Stock Movement Repository
//!
//! Read paths over the append-only stock movement ledger.
//!
//! Writes are not exposed here: entries are inserted by the inventory
//! ledger (and the opening-stock path of product creation) inside the same
//! transaction as the stock change they record. Rows are never updated or
//! deleted; history is reconstructed by reading, not by in-memory counters.

use sqlx::SqlitePool;

use crate::error::DbResult;
use shopkeep_core::StockMovement;

pub(crate) const MOVEMENT_COLUMNS: &str =
    "id, product_id, kind, quantity, previous_stock, new_stock, reason, performed_by, \
     sale_id, created_at";

/// Repository for stock movement reads.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists movements for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let query = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&query)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Lists movements stamped with a sale reference, oldest first.
    ///
    /// For a completed sale this is its deductions; after a refund the
    /// compensating returns appear alongside them.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<StockMovement>> {
        let query = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE sale_id = ?1 ORDER BY created_at, id"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&query)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Lists the most recent movements across all products.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<StockMovement>> {
        let query = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Counts all ledger entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
