//! # Sale Repository
//!
//! Database reads and raw inserts for sales and sale items.
//!
//! ## Division of Labour
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  SaleRepository (this file)        SalesEngine (sales.rs)        │
//! │  ──────────────────────────        ─────────────────────────     │
//! │  get_by_id / get_items             create_sale (atomic with      │
//! │  get_by_number                       stock deductions)           │
//! │  list_recent                       update_status (atomic with    │
//! │  insert / add_item                   compensating restocks)      │
//! │  (plain row writes)                                              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//! Status changes never happen here: they are transactional with ledger
//! movements and belong to the engine.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopkeep_core::{Sale, SaleItem};

pub(crate) const SALE_COLUMNS: &str =
    "id, sale_number, status, subtotal_cents, tax_cents, discount_cents, total_cents, \
     payment_method, staff_id, customer_id, notes, created_at, updated_at, completed_at";

pub(crate) const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, product_id, sku_snapshot, name_snapshot, unit_price_cents, quantity, \
     line_total_cents, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its human-facing sale number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE sale_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let query = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        );
        let items = sqlx::query_as::<_, SaleItem>(&query)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists the most recent sales.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let query =
            format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1");
        let sales = sqlx::query_as::<_, Sale>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Inserts a sale row as-is.
    ///
    /// Used by imports and tests. The checkout path goes through
    /// `SalesEngine::create_sale`, which also performs stock deductions.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                payment_method, staff_id, customer_id, notes,
                created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(sale.status)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.staff_id)
        .bind(&sale.customer_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a line item for an existing sale.
    ///
    /// ## Snapshot Pattern
    /// Product sku, name and unit price are copied onto the item so sale
    /// history survives later catalog changes.
    pub async fn add_item(&self, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id,
                sku_snapshot, name_snapshot, unit_price_cents,
                quantity, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts all sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
