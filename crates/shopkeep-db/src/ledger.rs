//! # Inventory Ledger
//!
//! The sole authority for changing a product's stock quantity, and the
//! generator of its audit trail.
//!
//! ## Transaction Discipline
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              One atomic transaction per operation                │
//! │                                                                  │
//! │  BEGIN                                                           │
//! │    1. read product row          ← the only stock read trusted    │
//! │    2. check direction + stock     for the mutation decision      │
//! │    3. UPDATE products.current_stock                              │
//! │    4. INSERT stock_movements row  (previous/new snapshots)       │
//! │  COMMIT                                                          │
//! │                                                                  │
//! │  Any failure rolls back both writes. Two concurrent deductions  │
//! │  cannot both pass a stale sufficiency check: SQLite serializes  │
//! │  writers, and the CHECK (current_stock >= 0) constraint backs   │
//! │  the invariant at the storage layer.                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale engine folds its per-item deductions into its own transaction
//! through [`apply_movement`], so a sale and its stock effects commit or
//! roll back together.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::AuditTrail;
use crate::error::{ServiceError, ServiceResult};
use shopkeep_core::validation::{
    validate_price_cents, validate_quantity, validate_reason, validate_target_quantity,
};
use shopkeep_core::{
    CoreError, MovementKind, Principal, Product, SaleMovement, StockMovement, ValidationError,
};

// =============================================================================
// Result Types
// =============================================================================

/// The outcome of a single stock mutation: the updated product snapshot and
/// the ledger entry that records the change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMutation {
    pub product: Product,
    pub entry: StockMovement,
}

/// The outcome of an adjustment to an exact quantity.
///
/// `entry` and `kind` are `None` when the target equalled the current
/// stock: the ledger stores positive magnitudes only, so a zero-delta
/// adjustment is a successful no-op with no log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product: Product,
    pub entry: Option<StockMovement>,
    pub kind: Option<MovementKind>,
    /// Magnitude of the applied change (`|target - previous|`).
    pub quantity: i64,
}

// =============================================================================
// Transaction-Level Movement Application
// =============================================================================

/// A fully-specified movement to apply on an open connection.
pub(crate) struct MovementCommand<'a> {
    pub product_id: &'a str,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<&'a str>,
    pub performed_by: &'a str,
    pub sale_id: Option<&'a str>,
    pub cost_price_cents: Option<i64>,
}

/// Loads a product for mutation inside an open transaction.
///
/// Missing and deactivated products are both reported as not-found; a
/// deactivated product accepts no movements, returns included.
pub(crate) async fn load_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> ServiceResult<Product> {
    let query = format!(
        "SELECT {} FROM products WHERE id = ?1",
        crate::repository::product::PRODUCT_COLUMNS
    );
    let product = sqlx::query_as::<_, Product>(&query)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    if !product.is_active {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }

    Ok(product)
}

/// Applies one stock movement on an open connection: re-reads the product,
/// validates direction and sufficiency, writes the new stock level and
/// appends the ledger entry.
///
/// The caller owns the surrounding transaction. Every code path that
/// changes `products.current_stock` funnels through here.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    cmd: MovementCommand<'_>,
) -> ServiceResult<StockMutation> {
    if cmd.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let direction = cmd.kind.direction().ok_or_else(|| {
        ServiceError::from(ValidationError::NotAllowed {
            field: "kind".to_string(),
            allowed: vec![
                "stock_in".to_string(),
                "stock_out".to_string(),
                "sale".to_string(),
                "return".to_string(),
                "damage".to_string(),
            ],
        })
    })?;

    let mut product = load_product(conn, cmd.product_id).await?;

    let previous_stock = product.current_stock;
    let new_stock = previous_stock + direction.signed(cmd.quantity);

    if new_stock < 0 {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: previous_stock,
            requested: cmd.quantity,
        }
        .into());
    }

    let now = Utc::now();

    if let Some(cost) = cmd.cost_price_cents {
        sqlx::query(
            "UPDATE products SET current_stock = ?2, cost_cents = ?3, updated_at = ?4 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(new_stock)
        .bind(cost)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        product.cost_cents = Some(cost);
    } else {
        sqlx::query("UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&product.id)
            .bind(new_stock)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    product.current_stock = new_stock;
    product.updated_at = now;

    let entry = StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        kind: cmd.kind,
        quantity: cmd.quantity,
        previous_stock,
        new_stock,
        reason: cmd.reason.map(str::to_string),
        performed_by: cmd.performed_by.to_string(),
        sale_id: cmd.sale_id.map(str::to_string),
        created_at: now,
    };

    insert_movement_conn(conn, &entry).await?;

    debug!(
        product_id = %product.id,
        kind = ?cmd.kind,
        quantity = cmd.quantity,
        previous_stock,
        new_stock,
        "Applied stock movement"
    );

    Ok(StockMutation { product, entry })
}

/// Appends a ledger entry row.
async fn insert_movement_conn(
    conn: &mut SqliteConnection,
    entry: &StockMovement,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, kind, quantity,
            previous_stock, new_stock,
            reason, performed_by, sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.product_id)
    .bind(entry.kind)
    .bind(entry.quantity)
    .bind(entry.previous_stock)
    .bind(entry.new_stock)
    .bind(&entry.reason)
    .bind(&entry.performed_by)
    .bind(&entry.sale_id)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Appends a ledger entry inside a caller-owned transaction.
///
/// Used by product creation to seed opening stock.
pub(crate) async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    entry: &StockMovement,
) -> Result<(), sqlx::Error> {
    insert_movement_conn(&mut *tx, entry).await
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// The single choke point through which product stock is ever mutated.
///
/// Each operation validates its input, runs the read-write-append sequence
/// in one transaction, and emits a best-effort audit record after commit.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    fn audit(&self) -> AuditTrail {
        AuditTrail::new(self.pool.clone())
    }

    /// Receives goods: increases stock by `quantity` and optionally updates
    /// the unit cost.
    ///
    /// ## Errors
    /// * `NotFound` - product missing or inactive
    /// * `InvalidArgument` - quantity ≤ 0 or over the per-movement cap
    pub async fn stock_in(
        &self,
        product_id: &str,
        quantity: i64,
        reason: Option<&str>,
        cost_price_cents: Option<i64>,
        principal: &Principal,
    ) -> ServiceResult<StockMutation> {
        validate_quantity(quantity)?;
        if let Some(cost) = cost_price_cents {
            validate_price_cents(cost)?;
        }
        if let Some(reason) = reason {
            validate_reason(reason)?;
        }

        let mut tx = self.pool.begin().await?;
        let mutation = apply_movement(
            &mut tx,
            MovementCommand {
                product_id,
                kind: MovementKind::StockIn,
                quantity,
                reason,
                performed_by: &principal.id,
                sale_id: None,
                cost_price_cents,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            quantity,
            new_stock = mutation.product.current_stock,
            "Stock in"
        );

        self.audit()
            .record(
                "inventory.stock_in",
                "product",
                product_id,
                &principal.id,
                serde_json::json!({
                    "quantity": quantity,
                    "new_stock": mutation.product.current_stock,
                    "reason": reason,
                }),
            )
            .await;

        Ok(mutation)
    }

    /// Removes goods outside a sale: decreases stock by `quantity`.
    ///
    /// ## Errors
    /// * `NotFound` - product missing or inactive
    /// * `InvalidArgument` - quantity ≤ 0 or over the per-movement cap
    /// * `InsufficientStock` - quantity exceeds the current stock
    pub async fn stock_out(
        &self,
        product_id: &str,
        quantity: i64,
        reason: Option<&str>,
        principal: &Principal,
    ) -> ServiceResult<StockMutation> {
        self.remove_stock(product_id, MovementKind::StockOut, quantity, reason, principal)
            .await
    }

    /// Writes off damaged goods. Behaves like [`Self::stock_out`] but the
    /// ledger entry carries the `damage` kind, so write-offs stay
    /// distinguishable from ordinary removals.
    pub async fn record_damage(
        &self,
        product_id: &str,
        quantity: i64,
        reason: Option<&str>,
        principal: &Principal,
    ) -> ServiceResult<StockMutation> {
        self.remove_stock(product_id, MovementKind::Damage, quantity, reason, principal)
            .await
    }

    async fn remove_stock(
        &self,
        product_id: &str,
        kind: MovementKind,
        quantity: i64,
        reason: Option<&str>,
        principal: &Principal,
    ) -> ServiceResult<StockMutation> {
        validate_quantity(quantity)?;
        if let Some(reason) = reason {
            validate_reason(reason)?;
        }

        let mut tx = self.pool.begin().await?;
        let mutation = apply_movement(
            &mut tx,
            MovementCommand {
                product_id,
                kind,
                quantity,
                reason,
                performed_by: &principal.id,
                sale_id: None,
                cost_price_cents: None,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            kind = ?kind,
            quantity,
            new_stock = mutation.product.current_stock,
            "Stock out"
        );

        self.audit()
            .record(
                "inventory.stock_out",
                "product",
                product_id,
                &principal.id,
                serde_json::json!({
                    "kind": kind,
                    "quantity": quantity,
                    "new_stock": mutation.product.current_stock,
                    "reason": reason,
                }),
            )
            .await;

        Ok(mutation)
    }

    /// Sets stock to an exact quantity.
    ///
    /// The delta is logged as `stock_in` when the target is above the
    /// current level and `stock_out` when below. A target equal to the
    /// current level is a successful no-op that writes no entry.
    ///
    /// ## Errors
    /// * `NotFound` - product missing or inactive
    /// * `InvalidArgument` - target < 0
    pub async fn adjust(
        &self,
        product_id: &str,
        target_quantity: i64,
        reason: Option<&str>,
        principal: &Principal,
    ) -> ServiceResult<StockAdjustment> {
        validate_target_quantity(target_quantity)?;
        if let Some(reason) = reason {
            validate_reason(reason)?;
        }

        let mut tx = self.pool.begin().await?;

        let product = load_product(&mut tx, product_id).await?;
        let delta = target_quantity - product.current_stock;

        if delta == 0 {
            // Nothing to record; the open transaction made no writes.
            return Ok(StockAdjustment {
                product,
                entry: None,
                kind: None,
                quantity: 0,
            });
        }

        let kind = if delta > 0 {
            MovementKind::StockIn
        } else {
            MovementKind::StockOut
        };

        let mutation = apply_movement(
            &mut tx,
            MovementCommand {
                product_id,
                kind,
                quantity: delta.abs(),
                reason,
                performed_by: &principal.id,
                sale_id: None,
                cost_price_cents: None,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            target_quantity,
            kind = ?kind,
            quantity = delta.abs(),
            "Stock adjusted"
        );

        self.audit()
            .record(
                "inventory.adjust",
                "product",
                product_id,
                &principal.id,
                serde_json::json!({
                    "target_quantity": target_quantity,
                    "kind": kind,
                    "quantity": delta.abs(),
                    "reason": reason,
                }),
            )
            .await;

        Ok(StockAdjustment {
            product: mutation.product,
            entry: Some(mutation.entry),
            kind: Some(kind),
            quantity: delta.abs(),
        })
    }

    /// Applies a sale-driven movement and stamps the entry with the sale
    /// reference.
    ///
    /// `Sale` deducts like a stock-out (including the sufficiency check);
    /// `Return` restocks like a stock-in. This is the ledger's entry point
    /// for the sale engine and the status machine - those callers run it
    /// inside their own transaction via the crate-internal helper, so a
    /// sale and its stock effects are atomic.
    pub async fn apply_sale_movement(
        &self,
        product_id: &str,
        quantity: i64,
        sale_id: &str,
        movement: SaleMovement,
        principal: &Principal,
    ) -> ServiceResult<StockMutation> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        let mutation = apply_movement(
            &mut tx,
            MovementCommand {
                product_id,
                kind: movement.kind(),
                quantity,
                reason: None,
                performed_by: &principal.id,
                sale_id: Some(sale_id),
                cost_price_cents: None,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            sale_id = %sale_id,
            movement = ?movement,
            quantity,
            "Applied sale movement"
        );

        Ok(mutation)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
