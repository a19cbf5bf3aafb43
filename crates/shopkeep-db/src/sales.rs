//! # Sale Engine
//!
//! Creates multi-item sales atomically and drives the sale status
//! lifecycle, delegating every stock effect to the inventory ledger.
//!
//! ## Checkout Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  create_sale                                                     │
//! │                                                                  │
//! │  validate input (items, quantities, amounts)                     │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  BEGIN ───────────────────────────────────────────────┐          │
//! │  │  verify customer (if given)                        │          │
//! │  │  for each item, in input order:                    │          │
//! │  │     re-read product, snapshot price, build line    │          │
//! │  │  total = subtotal + tax - discount                 │          │
//! │  │  INSERT sale (status: completed) + items           │          │
//! │  │  one SALE ledger movement per item  ◄── same tx,   │          │
//! │  │     (sufficiency checked here)        so the sale  │          │
//! │  │                                       and its      │          │
//! │  COMMIT ◄───────────────────────────── deductions     │          │
//! │       │                                are atomic     │          │
//! │       ▼                                               │          │
//! │  best-effort audit record, return SaleDetails         │          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//! A shortfall on any line aborts the whole sale: no partial sales, no
//! orphan movements, no sale row without its deductions.
//!
//! ## Status Lifecycle
//! `update_status` checks the transition table on [`SaleStatus`], persists
//! the new status, and - when entering Cancelled or Refunded - restocks
//! every original line item with a compensating RETURN entry in the same
//! transaction. The original SALE entries stay in the log untouched.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::AuditTrail;
use crate::error::{ServiceError, ServiceResult};
use crate::ledger::{apply_movement, load_product, MovementCommand};
use crate::repository::sale::{SALE_COLUMNS, SALE_ITEM_COLUMNS};
use shopkeep_core::validation::{
    validate_amount_cents, validate_price_cents, validate_quantity, validate_sale_items_len,
};
use shopkeep_core::{
    CoreError, Customer, Money, MovementKind, PaymentMethod, Principal, Sale, SaleItem,
    SaleStatus, ValidationError,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested line of a new sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the product's current price when set (negotiated price).
    pub unit_price_cents: Option<i64>,
}

/// Input for [`SalesEngine::create_sale`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub customer_id: Option<String>,
    pub items: Vec<NewSaleItem>,
    pub payment_method: PaymentMethod,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub notes: Option<String>,
}

/// A created sale with its line items and the parties involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub customer: Option<Customer>,
    pub staff: Principal,
}

// =============================================================================
// Sales Engine
// =============================================================================

/// Creates sales and drives their status lifecycle.
///
/// Stock is never touched directly: every deduction and restock goes
/// through the inventory ledger's movement application, folded into this
/// engine's transactions.
#[derive(Debug, Clone)]
pub struct SalesEngine {
    pool: SqlitePool,
}

impl SalesEngine {
    /// Creates a new SalesEngine.
    pub fn new(pool: SqlitePool) -> Self {
        SalesEngine { pool }
    }

    fn audit(&self) -> AuditTrail {
        AuditTrail::new(self.pool.clone())
    }

    /// Creates a completed sale from the given items.
    ///
    /// Runs one transaction covering stock validation, price snapshotting,
    /// the sale + item inserts and one SALE ledger movement per line item.
    ///
    /// ## Errors
    /// * `InvalidArgument` - empty items, non-positive quantity, negative
    ///   tax/discount, or a discount driving the total negative
    /// * `NotFound` - customer or product missing/inactive
    /// * `InsufficientStock` - any line exceeds the product's stock; the
    ///   message names the product and both quantities
    /// * `Conflict` (unique violation) - sale number collision
    pub async fn create_sale(&self, request: NewSale, staff: &Principal) -> ServiceResult<SaleDetails> {
        validate_sale_items_len(request.items.len())?;
        for item in &request.items {
            validate_quantity(item.quantity)?;
            if let Some(price) = item.unit_price_cents {
                validate_price_cents(price)?;
            }
        }
        validate_amount_cents("tax", request.tax_cents)?;
        validate_amount_cents("discount", request.discount_cents)?;

        let sale_id = Uuid::new_v4().to_string();
        let sale_number = generate_sale_number();
        let now = Utc::now();

        debug!(sale_id = %sale_id, sale_number = %sale_number, "Creating sale");

        let mut tx = self.pool.begin().await?;

        let customer = match request.customer_id.as_deref() {
            Some(customer_id) => Some(fetch_customer(&mut tx, customer_id).await?),
            None => None,
        };

        // Snapshot prices in input order and build the line items.
        let mut subtotal = Money::zero();
        let mut items = Vec::with_capacity(request.items.len());
        for requested in &request.items {
            let product = load_product(&mut tx, &requested.product_id).await?;

            let unit_price = requested.unit_price_cents.unwrap_or(product.price_cents);
            let line_total = Money::from_cents(unit_price).multiply_quantity(requested.quantity);
            subtotal += line_total;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                sku_snapshot: product.sku,
                name_snapshot: product.name,
                unit_price_cents: unit_price,
                quantity: requested.quantity,
                line_total_cents: line_total.cents(),
                created_at: now,
            });
        }

        let total = subtotal + Money::from_cents(request.tax_cents)
            - Money::from_cents(request.discount_cents);
        if total.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal.cents() + request.tax_cents,
            }
            .into());
        }

        let sale = Sale {
            id: sale_id.clone(),
            sale_number,
            status: SaleStatus::Completed,
            subtotal_cents: subtotal.cents(),
            tax_cents: request.tax_cents,
            discount_cents: request.discount_cents,
            total_cents: total.cents(),
            payment_method: request.payment_method,
            staff_id: staff.id.clone(),
            customer_id: request.customer_id.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        };

        insert_sale(&mut tx, &sale).await?;
        for item in &items {
            insert_sale_item(&mut tx, item).await?;
        }

        // Deduct stock inside the same transaction. The movement helper
        // re-reads the product, so repeated products within one sale see
        // each other's deductions and the sufficiency check stays exact.
        for item in &items {
            apply_movement(
                &mut tx,
                MovementCommand {
                    product_id: &item.product_id,
                    kind: MovementKind::Sale,
                    quantity: item.quantity,
                    reason: None,
                    performed_by: &staff.id,
                    sale_id: Some(&sale_id),
                    cost_price_cents: None,
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total_cents = sale.total_cents,
            items = items.len(),
            "Sale created"
        );

        self.audit()
            .record(
                "sale.created",
                "sale",
                &sale.id,
                &staff.id,
                serde_json::json!({
                    "sale_number": sale.sale_number,
                    "total_cents": sale.total_cents,
                    "items": items.len(),
                    "customer_id": sale.customer_id,
                }),
            )
            .await;

        Ok(SaleDetails {
            sale,
            items,
            customer,
            staff: staff.clone(),
        })
    }

    /// Transitions a sale to a new status.
    ///
    /// Entering Cancelled or Refunded restocks every original line item
    /// with a compensating RETURN ledger entry, in the same transaction as
    /// the status write.
    ///
    /// ## Errors
    /// * `NotFound` - sale missing
    /// * `InvalidTransition` - change not allowed by the lifecycle table;
    ///   the message names both statuses
    pub async fn update_status(
        &self,
        sale_id: &str,
        new_status: SaleStatus,
        reason: Option<&str>,
        staff: &Principal,
    ) -> ServiceResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id).await?;
        let previous_status = sale.status;

        if !previous_status.can_transition_to(new_status) {
            return Err(CoreError::InvalidTransition {
                from: previous_status,
                to: new_status,
            }
            .into());
        }

        let now = Utc::now();
        let completed_at = if new_status == SaleStatus::Completed {
            Some(now)
        } else {
            sale.completed_at
        };

        // Guarded on the status we read; a racing transition loses here.
        let result = sqlx::query(
            "UPDATE sales SET status = ?2, updated_at = ?3, completed_at = ?4 \
             WHERE id = ?1 AND status = ?5",
        )
        .bind(sale_id)
        .bind(new_status)
        .bind(now)
        .bind(completed_at)
        .bind(previous_status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InvalidTransition {
                from: previous_status,
                to: new_status,
            }
            .into());
        }

        if new_status.triggers_restock() {
            let items = fetch_sale_items(&mut tx, sale_id).await?;
            for item in &items {
                apply_movement(
                    &mut tx,
                    MovementCommand {
                        product_id: &item.product_id,
                        kind: MovementKind::Return,
                        quantity: item.quantity,
                        reason,
                        performed_by: &staff.id,
                        sale_id: Some(sale_id),
                        cost_price_cents: None,
                    },
                )
                .await?;
            }
        }

        tx.commit().await?;

        sale.status = new_status;
        sale.updated_at = now;
        sale.completed_at = completed_at;

        info!(
            sale_id = %sale_id,
            from = ?previous_status,
            to = ?new_status,
            "Sale status updated"
        );

        self.audit()
            .record(
                "sale.status_changed",
                "sale",
                sale_id,
                &staff.id,
                serde_json::json!({
                    "from": previous_status,
                    "to": new_status,
                    "reason": reason,
                }),
            )
            .await;

        Ok(sale)
    }
}

// =============================================================================
// Transaction-Level Helpers
// =============================================================================

async fn fetch_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> ServiceResult<Customer> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, email, is_active, created_at, updated_at \
         FROM customers WHERE id = ?1",
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

    Ok(customer)
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> ServiceResult<Sale> {
    let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&query)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ServiceError::from(CoreError::SaleNotFound(sale_id.to_string())))?;

    Ok(sale)
}

async fn fetch_sale_items(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> ServiceResult<Vec<SaleItem>> {
    let query = format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
    );
    let items = sqlx::query_as::<_, SaleItem>(&query)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> ServiceResult<()> {
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
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> ServiceResult<()> {
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
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Generates a sale number: date-time token plus a random suffix.
///
/// Format: `S-YYMMDDHHMMSS-XXXXXX` (UUID-derived suffix). Collisions are
/// negligible; the UNIQUE constraint on `sales.sale_number` is the
/// authoritative guarantee either way.
fn generate_sale_number() -> String {
    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("S-{}-{}", now.format("%y%m%d%H%M%S"), &suffix[..6])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{clerk, seed_customer, seed_product, test_db};
    use shopkeep_core::SaleMovement;

    fn one_item(product_id: &str, quantity: i64) -> NewSale {
        NewSale {
            customer_id: None,
            items: vec![NewSaleItem {
                product_id: product_id.to_string(),
                quantity,
                unit_price_cents: None,
            }],
            payment_method: PaymentMethod::Cash,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_sale_snapshots_and_deducts() {
        // 3 × 9.99 from a stock of 5.
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let staff = clerk();

        let details = db
            .sales_engine()
            .create_sale(one_item(&product.id, 3), &staff)
            .await
            .unwrap();

        assert_eq!(details.sale.status, SaleStatus::Completed);
        assert_eq!(details.sale.subtotal_cents, 2997);
        assert_eq!(details.sale.total_cents, 2997);
        assert!(details.sale.completed_at.is_some());
        assert_eq!(details.staff.id, staff.id);

        assert_eq!(details.items.len(), 1);
        let item = &details.items[0];
        assert_eq!(item.unit_price_cents, 999);
        assert_eq!(item.line_total_cents, 2997);
        assert_eq!(item.sku_snapshot, "COLA-330");

        // Stock dropped 5 → 2 with one SALE entry referencing the sale.
        let fresh = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 2);

        let movements = db.movements().list_for_sale(&details.sale.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Sale);
        assert_eq!(movements[0].quantity, 3);
        assert_eq!(movements[0].previous_stock, 5);
        assert_eq!(movements[0].new_stock, 2);
    }

    #[tokio::test]
    async fn test_create_sale_tax_and_discount() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;

        let mut request = one_item(&product.id, 3);
        request.tax_cents = 250;
        request.discount_cents = 100;

        let details = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap();

        assert_eq!(details.sale.subtotal_cents, 2997);
        assert_eq!(details.sale.tax_cents, 250);
        assert_eq!(details.sale.discount_cents, 100);
        assert_eq!(details.sale.total_cents, 2997 + 250 - 100);
    }

    #[tokio::test]
    async fn test_create_sale_price_override() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;

        let mut request = one_item(&product.id, 2);
        request.items[0].unit_price_cents = Some(899);

        let details = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap();

        assert_eq!(details.items[0].unit_price_cents, 899);
        assert_eq!(details.sale.subtotal_cents, 1798);
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_catalog_change() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let staff = clerk();

        let details = db
            .sales_engine()
            .create_sale(one_item(&product.id, 1), &staff)
            .await
            .unwrap();

        // Reprice the product afterwards.
        let mut updated = product.clone();
        updated.price_cents = 1299;
        db.products().update(&updated).await.unwrap();

        let items = db.sales().get_items(&details.sale.id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 999);
    }

    #[tokio::test]
    async fn test_create_sale_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 2).await;

        let err = db
            .sales_engine()
            .create_sale(one_item(&product.id, 3), &clerk())
            .await
            .unwrap_err();

        match err {
            ServiceError::Core(CoreError::InsufficientStock {
                sku,
                available,
                requested,
            }) => {
                assert_eq!(sku, "COLA-330");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Zero sale rows, zero sale movements, stock untouched.
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let movements = db.movements().list_for_product(&product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1); // opening stock only
        let fresh = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 2);
    }

    #[tokio::test]
    async fn test_create_sale_partial_failure_is_all_or_nothing() {
        // Second line fails; the first line's deduction must roll back too.
        let db = test_db().await;
        let cola = seed_product(&db, "COLA-330", 999, 10).await;
        let bread = seed_product(&db, "BREAD-STD", 350, 1).await;

        let request = NewSale {
            customer_id: None,
            items: vec![
                NewSaleItem {
                    product_id: cola.id.clone(),
                    quantity: 2,
                    unit_price_cents: None,
                },
                NewSaleItem {
                    product_id: bread.id.clone(),
                    quantity: 5,
                    unit_price_cents: None,
                },
            ],
            payment_method: PaymentMethod::Card,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        };

        let err = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { .. })
        ));

        let cola_fresh = db.products().get_by_id(&cola.id).await.unwrap().unwrap();
        assert_eq!(cola_fresh.current_stock, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_sale_repeated_product_shares_stock() {
        // Two lines for the same product must be checked against the same
        // shrinking stock, not two stale reads.
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;

        let request = NewSale {
            customer_id: None,
            items: vec![
                NewSaleItem {
                    product_id: product.id.clone(),
                    quantity: 3,
                    unit_price_cents: None,
                },
                NewSaleItem {
                    product_id: product.id.clone(),
                    quantity: 3,
                    unit_price_cents: None,
                },
            ],
            payment_method: PaymentMethod::Cash,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        };

        let err = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { .. })
        ));

        let fresh = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 5);
    }

    #[tokio::test]
    async fn test_create_sale_rejects_empty_and_invalid_input() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let engine = db.sales_engine();

        let empty = NewSale {
            customer_id: None,
            items: vec![],
            payment_method: PaymentMethod::Cash,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        };
        assert!(matches!(
            engine.create_sale(empty, &clerk()).await.unwrap_err(),
            ServiceError::Core(CoreError::Validation(_))
        ));

        let zero_qty = one_item(&product.id, 0);
        assert!(matches!(
            engine.create_sale(zero_qty, &clerk()).await.unwrap_err(),
            ServiceError::Core(CoreError::Validation(_))
        ));

        let mut negative_tax = one_item(&product.id, 1);
        negative_tax.tax_cents = -1;
        assert!(matches!(
            engine.create_sale(negative_tax, &clerk()).await.unwrap_err(),
            ServiceError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_sale_rejects_negative_total() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;

        let mut request = one_item(&product.id, 1);
        request.discount_cents = 5000; // exceeds 999 + 0 tax

        let err = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(_))
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_sale_unknown_customer() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;

        let mut request = one_item(&product.id, 1);
        request.customer_id = Some("no-such-customer".to_string());

        let err = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::CustomerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_sale_with_customer() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let customer = seed_customer(&db, "Asha Verma").await;

        let mut request = one_item(&product.id, 1);
        request.customer_id = Some(customer.id.clone());

        let details = db
            .sales_engine()
            .create_sale(request, &clerk())
            .await
            .unwrap();

        assert_eq!(details.sale.customer_id.as_deref(), Some(customer.id.as_str()));
        assert_eq!(details.customer.unwrap().name, "Asha Verma");
    }

    #[tokio::test]
    async fn test_sale_numbers_are_unique() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 10).await;
        let engine = db.sales_engine();
        let staff = clerk();

        let first = engine
            .create_sale(one_item(&product.id, 1), &staff)
            .await
            .unwrap();
        let second = engine
            .create_sale(one_item(&product.id, 1), &staff)
            .await
            .unwrap();

        assert_ne!(first.sale.sale_number, second.sale.sale_number);
        assert_ne!(first.sale.id, second.sale.id);

        // Both rows exist; neither overwrote the other.
        assert_eq!(db.sales().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_refund_restocks_each_line_item() {
        let db = test_db().await;
        let cola = seed_product(&db, "COLA-330", 999, 5).await;
        let bread = seed_product(&db, "BREAD-STD", 350, 4).await;
        let staff = clerk();

        let request = NewSale {
            customer_id: None,
            items: vec![
                NewSaleItem {
                    product_id: cola.id.clone(),
                    quantity: 3,
                    unit_price_cents: None,
                },
                NewSaleItem {
                    product_id: bread.id.clone(),
                    quantity: 2,
                    unit_price_cents: None,
                },
            ],
            payment_method: PaymentMethod::Cash,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        };

        let details = db.sales_engine().create_sale(request, &staff).await.unwrap();

        let updated = db
            .sales_engine()
            .update_status(&details.sale.id, SaleStatus::Refunded, Some("Damaged box"), &staff)
            .await
            .unwrap();
        assert_eq!(updated.status, SaleStatus::Refunded);

        // Stock restored in full.
        let cola_fresh = db.products().get_by_id(&cola.id).await.unwrap().unwrap();
        let bread_fresh = db.products().get_by_id(&bread.id).await.unwrap().unwrap();
        assert_eq!(cola_fresh.current_stock, 5);
        assert_eq!(bread_fresh.current_stock, 4);

        // One RETURN per original line item, alongside the SALE entries.
        let movements = db.movements().list_for_sale(&details.sale.id).await.unwrap();
        let sales: Vec<_> = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Sale)
            .collect();
        let returns: Vec<_> = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Return)
            .collect();
        assert_eq!(sales.len(), 2);
        assert_eq!(returns.len(), 2);
        for entry in returns {
            assert_eq!(entry.sale_id.as_deref(), Some(details.sale.id.as_str()));
        }
    }

    #[tokio::test]
    async fn test_terminal_states_reject_all_transitions() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let staff = clerk();

        let details = db
            .sales_engine()
            .create_sale(one_item(&product.id, 1), &staff)
            .await
            .unwrap();
        db.sales_engine()
            .update_status(&details.sale.id, SaleStatus::Refunded, None, &staff)
            .await
            .unwrap();

        for next in [
            SaleStatus::Pending,
            SaleStatus::Completed,
            SaleStatus::Cancelled,
            SaleStatus::Refunded,
        ] {
            let err = db
                .sales_engine()
                .update_status(&details.sale.id, next, None, &staff)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Core(CoreError::InvalidTransition { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_completed_cannot_be_cancelled() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let staff = clerk();

        let details = db
            .sales_engine()
            .create_sale(one_item(&product.id, 1), &staff)
            .await
            .unwrap();

        let err = db
            .sales_engine()
            .update_status(&details.sale.id, SaleStatus::Cancelled, None, &staff)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Completed") && msg.contains("Cancelled"));
    }

    #[tokio::test]
    async fn test_pending_sale_completes_and_cancels() {
        let db = test_db().await;
        let product = seed_product(&db, "COLA-330", 999, 5).await;
        let staff = clerk();

        // Pending sales come from outside the checkout path; stage two of
        // them directly, with their deductions applied.
        let engine = db.sales_engine();
        let ledger = db.ledger();

        let mut pending_a = crate::testutil::bare_sale("S-PEND-0001", SaleStatus::Pending, &staff);
        pending_a.total_cents = 999;
        db.sales().insert(&pending_a).await.unwrap();
        db.sales()
            .add_item(&crate::testutil::bare_item(&pending_a.id, &product, 2))
            .await
            .unwrap();
        ledger
            .apply_sale_movement(&product.id, 2, &pending_a.id, SaleMovement::Sale, &staff)
            .await
            .unwrap();

        let completed = engine
            .update_status(&pending_a.id, SaleStatus::Completed, None, &staff)
            .await
            .unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);
        assert!(completed.completed_at.is_some());

        let mut pending_b = crate::testutil::bare_sale("S-PEND-0002", SaleStatus::Pending, &staff);
        pending_b.total_cents = 999;
        db.sales().insert(&pending_b).await.unwrap();
        db.sales()
            .add_item(&crate::testutil::bare_item(&pending_b.id, &product, 1))
            .await
            .unwrap();
        ledger
            .apply_sale_movement(&product.id, 1, &pending_b.id, SaleMovement::Sale, &staff)
            .await
            .unwrap();

        // Cancellation restocks the pending sale's items.
        let before = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        engine
            .update_status(&pending_b.id, SaleStatus::Cancelled, Some("Walked out"), &staff)
            .await
            .unwrap();
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, before.current_stock + 1);
    }

    #[tokio::test]
    async fn test_update_status_unknown_sale() {
        let db = test_db().await;

        let err = db
            .sales_engine()
            .update_status("no-such-sale", SaleStatus::Refunded, None, &clerk())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sale_number_format() {
        let number = generate_sale_number();
        assert!(number.starts_with("S-"));
        // S- + 12 digit timestamp + - + 6 char suffix
        assert_eq!(number.len(), 2 + 12 + 1 + 6);
    }
}
