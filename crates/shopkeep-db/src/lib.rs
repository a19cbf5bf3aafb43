//! # shopkeep-db: Database Layer for Shopkeep
//!
//! This crate provides database access and the transactional engines for
//! the Shopkeep back office. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Shopkeep Data Flow                          │
//! │                                                                  │
//! │  Caller (HTTP controller, CLI, test)                             │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                  shopkeep-db (THIS CRATE)                  │ │
//! │  │                                                            │ │
//! │  │  ┌──────────────┐  ┌───────────────┐  ┌────────────────┐  │ │
//! │  │  │   Database   │  │ Repositories  │  │   Migrations   │  │ │
//! │  │  │  (pool.rs)   │  │ product, sale │  │   (embedded)   │  │ │
//! │  │  └──────────────┘  │ customer,     │  └────────────────┘  │ │
//! │  │                    │ movement      │                      │ │
//! │  │  ┌──────────────┐  └───────────────┘  ┌────────────────┐  │ │
//! │  │  │ Inventory    │                     │  SalesEngine   │  │ │
//! │  │  │ Ledger       │◄────────────────────│  (checkout +   │  │ │
//! │  │  │ (sole stock  │  movements folded   │   lifecycle)   │  │ │
//! │  │  │  write path) │  into one tx        └────────────────┘  │ │
//! │  │  └──────────────┘                                          │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  SQLite Database (WAL mode)                                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Repository implementations (product, sale, ...)
//! - [`ledger`] - The inventory ledger: the only write path for stock
//! - [`sales`] - Sale creation and status lifecycle engine
//! - [`audit`] - Best-effort audit record sink
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopkeep_db::{Database, DbConfig};
//! use shopkeep_core::Principal;
//!
//! let db = Database::new(DbConfig::new("path/to/shop.db")).await?;
//! let staff = Principal::new("staff-1", "A. Clerk");
//!
//! // Receive goods
//! let mutation = db.ledger().stock_in(&product_id, 24, Some("Delivery"), None, &staff).await?;
//!
//! // Sell them
//! let details = db.sales_engine().create_sale(request, &staff).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sales;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};

pub use audit::AuditTrail;
pub use ledger::{InventoryLedger, StockAdjustment, StockMutation};
pub use sales::{NewSale, NewSaleItem, SaleDetails, SalesEngine};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures for the in-memory database tests.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};
    use shopkeep_core::{Customer, PaymentMethod, Principal, Product, Sale, SaleItem, SaleStatus};

    /// Fresh in-memory database with migrations applied.
    pub(crate) async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// The staff principal used across tests.
    pub(crate) fn clerk() -> Principal {
        Principal::new("staff-1", "Test Clerk")
    }

    /// Inserts a product with the given opening stock.
    pub(crate) async fn seed_product(
        db: &Database,
        sku: &str,
        price_cents: i64,
        stock: i64,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("{sku} (test)"),
            description: None,
            price_cents,
            cost_cents: None,
            min_stock: 0,
            max_stock: None,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products()
            .insert(&product, &clerk().id)
            .await
            .expect("seed product")
    }

    /// Inserts a customer.
    pub(crate) async fn seed_customer(db: &Database, name: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: None,
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await.expect("seed customer")
    }

    /// A minimal sale row for tests that stage sales outside the engine.
    pub(crate) fn bare_sale(sale_number: &str, status: SaleStatus, staff: &Principal) -> Sale {
        let now = Utc::now();
        Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: sale_number.to_string(),
            status,
            subtotal_cents: 0,
            tax_cents: 0,
            discount_cents: 0,
            total_cents: 0,
            payment_method: PaymentMethod::Cash,
            staff_id: staff.id.clone(),
            customer_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// A line item snapshotting the given product.
    pub(crate) fn bare_item(sale_id: &str, product: &Product, quantity: i64) -> SaleItem {
        SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: product.id.clone(),
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            line_total_cents: product.price_cents * quantity,
            created_at: Utc::now(),
        }
    }
}
