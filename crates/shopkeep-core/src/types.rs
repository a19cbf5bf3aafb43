//! # Domain Types
//!
//! Core domain types used throughout Shopkeep.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                             │
//! │                                                                  │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────────────┐   │
//! │  │    Product    │   │     Sale      │   │  StockMovement   │   │
//! │  │  ───────────  │   │  ───────────  │   │  ──────────────  │   │
//! │  │  id (UUID)    │   │  id (UUID)    │   │  id (UUID)       │   │
//! │  │  sku          │   │  sale_number  │   │  kind            │   │
//! │  │  price_cents  │   │  status       │   │  previous_stock  │   │
//! │  │  current_stock│   │  total_cents  │   │  new_stock       │   │
//! │  └───────────────┘   └───────────────┘   └──────────────────┘   │
//! │                                                                  │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────────────┐   │
//! │  │ MovementKind  │   │  SaleStatus   │   │  PaymentMethod   │   │
//! │  │  StockIn/Out  │   │  Pending      │   │  Cash            │   │
//! │  │  Sale/Return  │   │  Completed    │   │  Card            │   │
//! │  │  Damage/Adj.  │   │  Cancelled    │   │  Transfer        │   │
//! │  └───────────────┘   │  Refunded     │   └──────────────────┘   │
//! │                      └───────────────┘                           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, sale_number) - human-readable, shown to users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product tracked by the back office.
///
/// `current_stock` is the mutable ground truth for inventory. It is only
/// ever written through the inventory ledger, which records a matching
/// [`StockMovement`] for every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique per store.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Unit cost in cents (for margin calculations).
    pub cost_cents: Option<i64>,

    /// Reorder threshold; stock below this is "low".
    pub min_stock: i64,

    /// Optional shelf-capacity ceiling.
    pub max_stock: Option<i64>,

    /// Current stock level. Never negative.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether an outbound movement of `quantity` can be fulfilled.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    /// True when stock has fallen below the reorder threshold.
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock < self.min_stock
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// The direction a stock movement pushes the quantity in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    /// Quantity increases.
    Inbound,
    /// Quantity decreases.
    Outbound,
}

impl StockDirection {
    /// Applies the direction's sign to a positive magnitude.
    #[inline]
    pub const fn signed(self, quantity: i64) -> i64 {
        match self {
            StockDirection::Inbound => quantity,
            StockDirection::Outbound => -quantity,
        }
    }
}

/// The closed set of stock movement kinds.
///
/// Every ledger entry carries one of these. Branching on movement kind is
/// always an exhaustive match, so adding a kind is a compile-time-checked
/// change, not a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (restock, purchase, opening stock).
    StockIn,
    /// Goods removed outside a sale (manual removal, shrinkage).
    StockOut,
    /// Deduction driven by a sale line item.
    Sale,
    /// Restock driven by a cancellation or refund of a sale.
    Return,
    /// Write-off of damaged goods.
    Damage,
    /// Reserved for direction-neutral corrections. The ledger itself never
    /// writes this kind: an adjust operation logs the signed result as
    /// `StockIn` or `StockOut`.
    Adjustment,
}

impl MovementKind {
    /// The direction this kind moves stock in, or `None` for the
    /// direction-neutral `Adjustment` kind.
    pub const fn direction(self) -> Option<StockDirection> {
        match self {
            MovementKind::StockIn | MovementKind::Return => Some(StockDirection::Inbound),
            MovementKind::StockOut | MovementKind::Sale | MovementKind::Damage => {
                Some(StockDirection::Outbound)
            }
            MovementKind::Adjustment => None,
        }
    }

    /// The kind that reverses this one's stock effect, where a canonical
    /// compensating kind exists. Compensation is always a new forward
    /// entry; existing entries are never edited.
    pub const fn compensating(self) -> Option<MovementKind> {
        match self {
            MovementKind::StockIn => Some(MovementKind::StockOut),
            MovementKind::StockOut => Some(MovementKind::StockIn),
            MovementKind::Sale => Some(MovementKind::Return),
            MovementKind::Return => Some(MovementKind::Sale),
            MovementKind::Damage => Some(MovementKind::StockIn),
            MovementKind::Adjustment => None,
        }
    }
}

/// The two movement kinds a sale lifecycle may apply, as a closed input
/// type for the ledger's sale entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleMovement {
    /// Deduct stock for a sold line item.
    Sale,
    /// Restock a returned line item (cancellation/refund).
    Return,
}

impl SaleMovement {
    /// The ledger kind recorded for this movement.
    #[inline]
    pub const fn kind(self) -> MovementKind {
        match self {
            SaleMovement::Sale => MovementKind::Sale,
            SaleMovement::Return => MovementKind::Return,
        }
    }
}

/// One immutable entry in the append-only stock movement log.
///
/// Created exactly once per stock mutation, atomically with it. Never
/// updated or deleted. `quantity` is a positive magnitude; the direction
/// is implied by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    /// Positive magnitude of the change.
    pub quantity: i64,
    /// Stock level immediately before this entry.
    pub previous_stock: i64,
    /// Stock level immediately after this entry.
    pub new_stock: i64,
    /// Free-text reason supplied by the caller.
    pub reason: Option<String>,
    /// Acting principal's identifier.
    pub performed_by: String,
    /// Sale this movement belongs to, for sale/return kinds.
    pub sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed stock change recorded by this entry.
    #[inline]
    pub fn delta(&self) -> i64 {
        self.new_stock - self.previous_stock
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The lifecycle status of a sale.
///
/// ## Transition table
/// ```text
/// Pending   ──► Completed | Cancelled
/// Completed ──► Refunded
/// Cancelled ──► (terminal)
/// Refunded  ──► (terminal)
/// ```
/// Entering Cancelled or Refunded triggers one compensating RETURN ledger
/// entry per original line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded but not finalized. Not produced by the checkout path,
    /// which creates sales directly as Completed.
    Pending,
    /// Paid and finalized. Amounts are immutable from here on.
    Completed,
    /// Abandoned before fulfilment. Terminal.
    Cancelled,
    /// Paid sale reversed. Terminal.
    Refunded,
}

impl SaleStatus {
    /// The statuses this one may transition to.
    pub const fn allowed_transitions(self) -> &'static [SaleStatus] {
        match self {
            SaleStatus::Pending => &[SaleStatus::Completed, SaleStatus::Cancelled],
            SaleStatus::Completed => &[SaleStatus::Refunded],
            SaleStatus::Cancelled => &[],
            SaleStatus::Refunded => &[],
        }
    }

    /// Checks a single transition against the table.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// True when no further transitions are allowed.
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// True when entering this status restocks the sale's line items.
    pub const fn triggers_restock(self) -> bool {
        matches!(self, SaleStatus::Cancelled | SaleStatus::Refunded)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer / mobile wallet.
    Transfer,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Human-facing unique sale number, distinct from `id`.
    pub sale_number: String,
    pub status: SaleStatus,
    /// Sum of line totals.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    /// `subtotal + tax - discount`, fixed at creation.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Staff principal who recorded the sale.
    pub staff_id: String,
    /// Optional customer reference.
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the final amount as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: sku, name and unit price are copied from the
/// product at transaction time, so later catalog changes never retroactively
/// alter historical sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer a sale may optionally be attributed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated actor attributed to a mutation.
///
/// Identity resolution happens outside this system; callers pass the
/// resolved principal in, and it is stamped onto ledger entries, sales and
/// audit records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    /// Display name, echoed back in responses.
    pub name: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_directions() {
        assert_eq!(
            MovementKind::StockIn.direction(),
            Some(StockDirection::Inbound)
        );
        assert_eq!(
            MovementKind::Return.direction(),
            Some(StockDirection::Inbound)
        );
        assert_eq!(
            MovementKind::StockOut.direction(),
            Some(StockDirection::Outbound)
        );
        assert_eq!(
            MovementKind::Sale.direction(),
            Some(StockDirection::Outbound)
        );
        assert_eq!(
            MovementKind::Damage.direction(),
            Some(StockDirection::Outbound)
        );
        assert_eq!(MovementKind::Adjustment.direction(), None);
    }

    #[test]
    fn test_movement_compensating_pairs() {
        assert_eq!(
            MovementKind::Sale.compensating(),
            Some(MovementKind::Return)
        );
        assert_eq!(
            MovementKind::Return.compensating(),
            Some(MovementKind::Sale)
        );
        assert_eq!(
            MovementKind::StockIn.compensating(),
            Some(MovementKind::StockOut)
        );
        assert_eq!(MovementKind::Adjustment.compensating(), None);
    }

    #[test]
    fn test_signed_direction() {
        assert_eq!(StockDirection::Inbound.signed(7), 7);
        assert_eq!(StockDirection::Outbound.signed(7), -7);
    }

    #[test]
    fn test_sale_movement_kinds() {
        assert_eq!(SaleMovement::Sale.kind(), MovementKind::Sale);
        assert_eq!(SaleMovement::Return.kind(), MovementKind::Return);
    }

    #[test]
    fn test_status_transition_table() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Completed));
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Pending.can_transition_to(SaleStatus::Refunded));

        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Refunded));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Pending));

        for next in [
            SaleStatus::Pending,
            SaleStatus::Completed,
            SaleStatus::Cancelled,
            SaleStatus::Refunded,
        ] {
            assert!(!SaleStatus::Cancelled.can_transition_to(next));
            assert!(!SaleStatus::Refunded.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_terminal_and_restock() {
        assert!(SaleStatus::Cancelled.is_terminal());
        assert!(SaleStatus::Refunded.is_terminal());
        assert!(!SaleStatus::Pending.is_terminal());
        assert!(!SaleStatus::Completed.is_terminal());

        assert!(SaleStatus::Cancelled.triggers_restock());
        assert!(SaleStatus::Refunded.triggers_restock());
        assert!(!SaleStatus::Completed.triggers_restock());
    }

    #[test]
    fn test_product_stock_helpers() {
        let product = Product {
            id: "p1".to_string(),
            sku: "COLA-330".to_string(),
            name: "Cola 330ml".to_string(),
            description: None,
            price_cents: 999,
            cost_cents: Some(600),
            min_stock: 10,
            max_stock: Some(200),
            current_stock: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(product.can_fulfill(5));
        assert!(!product.can_fulfill(6));
        assert!(product.is_below_minimum());
    }

    #[test]
    fn test_movement_delta() {
        let entry = StockMovement {
            id: "m1".to_string(),
            product_id: "p1".to_string(),
            kind: MovementKind::StockOut,
            quantity: 50,
            previous_stock: 50,
            new_stock: 0,
            reason: None,
            performed_by: "staff-1".to_string(),
            sale_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.delta(), -50);
        assert_eq!(
            entry.delta(),
            MovementKind::StockOut
                .direction()
                .map(|d| d.signed(entry.quantity))
                .unwrap_or(0)
        );
    }
}
