//! # shopkeep-core: Pure Business Logic for Shopkeep
//!
//! This crate is the **heart** of the Shopkeep back office. It contains all
//! business rules as pure types and functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Shopkeep Architecture                        │
//! │                                                                  │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │            HTTP controllers (external callers)             │ │
//! │  └──────────────────────────────┬─────────────────────────────┘ │
//! │                                 │                                │
//! │  ┌──────────────────────────────▼─────────────────────────────┐ │
//! │  │              ★ shopkeep-core (THIS CRATE) ★                │ │
//! │  │                                                            │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌──────────────┐  │ │
//! │  │  │  types  │ │  money  │ │ validation │ │    error     │  │ │
//! │  │  │ Product │ │  Money  │ │   rules    │ │  CoreError   │  │ │
//! │  │  │  Sale   │ │  cents  │ │   checks   │ │  Validation  │  │ │
//! │  │  └─────────┘ └─────────┘ └────────────┘ └──────────────┘  │ │
//! │  │                                                            │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │ │
//! │  └──────────────────────────────┬─────────────────────────────┘ │
//! │                                 │                                │
//! │  ┌──────────────────────────────▼─────────────────────────────┐ │
//! │  │              shopkeep-db (Database Layer)                  │ │
//! │  │     SQLite queries, migrations, ledger + sale engines      │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, StockMovement, enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//! 5. **Closed Enums**: movement kinds and sale statuses are exhaustive
//!    matches, so a new kind or state is a compile-time-checked change

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopkeep_core::Money` instead of
// `use shopkeep_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single sale.
///
/// ## Business Reason
/// Prevents runaway orders and keeps transaction sizes reasonable.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single movement or line item.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
