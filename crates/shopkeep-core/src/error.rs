//! # Error Types
//!
//! Domain-specific error types for shopkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Error Types                              │
//! │                                                                  │
//! │  shopkeep-core errors (this file)                                │
//! │  ├── CoreError        - Business rule violations                 │
//! │  └── ValidationError  - Input validation failures                │
//! │                                                                  │
//! │  shopkeep-db errors (separate crate)                             │
//! │  ├── DbError          - Database operation failures              │
//! │  └── ServiceError     - CoreError ∪ DbError, engine surface      │
//! │                                                                  │
//! │  Flow: ValidationError → CoreError → ServiceError → caller       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, quantities, statuses)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a stable user-facing kind

use thiserror::Error;

use crate::types::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. Callers map them to their own
/// status surface; none of them is retried or swallowed internally.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product missing from the catalog, or deactivated.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer reference on a sale does not resolve.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale missing.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Outbound movement larger than the current stock level.
    ///
    /// The message names the product and both quantities so the caller can
    /// surface it without a second lookup.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Status change not allowed by the sale lifecycle table.
    #[error("Sale status cannot change from {from:?} to {to:?}")]
    InvalidTransition { from: SaleStatus, to: SaleStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs, when caller input doesn't meet
/// requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            sku: "COLA-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COLA-330: available 3, requested 5"
        );
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = CoreError::InvalidTransition {
            from: SaleStatus::Cancelled,
            to: SaleStatus::Completed,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cancelled"));
        assert!(msg.contains("Completed"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "payment_method".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
