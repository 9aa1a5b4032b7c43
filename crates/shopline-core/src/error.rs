//! # Error Types
//!
//! Domain-specific error types for shopline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopline-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopline-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  pos-api errors (in app)                                               │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (stock id, cart line, ...)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A shop, stock item, allocation, cart entry or user does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Shop-level stock cannot cover a cart line.
    ///
    /// ## User Workflow
    /// ```text
    /// Complete Sale (line 2: stock 10, qty 5)
    ///      │
    ///      ▼
    /// Re-fetch ShopStock: quantity=3
    ///      │
    ///      ▼
    /// InsufficientStock { line: 2, stock_id: 10, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole transaction rolled back, operator fixes line 2 and resubmits
    /// ```
    #[error(
        "Insufficient stock for cart line {line} (stock {stock_id}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        line: usize,
        stock_id: i64,
        available: i64,
        requested: i64,
    },

    /// The owner catalog cannot cover an allocation transfer.
    #[error("Insufficient owner stock for stock {stock_id}: available {available}, requested {requested}")]
    InsufficientOwnerStock {
        stock_id: i64,
        available: i64,
        requested: i64,
    },

    /// A sale was submitted with no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The row changed since the caller read it.
    #[error("{entity} {id} was modified concurrently; reload and retry")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// The caller's role does not allow the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a ConcurrencyConflict error for a given entity type and ID.
    pub fn conflict(entity: &'static str, id: impl ToString) -> Self {
        CoreError::ConcurrencyConflict {
            entity,
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any storage is touched.
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

    /// Invalid format (e.g., invalid phone, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Buy price exceeds sell price.
    #[error("Buy price ({buy_cents} cents) cannot be greater than sell price ({sell_cents} cents)")]
    BuyAboveSell { buy_cents: i64, sell_cents: i64 },

    /// A tier was assigned to a non-customer account.
    #[error("Loyalty tiers apply to customers only")]
    TierRequiresCustomer,

    /// A computed amount or count no longer fits in 64 bits.
    #[error("{field} is too large")]
    Overflow { field: String },
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
    fn test_insufficient_stock_names_the_line() {
        let err = CoreError::InsufficientStock {
            line: 2,
            stock_id: 10,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for cart line 2 (stock 10): available 3, requested 5"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("ShopStock", 42);
        assert_eq!(err.to_string(), "ShopStock not found: 42");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_buy_above_sell_message() {
        let err = ValidationError::BuyAboveSell {
            buy_cents: 1200,
            sell_cents: 999,
        };
        assert!(err.to_string().contains("1200"));
    }
}
