//! # shopline-core: Pure Business Logic for Shopline POS
//!
//! This crate holds the retail rules of Shopline as pure functions with zero
//! I/O dependencies: money arithmetic, the loyalty tier discount table, line
//! pricing, input validation and the domain records shared by the database
//! and API layers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shopline POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pos-api (axum)                               │   │
//! │  │   lookup customer ─► quote line ─► complete sale ─► history     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopline-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │ Stock     │  │   Money   │  │   Tier    │  │   rules   │  │   │
//! │  │   │ ShopStock │  │ Discount  │  │ LinePrice │  │  checks   │  │   │
//! │  │   │ Sale      │  │   Rate    │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              shopline-db (Database Layer)                       │   │
//! │  │        SQLite queries, migrations, transactional workflows      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Stock, ShopStock, Shop, User, Sale, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Tier discount table and line pricing
//! - [`dto`] - JSON request/response contracts of the POS endpoints
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopline_core::money::Money;
//! use shopline_core::pricing::price_line;
//! use shopline_core::types::Tier;
//!
//! let unit = Money::from_cents(999); // $9.99
//! let line = price_line(unit, 2, Tier::Silver.discount_rate()).unwrap();
//!
//! assert_eq!(line.subtotal.cents(), 1998);
//! assert_eq!(line.discount.cents(), 200);
//! assert_eq!(line.total.cents(), 1798);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dto;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use pricing::{line_subtotal, price_line, LinePrice, SaleTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single POS cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps one commit transaction short.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item on one sale line.
///
/// ## Business Reason
/// Prevents accidental over-ringing at the till (typing 1000 instead of 10).
/// Allocation transfers are not bound by this limit.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum buy or sell price of a catalog item, in cents ($1,000,000).
///
/// Keeps `price * MAX_ITEM_QUANTITY * MAX_CART_ITEMS` far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Maximum units a single stock or shop row may hold.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Maximum stored length of a customer phone number.
pub const MAX_PHONE_LENGTH: usize = 15;
