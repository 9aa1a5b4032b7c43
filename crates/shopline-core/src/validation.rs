//! # Validation Module
//!
//! Input validation rules for Shopline POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (pos-api)                                       │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Workflow / repository (shopline-db)                          │
//! │  └── THIS MODULE: Business rule validation, before any write           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 0, buy <= sell)                    │
//! │  ├── UNIQUE constraints (email, phone, shop+stock)                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopline_core::validation::{validate_phone, validate_sale_quantity};
//!
//! validate_phone("(555) 010-0000").unwrap();
//! validate_sale_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::DiscountRate;
use crate::{
    MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PHONE_LENGTH, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a required text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use shopline_core::validation::validate_text;
///
/// assert_eq!(validate_text("name", "  Dune ", 100).unwrap(), "Dune");
/// assert!(validate_text("name", "", 100).is_err());
/// assert!(validate_text("name", &"A".repeat(101), 100).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Catalog item name: 1-100 characters.
pub fn validate_stock_name(name: &str) -> ValidationResult<String> {
    validate_text("name", name, 100)
}

/// Shop name (1-100) and location (1-255).
pub fn validate_shop(name: &str, location: &str) -> ValidationResult<(String, String)> {
    Ok((
        validate_text("name", name, 100)?,
        validate_text("location", location, 255)?,
    ))
}

/// First and last name, 1-50 characters each.
pub fn validate_person_name(first: &str, last: &str) -> ValidationResult<(String, String)> {
    Ok((
        validate_text("firstName", first, 50)?,
        validate_text("lastName", last, 50)?,
    ))
}

/// Normalizes an optional free-text field: blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_text(field, v, max).map(Some),
    }
}

/// Validates a phone number and returns it trimmed.
///
/// ## Rules
/// - 1 to 15 characters
/// - Digits plus the separators `+ - ( )` and spaces
/// - At least one digit
///
/// The number is stored exactly as typed; lookups compare the stored form.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = validate_text("phone", phone, MAX_PHONE_LENGTH)?;

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ');
    if !phone.chars().all(allowed) || !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain digits and only + - ( ) or spaces".to_string(),
        });
    }

    Ok(phone)
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// Requires one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_text("email", email, 254)?.to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(email)
}

/// Passwords need at least 8 characters. Hashing happens in the db layer.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must be at least 8 characters".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of one sale or cart line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POS: Quote Line                                                        │
/// │                                                                         │
/// │  Operator enters quantity: 5                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_sale_quantity(5) ← THIS FUNCTION                             │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Look up ShopStock and price the line                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_sale_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Units moved by an allocation transfer or a restock.
pub fn validate_transfer_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Target quantity of a reallocation. Zero empties the shop row.
pub fn validate_target_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "newQuantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Catalog on-hand quantity (zero allowed).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Quantity after moving `delta` units into or out of a row holding
/// `current`. The result must itself be a valid stock quantity.
pub fn checked_stock_quantity(current: i64, delta: i64) -> ValidationResult<i64> {
    let next = current.checked_add(delta).unwrap_or(i64::MAX);
    validate_stock_quantity(next)?;
    Ok(next)
}

/// Validates a buy/sell price pair in cents.
///
/// ## Rules
/// - Both prices strictly positive and at most MAX_PRICE_CENTS
/// - Buy price never above sell price
///
/// ## Example
/// ```rust
/// use shopline_core::validation::validate_prices;
///
/// assert!(validate_prices(500, 999).is_ok());
/// assert!(validate_prices(999, 999).is_ok());
/// assert!(validate_prices(0, 999).is_err());
/// assert!(validate_prices(1200, 999).is_err());
/// assert!(validate_prices(500, i64::MAX / 100).is_err());
/// ```
pub fn validate_prices(buy_cents: i64, sell_cents: i64) -> ValidationResult<()> {
    if buy_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "buyPrice".to_string(),
        });
    }
    if sell_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "sellPrice".to_string(),
        });
    }
    for (field, cents) in [("buyPrice", buy_cents), ("sellPrice", sell_cents)] {
        if cents > MAX_PRICE_CENTS {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 1,
                max: MAX_PRICE_CENTS,
            });
        }
    }
    if buy_cents > sell_cents {
        return Err(ValidationError::BuyAboveSell {
            buy_cents,
            sell_cents,
        });
    }
    Ok(())
}

/// Validates a client-supplied discount percentage (0 to 100 inclusive).
pub fn validate_discount_rate(percent: f64) -> ValidationResult<DiscountRate> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discountRate".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(DiscountRate::from_percentage(percent))
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines submitted in one sale.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
///
/// Emptiness is a business error (`EmptyCart`), not a validation error.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
