//! # Pricing
//!
//! Loyalty discount table and per-line price computation.
//!
//! ## Line Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_price (from ShopStock, never from the client)                     │
//! │       │                                                                 │
//! │       ▼  × quantity                                                     │
//! │  subtotal                                                               │
//! │       │                                                                 │
//! │       ▼  × rate, half-up to the cent                                    │
//! │  discount                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total = subtotal - discount                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each sale line is priced and rounded on its own; totals of a transaction
//! are sums of already-rounded lines. Products and sums are checked: a row
//! whose price times quantity leaves `i64` fails with
//! [`ValidationError::Overflow`] instead of wrapping.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{DiscountRate, Money};
use crate::types::Tier;
use crate::validation::ValidationResult;

// =============================================================================
// Tier Discount Table
// =============================================================================

impl Tier {
    /// Fixed discount earned by each loyalty tier.
    ///
    /// | Tier     | Discount |
    /// |----------|----------|
    /// | None     | 0%       |
    /// | Bronze   | 5%       |
    /// | Silver   | 10%      |
    /// | Gold     | 15%      |
    /// | Platinum | 20%      |
    pub const fn discount_rate(self) -> DiscountRate {
        match self {
            Tier::None => DiscountRate::from_bps(0),
            Tier::Bronze => DiscountRate::from_bps(500),
            Tier::Silver => DiscountRate::from_bps(1000),
            Tier::Gold => DiscountRate::from_bps(1500),
            Tier::Platinum => DiscountRate::from_bps(2000),
        }
    }
}

/// Discount rate for an optional tier. Unmatched customers get nothing.
pub fn discount_for(tier: Option<Tier>) -> DiscountRate {
    tier.map(Tier::discount_rate).unwrap_or_default()
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Priced sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LinePrice {
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

fn overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

/// Line subtotal, `unit_price * quantity`.
pub fn line_subtotal(unit_price: Money, quantity: i64) -> ValidationResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| overflow("subtotal"))
}

/// Prices one line: `total == unit_price * quantity - discount` always holds.
pub fn price_line(
    unit_price: Money,
    quantity: i64,
    rate: DiscountRate,
) -> ValidationResult<LinePrice> {
    let subtotal = line_subtotal(unit_price, quantity)?;
    // 0 <= discount <= subtotal for rates up to 100%
    let discount = subtotal.discount_amount(rate);
    Ok(LinePrice {
        unit_price,
        quantity,
        subtotal,
        discount,
        total: subtotal - discount,
    })
}

/// Running totals across the lines of one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub item_count: i64,
}

impl SaleTotals {
    /// Folds one priced line in. Leaves `self` untouched on overflow.
    pub fn add_line(&mut self, line: &LinePrice) -> ValidationResult<()> {
        let sum = |a: Money, b: Money| a.checked_add(b).ok_or_else(|| overflow("sale total"));
        let next = SaleTotals {
            subtotal: sum(self.subtotal, line.subtotal)?,
            discount: sum(self.discount, line.discount)?,
            total: sum(self.total, line.total)?,
            item_count: self
                .item_count
                .checked_add(line.quantity)
                .ok_or_else(|| overflow("item count"))?,
        };
        *self = next;
        Ok(())
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LinePrice>) -> ValidationResult<Self> {
        let mut totals = SaleTotals::default();
        for line in lines {
            totals.add_line(line)?;
        }
        Ok(totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
